//! Pure-Rust HNSW vector index for Cairn's embedded SQLite storage.
//!
//! `cairn-storage`'s default vector signal is a brute-force cosine scan over active memories. This
//! crate is the optional accelerant for larger corpora: an in-process approximate-nearest-neighbor
//! index per (table, project) namespace, built on [`hnsw_rs`](https://docs.rs/hnsw_rs), persisted
//! to disk as MessagePack so it survives process restarts without being rebuilt from every row on
//! boot.
//!
//! It is consumed as a library, not loaded as a SQLite extension: `rusqlite` here supplies only
//! [`sql::EmbeddingBlob`]'s `ToSql`/`FromSql` glue for the embedding `BLOB` column, matching how
//! `cairn-storage`'s own SQLite layer already reads and writes that column.

pub mod blob;
pub mod error;
pub mod index;
pub mod registry;
pub mod sql;

pub use error::{Result, VectorliteError};
pub use index::{HnswParams, VectorIndex};
pub use registry::VectorliteRegistry;
pub use sql::EmbeddingBlob;
