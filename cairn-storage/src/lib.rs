//! Relational and vector storage for Cairn.
//!
//! [`Storage`] is the backend-agnostic contract; [`sqlite::SqliteStorage`] (the default) is an
//! embedded, file-backed implementation over `libsql`. An optional `postgres` feature adds
//! [`postgres::PostgresStorage`] for deployments that outgrow a single SQLite file. Vector search
//! here is a brute-force cosine scan suitable for the embedded/default path; `vectorlite-rs` is the
//! separate HNSW-backed virtual table for larger corpora and is wired in at the caller's discretion
//! rather than baked into this trait.

pub mod error;
pub mod model;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

pub use error::{Result, StorageError};
pub use model::{EventRow, MemoryFilter, MemoryRow, NewMemoryRow, ProjectRow, RelationRow};
#[cfg(feature = "postgres")]
pub use postgres::PostgresStorage;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
pub use traits::Storage;
