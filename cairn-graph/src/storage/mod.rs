//! Storage backends implementing [`crate::traits::GraphProvider`].
//!
//! SurrealDB (embedded, RocksDB engine) is the only backend today; the
//! trait is the seam a Neo4j or Postgres-with-recursive-CTE backend would
//! implement without touching `cairn-search`.

pub mod surrealdb;
