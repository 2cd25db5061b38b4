//! Relational/vector/graph storage connection settings.

use serde::{Deserialize, Serialize};

/// Relational + vector substrate selection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum RelationalStorageConfig {
    /// Embedded libsql (SQLite) file, the default backend.
    Sqlite { path: String },
    /// Postgres for deployments that outgrow SQLite.
    Postgres { dsn: String },
}

impl Default for RelationalStorageConfig {
    fn default() -> Self {
        Self::Sqlite { path: "cairn.db".to_string() }
    }
}

/// Embedded graph store connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphStorageConfig {
    /// Path to the embedded RocksDB-backed SurrealDB data directory.
    pub path: String,
    pub namespace: String,
    pub database: String,
}

impl Default for GraphStorageConfig {
    fn default() -> Self {
        Self { path: "cairn-graph.db".to_string(), namespace: "cairn".to_string(), database: "cairn".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub relational: RelationalStorageConfig,
    pub graph: GraphStorageConfig,
}
