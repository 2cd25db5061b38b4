//! Error types for knowledge graph operations.

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors from the knowledge graph backend.
///
/// read primitives return empty results on an unreachable backend rather than erroring (callers
/// degrade gracefully); write primitives surface errors so callers can retry (at-least-once).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph backend unavailable: {0}")]
    Unavailable(String),

    #[error("graph query failed: {0}")]
    Query(String),

    #[error("entity not found: {0}")]
    EntityNotFound(Uuid),

    #[error("statement not found: {0}")]
    StatementNotFound(Uuid),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("surrealdb error: {0}")]
    SurrealDb(String),
}

impl From<surrealdb::Error> for GraphError {
    fn from(e: surrealdb::Error) -> Self {
        Self::SurrealDb(e.to_string())
    }
}

impl GraphError {
    /// Whether this error means "the backend didn't answer" (read path
    /// should return empty) as opposed to a genuine validation failure.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::SurrealDb(_))
    }
}
