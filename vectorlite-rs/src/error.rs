//! Error type for `vectorlite-rs`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorliteError>;

#[derive(Debug, Error)]
pub enum VectorliteError {
    #[error("vector dimension mismatch: index is {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index {0:?} not found")]
    IndexNotFound(String),

    #[error("failed to persist index: {0}")]
    Persist(String),

    #[error("failed to load index: {0}")]
    Load(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VectorliteError> for rusqlite::Error {
    fn from(err: VectorliteError) -> Self {
        match err {
            VectorliteError::Sqlite(e) => e,
            other => Self::ModuleError(other.to_string()),
        }
    }
}
