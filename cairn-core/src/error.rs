//! Workspace-wide error taxonomy.
//!
//! Leaf crates (`cairn-graph`, `cairn-memory`, `cairn-search`,...) define their own `thiserror`
//! enums with precise variants. `CairnError` is the taxonomy they collapse into at the public
//! boundary (`SearchV2`, `MemoryStore`), matching the four error classes in the design doc:
//! transient-external, permanent-external, internal-invariant, client.

use thiserror::Error;

/// Workspace-wide error type.
#[derive(Debug, Error)]
pub enum CairnError {
    /// Rate limits, timeouts, 5xx from an external dependency. Already
    /// retried at the provider boundary by the time this is raised.
    #[error("{source} is unavailable: {message}")]
    Transient { source: &'static str, message: String },

    /// 4xx-style errors from an external dependency: bad request, quota
    /// exhausted, schema mismatch. Not retried.
    #[error("{source} rejected the request: {message}")]
    Permanent { source: &'static str, message: String },

    /// A violated invariant: dimension mismatch, missing subject entity,
    /// malformed extraction JSON. Caller should degrade to the next
    /// fallback tier rather than propagate.
    #[error("invariant violated: {message}")]
    Invariant { message: String },

    /// Bad input from the caller of the core operation: invalid filters,
    /// unknown memory type.
    #[error("invalid request: {message}")]
    Client { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CairnError {
    #[must_use]
    pub fn transient(source: &'static str, message: impl Into<String>) -> Self {
        Self::Transient { source, message: message.into() }
    }

    #[must_use]
    pub fn permanent(source: &'static str, message: impl Into<String>) -> Self {
        Self::Permanent { source, message: message.into() }
    }

    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant { message: message.into() }
    }

    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client { message: message.into() }
    }

    /// Whether the search pipeline should fall back to the next tier on this error rather than
    /// surfacing it to the caller.
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Invariant { .. })
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, CairnError>;
