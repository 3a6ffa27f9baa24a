//! Error types for the memory hierarchy.

use thiserror::Error;

/// Unified error type for hierarchy operations.
///
/// An empty context selection is a success value (`Ok(vec![])`), never an
/// error, so callers can distinguish "budget produced nothing" from a genuine
/// lookup failure.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Invalid configuration (bad weights, overlapping bands, threshold
    /// ordering). Fatal at startup, never silently corrected.
    #[error("configuration error: {0}")]
    Config(String),

    /// Requested memory id does not exist in the given scope.
    #[error("memory not found: {scope}/{id}")]
    NotFound { scope: String, id: String },

    /// A reinforcement update lost the CAS race repeatedly.
    #[error("concurrent update conflict on {id} after {attempts} attempts")]
    ConcurrentUpdate { id: String, attempts: u32 },

    /// Store adapter failure, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error from the markdown mirror.
    #[error("mirror I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A mirror document could not be parsed back into a memory.
    #[error("malformed mirror document {path}: {reason}")]
    MirrorFormat { path: String, reason: String },
}

impl HierarchyError {
    /// Shorthand for a scoped not-found error.
    pub fn not_found(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            scope: scope.into(),
            id: id.into(),
        }
    }
}

/// Convenience result alias used across the workspace.
pub type Result<T> = std::result::Result<T, HierarchyError>;
