//! Error taxonomy for the entity-per-page index
//!
//! Every public operation returns [`IndexResult`]. Validation failures are
//! raised before any storage access and are never worth retrying; storage
//! failures are passed through untouched so the orchestration layer can
//! decide on retry and backoff.

use crate::id::IdError;
use thiserror::Error;

/// Error type for index operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Malformed arguments: non-positive page id or limit, an identifier
    /// outside the 32-bit numeric space, an empty type filter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An identifier or stored type tag outside the recognized set
    #[error("Unsupported entity type: {0}")]
    UnsupportedType(String),

    /// A concurrent writer re-created a conflicting row between conflict
    /// removal and re-insertion. Not retryable.
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    /// Storage backend failure (connection loss, timeout, SQL error)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the caller handed in something this index can never accept
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::UnsupportedType(_))
    }
}

impl From<IdError> for IndexError {
    fn from(err: IdError) -> Self {
        match err {
            IdError::UnsupportedType(entity_type) => Self::UnsupportedType(entity_type),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
