//! Error taxonomy for graph operations.
//!
//! Every engine operation fails with a [`MemoryError`]. The variant tells the
//! caller whether correcting the input can help ([`MemoryError::Validation`],
//! [`MemoryError::Reference`]) or whether the store or embedding collaborator
//! failed underneath it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// Out-of-range numeric field, malformed interval, empty required text.
    /// Raised before any write is attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// An identifier for a write-once node (an Event) did not resolve.
    /// The surrounding transaction is rolled back.
    #[error("reference error: {0}")]
    Reference(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Raised before any transaction is opened.
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MemoryError {
    /// Short machine-readable label used in failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Reference(_) => "reference",
            Self::Store(_) => "store",
            Self::Embedding(_) => "embedding",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

pub type MemoryResult<T> = Result<T, MemoryError>;
