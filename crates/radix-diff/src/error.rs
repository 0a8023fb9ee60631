//! Error types for the diff crate.

use radix_store::StoreError;
use radix_types::Hash256;

/// Errors that abort a diff. No partial operation list survives one.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A non-zero hash reached during the walk is absent from the store.
    #[error("node missing from store: {0}")]
    StoreMiss(Hash256),

    /// A node contradicts its position in the trie.
    #[error("structural error at {hash}: {reason}")]
    Structural { hash: Hash256, reason: String },

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DiffError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(hash) => Self::StoreMiss(hash),
            other => Self::Store(other),
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
