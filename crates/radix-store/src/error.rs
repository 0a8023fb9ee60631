use radix_types::{Hash256, TypeError};

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested node was not found.
    #[error("node not found: {0}")]
    NotFound(Hash256),

    /// A node's computed hash differs from the hash it was submitted under.
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: Hash256, computed: Hash256 },

    /// The zero hash marks absence and never addresses a node.
    #[error("the zero hash does not address a node")]
    ZeroHash,

    /// Canonical node bytes could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// A stored node does not have the shape its position requires.
    #[error("malformed trie at {hash}: {reason}")]
    Malformed { hash: Hash256, reason: String },

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
