use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("nibble out of range: {0}")]
    NibbleOutOfRange(u8),

    #[error("depth {0} exceeds the key width")]
    DepthOutOfRange(u8),
}
