use radix_diff::DiffError;
use radix_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("unknown ledger {0}")]
    UnknownLedger(u32),

    #[error("invalid ledger range {start}..={end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("no progress in round {round}: {rejected} items rejected")]
    Stalled { round: u32, rejected: usize },

    #[error("range still incomplete after {0} rounds")]
    Incomplete(u32),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
