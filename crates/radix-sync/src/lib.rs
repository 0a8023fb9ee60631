//! Synchronization boundary for ledger state tries.
//!
//! A peer tracks a chain of ledger headers, each naming the root of a state
//! trie. [`LedgerSync`] decides what is still missing locally, ingests
//! fetched headers and nodes after verifying their hashes, and exposes
//! snapshots of the canonical state. [`SyncDriver`] runs the
//! missing/fetch/submit loop against any [`NodeSource`].

pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod transport;
pub mod types;

pub use config::SyncConfig;
pub use coordinator::{LedgerSync, SyncCoordinator};
pub use driver::{SyncDriver, SyncProgress};
pub use error::{SyncError, SyncResult};
pub use transport::{LocalSource, NodeSource};
pub use types::{LedgerHeader, LedgerRange, Rejection, SubmitReport, SyncItem, WorkUnit};
