//! Diff engine for ledger radix tries.
//!
//! Compares two versions of a content-addressed state trie and reports, node
//! by node, what a peer holding one version must fetch or drop to hold the
//! other. Subtrees whose hashes match are skipped without being read.
//!
//! # Key Types
//!
//! - [`diff`] -- recursive structural comparison of two roots
//! - [`fold`] -- collapses a node deleted in one place and added in another
//!   into a single [`RadixAction::Movement`]
//! - [`RadixOperations`] -- ordered operation list with its two sort orders

pub mod error;
pub mod fold;
pub mod operation;
pub mod radix_diff;

pub use error::{DiffError, DiffResult};
pub use fold::fold;
pub use operation::{
    by_action_then_depth, by_hash_then_action, OperationSummary, RadixAction, RadixNode,
    RadixOperation, RadixOperations,
};
pub use radix_diff::diff;
