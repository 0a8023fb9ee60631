//! Foundation types for the ledger radix trie.
//!
//! Every other `radix-*` crate depends on `radix-types`.
//!
//! # Key Types
//!
//! - [`Hash256`] -- 256-bit content hash; the all-zero value means "absent"
//! - [`Nibble`] -- 4-bit branch index used to route through inner nodes
//! - [`TypeError`] -- parse failures for the types above

pub mod error;
pub mod hash;
pub mod nibble;

pub use error::TypeError;
pub use hash::Hash256;
pub use nibble::{Nibble, MAX_DEPTH};
