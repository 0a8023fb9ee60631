//! Content-addressed node storage for ledger state tries.
//!
//! Each ledger version's state is a 16-ary radix trie. Every trie node is
//! stored as an immutable value keyed by the hash of its canonical bytes, so
//! two versions that share a subtree share its storage.
//!
//! # Node Types
//!
//! - [`Node::Leaf`] -- a ledger entry: its 256-bit index plus opaque payload
//! - [`Node::Inner`] -- sixteen child hashes, one per nibble; zero means empty
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Nodes are immutable once written (content-addressing guarantees this).
//! 2. No node is ever addressed by [`Hash256::ZERO`](radix_types::Hash256::ZERO).
//! 3. Concurrent reads are always safe.
//! 4. A lookup miss is an error at the [`ContentStore::get`] boundary; callers
//!    that expect misses use [`ContentStore::read`].
//! 5. [`RadixMap`] never mutates stored nodes: every update writes new nodes
//!    along the changed path and yields a new root, so a cloned map is a
//!    stable snapshot.

pub mod error;
pub mod map;
pub mod memory;
pub mod node;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use map::RadixMap;
pub use memory::InMemoryContentStore;
pub use node::{InnerNode, LeafNode, Node, NodeKind};
pub use traits::ContentStore;
