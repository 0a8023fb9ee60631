use std::sync::Arc;

use radix_types::Hash256;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::node::Node;

/// Content-addressed node store.
///
/// All implementations must satisfy these invariants:
/// - A node is stored under its own [`Node::hash`] and never changes.
/// - [`Hash256::ZERO`] addresses nothing.
/// - Reads are deterministic and side-effect free, so a reader can assume a
///   stable view for the duration of one traversal as long as writers only
///   append.
pub trait ContentStore: Send + Sync {
    /// Read a node by hash.
    ///
    /// Returns `Ok(None)` if the node does not exist. Use this where absence
    /// is an expected outcome (missing-node discovery).
    fn read(&self, hash: &Hash256) -> StoreResult<Option<Node>>;

    /// Write a node and return its hash. Writing an existing node is a no-op.
    fn put(&self, node: &Node) -> StoreResult<Hash256>;

    /// Check whether a node exists in the store.
    fn contains(&self, hash: &Hash256) -> StoreResult<bool> {
        Ok(self.read(hash)?.is_some())
    }

    /// Fetch a node that must exist.
    ///
    /// Fails with [`StoreError::NotFound`] on a miss and with
    /// [`StoreError::ZeroHash`] for the zero hash.
    fn get(&self, hash: &Hash256) -> StoreResult<Node> {
        if hash.is_zero() {
            return Err(StoreError::ZeroHash);
        }
        self.read(hash)?.ok_or(StoreError::NotFound(*hash))
    }

    /// Fetch several nodes; the first miss fails the whole batch.
    fn get_batch(&self, hashes: &[Hash256]) -> StoreResult<Vec<Node>> {
        hashes.iter().map(|hash| self.get(hash)).collect()
    }

    /// Write a node received under `expected`, rejecting it with
    /// [`StoreError::HashMismatch`] if its computed hash differs.
    fn put_verified(&self, expected: &Hash256, node: &Node) -> StoreResult<Hash256> {
        let computed = node.hash();
        if computed != *expected {
            warn!(
                expected = %expected.short_hex(),
                computed = %computed.short_hex(),
                "rejected node with mismatched hash"
            );
            return Err(StoreError::HashMismatch {
                expected: *expected,
                computed,
            });
        }
        self.put(node)
    }

    /// Write several nodes and return their hashes.
    fn put_batch(&self, nodes: &[Node]) -> StoreResult<Vec<Hash256>> {
        nodes.iter().map(|node| self.put(node)).collect()
    }
}

impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    fn read(&self, hash: &Hash256) -> StoreResult<Option<Node>> {
        (**self).read(hash)
    }

    fn put(&self, node: &Node) -> StoreResult<Hash256> {
        (**self).put(node)
    }

    fn contains(&self, hash: &Hash256) -> StoreResult<bool> {
        (**self).contains(hash)
    }
}
