//! Persistent 16-ary radix map over a content store.
//!
//! Leaves sit at the shallowest depth where their key prefix is unique, so
//! the trie shape (and therefore the root hash) depends only on the set of
//! entries, not on the order they were inserted. The root, when present, is
//! always an inner node.

use std::sync::Arc;

use radix_types::Hash256;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::node::{InnerNode, LeafNode, Node};
use crate::traits::ContentStore;

/// A ledger state map addressed by its root hash.
///
/// Updates write new nodes along the changed path and move the root; nodes
/// already in the store are never touched. Cloning a `RadixMap` is therefore
/// a cheap point-in-time snapshot that concurrent readers can keep using
/// while the original keeps changing.
#[derive(Clone)]
pub struct RadixMap {
    store: Arc<dyn ContentStore>,
    root: Hash256,
}

impl RadixMap {
    /// An empty map.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            root: Hash256::ZERO,
        }
    }

    /// A map rooted at an existing trie. The root is not resolved until used.
    pub fn from_root(store: Arc<dyn ContentStore>, root: Hash256) -> Self {
        Self { store, root }
    }

    pub fn root_hash(&self) -> Hash256 {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_zero()
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Look up the payload stored under `key`.
    pub fn get(&self, key: &Hash256) -> StoreResult<Option<Vec<u8>>> {
        let mut current = self.root;
        let mut depth = 0u8;
        while !current.is_zero() {
            match self.store.get(&current)? {
                Node::Leaf(leaf) => {
                    return Ok((leaf.key == *key).then_some(leaf.payload));
                }
                Node::Inner(inner) => {
                    current = inner.child(key.nibble(depth)?);
                    depth += 1;
                }
            }
        }
        Ok(None)
    }

    /// Insert or replace the entry under `key`.
    pub fn insert(&mut self, key: Hash256, payload: impl Into<Vec<u8>>) -> StoreResult<()> {
        let leaf = LeafNode::new(key, payload);
        self.root = self.insert_at(self.root, 0, &leaf)?;
        trace!(key = %key.short_hex(), root = %self.root.short_hex(), "radix map insert");
        Ok(())
    }

    /// Remove the entry under `key`, returning its payload if it existed.
    pub fn remove(&mut self, key: &Hash256) -> StoreResult<Option<Vec<u8>>> {
        if self.root.is_zero() {
            return Ok(None);
        }
        let Some((new_root, payload)) = self.remove_at(self.root, 0, key)? else {
            return Ok(None);
        };
        self.root = new_root;
        trace!(key = %key.short_hex(), root = %self.root.short_hex(), "radix map remove");
        Ok(Some(payload))
    }

    /// All entries in ascending key order.
    pub fn leaves(&self) -> StoreResult<Vec<LeafNode>> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |_, node| {
            if let Node::Leaf(leaf) = node {
                out.push(leaf.clone());
            }
        })?;
        Ok(out)
    }

    /// Hashes of every node reachable from the root, in pre-order.
    pub fn node_hashes(&self) -> StoreResult<Vec<Hash256>> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |hash, _| out.push(hash))?;
        Ok(out)
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> StoreResult<usize> {
        Ok(self.node_hashes()?.len())
    }

    fn walk(&self, hash: Hash256, visit: &mut dyn FnMut(Hash256, &Node)) -> StoreResult<()> {
        if hash.is_zero() {
            return Ok(());
        }
        let node = self.store.get(&hash)?;
        visit(hash, &node);
        if let Node::Inner(inner) = &node {
            for (_, child) in inner.occupied() {
                self.walk(child, visit)?;
            }
        }
        Ok(())
    }

    fn load_inner(&self, hash: Hash256) -> StoreResult<InnerNode> {
        if hash.is_zero() {
            return Ok(InnerNode::new());
        }
        match self.store.get(&hash)? {
            Node::Inner(inner) => Ok(inner),
            Node::Leaf(_) => Err(StoreError::Malformed {
                hash,
                reason: "expected inner node on the key path, found leaf".into(),
            }),
        }
    }

    fn insert_at(&self, node: Hash256, depth: u8, leaf: &LeafNode) -> StoreResult<Hash256> {
        let mut inner = self.load_inner(node)?;
        let slot = leaf.key.nibble(depth)?;
        let existing = inner.child(slot);

        let replacement = if existing.is_zero() {
            self.store.put(&Node::Leaf(leaf.clone()))?
        } else {
            match self.store.get(&existing)? {
                Node::Leaf(other) if other.key == leaf.key => {
                    self.store.put(&Node::Leaf(leaf.clone()))?
                }
                Node::Leaf(other) => self.split(existing, &other, leaf, depth + 1)?,
                Node::Inner(_) => self.insert_at(existing, depth + 1, leaf)?,
            }
        };

        inner.set_child(slot, replacement);
        self.store.put(&Node::Inner(inner))
    }

    /// Build the inner node(s) that separate two leaves sharing a prefix down
    /// to `depth`.
    fn split(
        &self,
        existing_hash: Hash256,
        existing: &LeafNode,
        leaf: &LeafNode,
        depth: u8,
    ) -> StoreResult<Hash256> {
        let a = existing.key.nibble(depth)?;
        let b = leaf.key.nibble(depth)?;
        let mut inner = InnerNode::new();
        if a == b {
            inner.set_child(a, self.split(existing_hash, existing, leaf, depth + 1)?);
        } else {
            inner.set_child(a, existing_hash);
            inner.set_child(b, self.store.put(&Node::Leaf(leaf.clone()))?);
        }
        self.store.put(&Node::Inner(inner))
    }

    /// Returns the replacement hash for `node` and the removed payload, or
    /// `None` when `key` is absent below `node`.
    fn remove_at(
        &self,
        node: Hash256,
        depth: u8,
        key: &Hash256,
    ) -> StoreResult<Option<(Hash256, Vec<u8>)>> {
        let mut inner = self.load_inner(node)?;
        let slot = key.nibble(depth)?;
        let child = inner.child(slot);
        if child.is_zero() {
            return Ok(None);
        }

        let payload = match self.store.get(&child)? {
            Node::Leaf(leaf) if leaf.key == *key => {
                inner.set_child(slot, Hash256::ZERO);
                leaf.payload
            }
            Node::Leaf(_) => return Ok(None),
            Node::Inner(_) => match self.remove_at(child, depth + 1, key)? {
                Some((new_child, payload)) => {
                    inner.set_child(slot, new_child);
                    payload
                }
                None => return Ok(None),
            },
        };

        Ok(Some((self.collapse(inner, depth)?, payload)))
    }

    /// Canonicalise an inner node after a removal below it: an empty node
    /// disappears, and a non-root node left holding a single leaf is replaced
    /// by that leaf.
    fn collapse(&self, inner: InnerNode, depth: u8) -> StoreResult<Hash256> {
        let Some((_, only)) = inner.occupied().next() else {
            return Ok(Hash256::ZERO);
        };
        if depth > 0 && inner.child_count() == 1 {
            if let Node::Leaf(_) = self.store.get(&only)? {
                return Ok(only);
            }
        }
        self.store.put(&Node::Inner(inner))
    }
}

impl std::fmt::Debug for RadixMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadixMap")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
