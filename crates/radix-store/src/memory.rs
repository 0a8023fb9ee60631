use std::collections::HashMap;
use std::sync::RwLock;

use radix_types::Hash256;

use crate::error::StoreResult;
use crate::node::Node;
use crate::traits::ContentStore;

/// Trie nodes keyed by their own content hash.
///
/// Since a node's key is its hash, writing the same node twice is a no-op and
/// every trie version sharing a subtree shares its entries. [`remove`] lets a
/// test punch holes in a trie to stand in for a peer that has only partly
/// synced.
///
/// [`remove`]: InMemoryContentStore::remove
pub struct InMemoryContentStore {
    nodes: RwLock<HashMap<Hash256, Node>>,
}

impl InMemoryContentStore {
    /// A store holding no tries.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Distinct nodes held, counted once however many roots reach them.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().expect("lock poisoned").is_empty()
    }

    /// Forget every node, leaving all previously known roots unresolvable.
    pub fn clear(&self) {
        self.nodes.write().expect("lock poisoned").clear();
    }

    /// Drop a single node. Returns `true` if it was present.
    ///
    /// Only for pruning and for simulating partially synced stores; removing
    /// a node that a live root still reaches makes that trie unresolvable.
    pub fn remove(&self, hash: &Hash256) -> bool {
        self.nodes
            .write()
            .expect("lock poisoned")
            .remove(hash)
            .is_some()
    }

    /// Stored node hashes in ascending order.
    pub fn all_hashes(&self) -> Vec<Hash256> {
        let map = self.nodes.read().expect("lock poisoned");
        let mut hashes: Vec<Hash256> = map.keys().copied().collect();
        hashes.sort();
        hashes
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn read(&self, hash: &Hash256) -> StoreResult<Option<Node>> {
        let map = self.nodes.read().expect("lock poisoned");
        Ok(map.get(hash).cloned())
    }

    fn put(&self, node: &Node) -> StoreResult<Hash256> {
        let hash = node.hash();
        let mut map = self.nodes.write().expect("lock poisoned");
        map.entry(hash).or_insert_with(|| node.clone());
        Ok(hash)
    }

    fn contains(&self, hash: &Hash256) -> StoreResult<bool> {
        let map = self.nodes.read().expect("lock poisoned");
        Ok(map.contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("node_count", &self.len())
            .finish()
    }
}
