use serde::{Deserialize, Serialize};

use radix_crypto::ContentHasher;
use radix_types::{Hash256, Nibble};

use crate::error::{StoreError, StoreResult};

const LEAF_TAG: u8 = 0x00;
const INNER_TAG: u8 = 0x01;
const HASH_LEN: usize = 32;

/// The two shapes a trie node can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Leaf,
    Inner,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf => write!(f, "leaf"),
            Self::Inner => write!(f, "inner"),
        }
    }
}

// ---------------------------------------------------------------------------
// LeafNode
// ---------------------------------------------------------------------------

/// A ledger entry: its 256-bit index and the entry's serialized bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafNode {
    /// Index of the entry; its nibbles route it through the trie.
    pub key: Hash256,
    /// Opaque serialized entry.
    pub payload: Vec<u8>,
}

impl LeafNode {
    pub fn new(key: Hash256, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            payload: payload.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// InnerNode
// ---------------------------------------------------------------------------

/// A branch with one child slot per nibble. Zero slots are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerNode {
    children: [Hash256; Nibble::COUNT],
}

impl InnerNode {
    /// An inner node with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_children(children: [Hash256; Nibble::COUNT]) -> Self {
        Self { children }
    }

    pub fn child(&self, nibble: Nibble) -> Hash256 {
        self.children[nibble.index()]
    }

    pub fn set_child(&mut self, nibble: Nibble, hash: Hash256) {
        self.children[nibble.index()] = hash;
    }

    /// All sixteen slots, empty ones included, indexed by nibble.
    pub fn children(&self) -> &[Hash256; Nibble::COUNT] {
        &self.children
    }

    /// Non-empty slots in ascending nibble order.
    pub fn occupied(&self) -> impl Iterator<Item = (Nibble, Hash256)> + '_ {
        Nibble::all()
            .map(|n| (n, self.children[n.index()]))
            .filter(|(_, h)| !h.is_zero())
    }

    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|h| !h.is_zero()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.child_count() == 0
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node of a ledger state trie.
///
/// The identity of a node is [`Node::hash`]: the domain-separated hash of its
/// canonical bytes. Only [`Node::Inner`] has children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Leaf(LeafNode),
    Inner(InnerNode),
}

impl Node {
    pub fn leaf(key: Hash256, payload: impl Into<Vec<u8>>) -> Self {
        Self::Leaf(LeafNode::new(key, payload))
    }

    pub fn inner(children: [Hash256; Nibble::COUNT]) -> Self {
        Self::Inner(InnerNode::from_children(children))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Inner(_) => NodeKind::Inner,
        }
    }

    pub fn as_inner(&self) -> Option<&InnerNode> {
        match self {
            Self::Inner(inner) => Some(inner),
            Self::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Inner(_) => None,
        }
    }

    /// Content hash of the canonical encoding.
    pub fn hash(&self) -> Hash256 {
        let hasher = match self {
            Self::Leaf(_) => ContentHasher::LEAF,
            Self::Inner(_) => ContentHasher::INNER,
        };
        hasher.hash(&self.to_bytes())
    }

    /// Canonical encoding.
    ///
    /// ```text
    /// leaf:  0x00 | key (32) | payload (rest)
    /// inner: 0x01 | child[0] (32) | ... | child[15] (32)
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Leaf(leaf) => {
                let mut out = Vec::with_capacity(1 + HASH_LEN + leaf.payload.len());
                out.push(LEAF_TAG);
                out.extend_from_slice(leaf.key.as_bytes());
                out.extend_from_slice(&leaf.payload);
                out
            }
            Self::Inner(inner) => {
                let mut out = Vec::with_capacity(1 + HASH_LEN * Nibble::COUNT);
                out.push(INNER_TAG);
                for child in inner.children() {
                    out.extend_from_slice(child.as_bytes());
                }
                out
            }
        }
    }

    /// Decode the canonical encoding produced by [`Node::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let (tag, body) = bytes
            .split_first()
            .ok_or_else(|| StoreError::Codec("empty node encoding".into()))?;
        match *tag {
            LEAF_TAG => {
                if body.len() < HASH_LEN {
                    return Err(StoreError::Codec(format!(
                        "leaf encoding too short: {} bytes",
                        body.len()
                    )));
                }
                let (key, payload) = body.split_at(HASH_LEN);
                Ok(Self::leaf(Hash256::try_from(key)?, payload))
            }
            INNER_TAG => {
                if body.len() != HASH_LEN * Nibble::COUNT {
                    return Err(StoreError::Codec(format!(
                        "inner encoding must be {} bytes, got {}",
                        HASH_LEN * Nibble::COUNT,
                        body.len()
                    )));
                }
                let mut children = [Hash256::ZERO; Nibble::COUNT];
                for (slot, chunk) in children.iter_mut().zip(body.chunks_exact(HASH_LEN)) {
                    *slot = Hash256::try_from(chunk)?;
                }
                Ok(Self::inner(children))
            }
            other => Err(StoreError::Codec(format!("unknown node tag {other:#04x}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(b: u8) -> Hash256 {
        Hash256::from_bytes([b; 32])
    }

    fn nib(v: u8) -> Nibble {
        Nibble::new(v).unwrap()
    }

    #[test]
    fn leaf_codec_roundtrip() {
        let node = Node::leaf(h(1), b"account state".to_vec());
        let decoded = Node::from_bytes(&node.to_bytes()).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn inner_codec_roundtrip() {
        let mut inner = InnerNode::new();
        inner.set_child(nib(0), h(1));
        inner.set_child(nib(15), h(2));
        let node = Node::Inner(inner);
        let bytes = node.to_bytes();
        assert_eq!(bytes.len(), 1 + 32 * 16);
        assert_eq!(Node::from_bytes(&bytes).unwrap(), node);
    }

    #[test]
    fn empty_payload_leaf_is_valid() {
        let node = Node::leaf(h(9), Vec::new());
        assert_eq!(Node::from_bytes(&node.to_bytes()).unwrap(), node);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(matches!(Node::from_bytes(&[]), Err(StoreError::Codec(_))));
        assert!(matches!(
            Node::from_bytes(&[0x00, 1, 2, 3]),
            Err(StoreError::Codec(_))
        ));
        assert!(matches!(
            Node::from_bytes(&[0x01; 40]),
            Err(StoreError::Codec(_))
        ));
        assert!(matches!(
            Node::from_bytes(&[0x07, 0, 0]),
            Err(StoreError::Codec(_))
        ));
    }

    #[test]
    fn leaf_and_inner_hashes_are_domain_separated() {
        let leaf = Node::leaf(Hash256::ZERO, vec![0u8; 32 * 16 - 32]);
        let inner = Node::Inner(InnerNode::new());
        assert_ne!(leaf.hash(), inner.hash());
    }

    #[test]
    fn hash_changes_with_payload() {
        assert_ne!(
            Node::leaf(h(1), b"a".to_vec()).hash(),
            Node::leaf(h(1), b"b".to_vec()).hash()
        );
    }

    #[test]
    fn occupied_skips_empty_slots_in_order() {
        let mut inner = InnerNode::new();
        inner.set_child(nib(9), h(9));
        inner.set_child(nib(2), h(2));
        let slots: Vec<(u8, Hash256)> = inner.occupied().map(|(n, h)| (n.value(), h)).collect();
        assert_eq!(slots, vec![(2, h(2)), (9, h(9))]);
        assert_eq!(inner.child_count(), 2);
        assert!(!inner.is_empty());
        assert!(InnerNode::new().is_empty());
    }

    #[test]
    fn kind_and_accessors() {
        let leaf = Node::leaf(h(1), b"x".to_vec());
        assert_eq!(leaf.kind(), NodeKind::Leaf);
        assert!(leaf.as_leaf().is_some());
        assert!(leaf.as_inner().is_none());
        assert_eq!(NodeKind::Inner.to_string(), "inner");
        assert_eq!(NodeKind::Leaf.to_string(), "leaf");
    }

    #[test]
    fn serde_roundtrip() {
        let node = Node::leaf(h(3), b"payload".to_vec());
        let json = serde_json::to_string(&node).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, node);
    }
}
