//! Node-level operations produced by a diff, and their orderings.

use std::cmp::Ordering;
use std::fmt;

use radix_store::{Node, NodeKind};
use radix_types::Hash256;
use serde::{Deserialize, Serialize};

/// What happened to a node between two trie versions.
///
/// Variants are declared in sort rank order: `Movement < Deletion <
/// Addition`. Within one hash a deletion therefore sorts before the addition
/// it may fold with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RadixAction {
    /// Present in both versions at different positions. Only produced by
    /// [`fold`](crate::fold).
    Movement,
    /// Present only in the base version.
    Deletion,
    /// Present only in the target version.
    Addition,
}

impl RadixAction {
    /// One-letter code used in the diagnostic form.
    pub fn as_char(self) -> char {
        match self {
            Self::Addition => 'A',
            Self::Deletion => 'D',
            Self::Movement => 'M',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Addition),
            'D' => Some(Self::Deletion),
            'M' => Some(Self::Movement),
            _ => None,
        }
    }
}

impl fmt::Display for RadixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A node together with the nibble depth it was found at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadixNode {
    pub hash: Hash256,
    pub node: Node,
    pub depth: u8,
}

impl RadixNode {
    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }
}

/// One entry of a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadixOperation {
    pub node: RadixNode,
    pub action: RadixAction,
}

impl RadixOperation {
    pub fn new(action: RadixAction, hash: Hash256, node: Node, depth: u8) -> Self {
        Self {
            node: RadixNode { hash, node, depth },
            action,
        }
    }

    pub fn hash(&self) -> Hash256 {
        self.node.hash
    }

    pub fn depth(&self) -> u8 {
        self.node.depth
    }
}

/// `<action>,<node-type>,<depth>,<node-id>`, e.g. `D,inner,0,9f2c…`.
impl fmt::Display for RadixOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.action,
            self.node.kind(),
            self.node.depth,
            self.node.hash
        )
    }
}

/// Action rank, then depth ascending, then hash.
pub fn by_action_then_depth(a: &RadixOperation, b: &RadixOperation) -> Ordering {
    a.action
        .cmp(&b.action)
        .then(a.depth().cmp(&b.depth()))
        .then_with(|| a.hash().cmp(&b.hash()))
}

/// Hash bytes ascending, then action rank, then depth.
pub fn by_hash_then_action(a: &RadixOperation, b: &RadixOperation) -> Ordering {
    a.hash()
        .cmp(&b.hash())
        .then(a.action.cmp(&b.action))
        .then(a.depth().cmp(&b.depth()))
}

/// Per-action counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub additions: usize,
    pub deletions: usize,
    pub movements: usize,
}

impl OperationSummary {
    pub fn total(&self) -> usize {
        self.additions + self.deletions + self.movements
    }
}

/// An ordered list of operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RadixOperations(Vec<RadixOperation>);

impl RadixOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation for `node` at `depth`.
    pub fn add(&mut self, hash: Hash256, node: Node, action: RadixAction, depth: u8) {
        self.0.push(RadixOperation::new(action, hash, node, depth));
    }

    pub fn push(&mut self, op: RadixOperation) {
        self.0.push(op);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RadixOperation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[RadixOperation] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<RadixOperation> {
        self.0
    }

    /// Stable sort by [`by_action_then_depth`].
    pub fn sort_by_action(&mut self) {
        self.0.sort_by(by_action_then_depth);
    }

    /// Stable sort by [`by_hash_then_action`].
    pub fn sort_by_hash(&mut self) {
        self.0.sort_by(by_hash_then_action);
    }

    /// Hashes of the operations carrying `action`, in list order.
    pub fn hashes(&self, action: RadixAction) -> Vec<Hash256> {
        self.0
            .iter()
            .filter(|op| op.action == action)
            .map(RadixOperation::hash)
            .collect()
    }

    pub fn summary(&self) -> OperationSummary {
        self.0
            .iter()
            .fold(OperationSummary::default(), |mut acc, op| {
                match op.action {
                    RadixAction::Addition => acc.additions += 1,
                    RadixAction::Deletion => acc.deletions += 1,
                    RadixAction::Movement => acc.movements += 1,
                }
                acc
            })
    }

    /// Diagnostic form of every operation.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl From<Vec<RadixOperation>> for RadixOperations {
    fn from(ops: Vec<RadixOperation>) -> Self {
        Self(ops)
    }
}

impl FromIterator<RadixOperation> for RadixOperations {
    fn from_iter<I: IntoIterator<Item = RadixOperation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RadixOperations {
    type Item = RadixOperation;
    type IntoIter = std::vec::IntoIter<RadixOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RadixOperations {
    type Item = &'a RadixOperation;
    type IntoIter = std::slice::Iter<'a, RadixOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
