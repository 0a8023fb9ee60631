use radix_crypto::ContentHasher;
use radix_store::Node;
use radix_types::Hash256;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// An inclusive range of ledger sequence numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRange {
    pub start: u32,
    pub end: u32,
}

impl LedgerRange {
    pub fn new(start: u32, end: u32) -> SyncResult<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn single(sequence: u32) -> Self {
        Self {
            start: sequence,
            end: sequence,
        }
    }

    /// Ranges built through the public fields or deserialized skip [`new`]'s
    /// check; consumers call this before use.
    ///
    /// [`new`]: LedgerRange::new
    pub fn validate(&self) -> SyncResult<()> {
        if self.start > self.end {
            return Err(SyncError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, sequence: u32) -> bool {
        (self.start..=self.end).contains(&sequence)
    }

    pub fn len(&self) -> u64 {
        u64::from(self.end.saturating_sub(self.start)) + 1
    }

    pub fn sequences(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

impl std::fmt::Display for LedgerRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// The hash-linked record of one ledger version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHeader {
    pub sequence: u32,
    /// Hash of the previous ledger's header; zero for a genesis ledger.
    pub parent_hash: Hash256,
    /// Root of this ledger's state trie; zero for an empty state.
    pub state_root: Hash256,
}

impl LedgerHeader {
    pub fn new(sequence: u32, parent_hash: Hash256, state_root: Hash256) -> Self {
        Self {
            sequence,
            parent_hash,
            state_root,
        }
    }

    /// A header whose parent is `parent`.
    pub fn child_of(parent: &LedgerHeader, state_root: Hash256) -> Self {
        Self::new(parent.sequence + 1, parent.hash(), state_root)
    }

    pub fn hash(&self) -> Hash256 {
        ContentHasher::HEADER.hash_parts(&[
            &self.sequence.to_be_bytes()[..],
            &self.parent_hash.as_bytes()[..],
            &self.state_root.as_bytes()[..],
        ])
    }
}

/// What a coordinator still needs for a range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Sequences whose headers are unknown.
    pub ledgers: Vec<u32>,
    /// Trie nodes referenced by known headers but absent from the store.
    pub nodes: Vec<Hash256>,
}

impl WorkUnit {
    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty() && self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ledgers.len() + self.nodes.len()
    }
}

/// One fetched item handed to [`submit`](crate::SyncCoordinator::submit).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncItem {
    Header(LedgerHeader),
    /// A node and the hash it was requested under.
    Node { hash: Hash256, node: Node },
}

impl SyncItem {
    pub fn node(node: Node) -> Self {
        Self::Node {
            hash: node.hash(),
            node,
        }
    }

    /// The identity the item claims.
    pub fn hash(&self) -> Hash256 {
        match self {
            Self::Header(header) => header.hash(),
            Self::Node { hash, .. } => *hash,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub hash: Hash256,
    pub reason: String,
}

/// Outcome of one submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReport {
    pub headers_accepted: usize,
    pub nodes_accepted: usize,
    pub rejected: Vec<Rejection>,
}

impl SubmitReport {
    pub fn accepted(&self) -> usize {
        self.headers_accepted + self.nodes_accepted
    }

    pub(crate) fn reject(&mut self, hash: Hash256, reason: impl Into<String>) {
        self.rejected.push(Rejection {
            hash,
            reason: reason.into(),
        });
    }
}
