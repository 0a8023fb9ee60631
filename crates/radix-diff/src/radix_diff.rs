//! Recursive structural comparison of two trie versions.
//!
//! `left` is the base version and `right` the target. A node reachable only
//! from the target is an [`Addition`](RadixAction::Addition), one reachable
//! only from the base is a [`Deletion`](RadixAction::Deletion). Child slots
//! are visited in ascending nibble order and equal hashes are skipped without
//! a store read, so the cost is proportional to the changed part of the trie.
//!
//! The argument order is base first. Code holding a `(new, old)` pair, as
//! some ledger tooling reports it, must swap before calling [`diff`] or every
//! addition comes back as a deletion.

use radix_store::{ContentStore, Node};
use radix_types::{Hash256, Nibble, MAX_DEPTH};
use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::operation::{RadixAction, RadixOperations};

/// Compute the node-level operations that turn trie `left` into trie `right`.
///
/// Every non-zero hash reached must resolve in `store`; the first miss
/// aborts the whole call with [`DiffError::StoreMiss`].
pub fn diff(store: &dyn ContentStore, left: Hash256, right: Hash256) -> DiffResult<RadixOperations> {
    let mut walker = Walker {
        store,
        ops: RadixOperations::new(),
    };
    walker.compare(left, right, 0)?;

    debug!(
        left = %left.short_hex(),
        right = %right.short_hex(),
        operations = walker.ops.len(),
        "radix diff complete"
    );
    Ok(walker.ops)
}

struct Walker<'a> {
    store: &'a dyn ContentStore,
    ops: RadixOperations,
}

impl Walker<'_> {
    fn compare(&mut self, left: Hash256, right: Hash256, depth: u8) -> DiffResult<()> {
        if left == right {
            return Ok(());
        }
        if left.is_zero() {
            return self.walk(right, depth, RadixAction::Addition);
        }
        if right.is_zero() {
            return self.walk(left, depth, RadixAction::Deletion);
        }

        let base = self.fetch(left, depth)?;
        let target = self.fetch(right, depth)?;
        let base_children = children(&base);
        let target_children = children(&target);
        self.ops.add(left, base, RadixAction::Deletion, depth);
        self.ops.add(right, target, RadixAction::Addition, depth);

        match (base_children, target_children) {
            (Some(base_children), Some(target_children)) => {
                for nibble in Nibble::all() {
                    let i = nibble.index();
                    self.compare(base_children[i], target_children[i], depth + 1)?;
                }
                Ok(())
            }
            (Some(base_children), None) => {
                self.walk_children(&base_children, depth + 1, RadixAction::Deletion)
            }
            (None, Some(target_children)) => {
                self.walk_children(&target_children, depth + 1, RadixAction::Addition)
            }
            (None, None) => Ok(()),
        }
    }

    /// Emit `action` for `hash` and everything below it.
    fn walk(&mut self, hash: Hash256, depth: u8, action: RadixAction) -> DiffResult<()> {
        let node = self.fetch(hash, depth)?;
        let below = children(&node);
        self.ops.add(hash, node, action, depth);
        match below {
            Some(below) => self.walk_children(&below, depth + 1, action),
            None => Ok(()),
        }
    }

    fn walk_children(
        &mut self,
        children: &[Hash256; Nibble::COUNT],
        depth: u8,
        action: RadixAction,
    ) -> DiffResult<()> {
        for child in children.iter().filter(|h| !h.is_zero()) {
            self.walk(*child, depth, action)?;
        }
        Ok(())
    }

    /// Load `hash` and check it against the position it was reached from.
    ///
    /// Leaves may sit at [`MAX_DEPTH`], under an inner node that branches on
    /// the last key nibble. An inner node there has nothing left to branch on.
    fn fetch(&self, hash: Hash256, depth: u8) -> DiffResult<Node> {
        if depth > MAX_DEPTH {
            return Err(DiffError::Structural {
                hash,
                reason: format!("node at depth {depth} is below the deepest key nibble"),
            });
        }
        let node = self.store.get(&hash)?;
        let computed = node.hash();
        if computed != hash {
            return Err(DiffError::Structural {
                hash,
                reason: format!("stored {} node hashes to {computed}", node.kind()),
            });
        }
        if depth == MAX_DEPTH && node.as_inner().is_some() {
            return Err(DiffError::Structural {
                hash,
                reason: format!("inner node at depth {depth} has no key nibble to branch on"),
            });
        }
        Ok(node)
    }
}

fn children(node: &Node) -> Option<[Hash256; Nibble::COUNT]> {
    node.as_inner().map(|inner| *inner.children())
}
