//! Local ledger state tracking and the coordinator contract.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use radix_diff::{diff, fold, DiffError, RadixOperations};
use radix_store::{ContentStore, Node, RadixMap, StoreError};
use radix_types::Hash256;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::types::{LedgerHeader, LedgerRange, SubmitReport, SyncItem, WorkUnit};

/// What a network layer drives to bring a peer's ledger state up to date.
pub trait SyncCoordinator: Send + Sync {
    /// Make the ledger at `sequence` the canonical tip.
    ///
    /// Fails only when the header is unknown. Any change summary logged
    /// alongside is best-effort and never undoes the switch.
    fn current(&self, sequence: u32) -> SyncResult<()>;

    /// Headers and trie nodes still absent locally for `range`.
    fn missing(&self, range: LedgerRange) -> SyncResult<WorkUnit>;

    /// Ingest fetched items. Items failing verification are reported, not
    /// stored; store failures abort the call.
    fn submit(&self, items: Vec<SyncItem>) -> SyncResult<SubmitReport>;

    /// Point-in-time view of the canonical state.
    fn copy(&self) -> RadixMap;
}

struct SyncState {
    headers: BTreeMap<u32, LedgerHeader>,
    current: Option<u32>,
    tip: RadixMap,
}

/// [`SyncCoordinator`] over a shared content store.
pub struct LedgerSync {
    store: Arc<dyn ContentStore>,
    config: SyncConfig,
    state: RwLock<SyncState>,
}

impl LedgerSync {
    pub fn new(store: Arc<dyn ContentStore>, config: SyncConfig) -> Self {
        let tip = RadixMap::new(Arc::clone(&store));
        Self {
            store,
            config,
            state: RwLock::new(SyncState {
                headers: BTreeMap::new(),
                current: None,
                tip,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sequence of the canonical tip, if one has been set.
    pub fn current_sequence(&self) -> Option<u32> {
        self.state.read().expect("lock poisoned").current
    }

    pub fn header(&self, sequence: u32) -> Option<LedgerHeader> {
        self.state
            .read()
            .expect("lock poisoned")
            .headers
            .get(&sequence)
            .cloned()
    }

    /// Node-level changes from ledger `from` to ledger `to`.
    ///
    /// Both state tries must be fully present. Moved nodes are folded into
    /// movements unless [`SyncConfig::fold_operations`] is off, in which case
    /// the raw diff is returned in action-then-depth order.
    pub fn changes(&self, from: u32, to: u32) -> SyncResult<RadixOperations> {
        let (base, target) = {
            let state = self.state.read().expect("lock poisoned");
            (
                root_of(&state.headers, from)?,
                root_of(&state.headers, to)?,
            )
        };
        let mut ops = diff(self.store.as_ref(), base, target)?;
        if self.config.fold_operations {
            ops = fold(ops);
        } else {
            ops.sort_by_action();
        }
        Ok(ops)
    }

    /// Record absent nodes below `hash` into `out`, stopping at `limit`.
    fn collect_missing(
        &self,
        hash: Hash256,
        seen: &mut HashSet<Hash256>,
        out: &mut Vec<Hash256>,
        limit: usize,
    ) -> SyncResult<()> {
        if hash.is_zero() || out.len() >= limit || !seen.insert(hash) {
            return Ok(());
        }
        match self.store.read(&hash)? {
            None => out.push(hash),
            Some(Node::Inner(inner)) => {
                for (_, child) in inner.occupied() {
                    self.collect_missing(child, seen, out, limit)?;
                }
            }
            Some(Node::Leaf(_)) => {}
        }
        Ok(())
    }

    fn accept_header(state: &mut SyncState, header: LedgerHeader, report: &mut SubmitReport) {
        let hash = header.hash();
        if let Some(known) = state.headers.get(&header.sequence) {
            if known.hash() != hash {
                let reason = format!("conflicts with known ledger {}", header.sequence);
                report.reject(hash, reason);
            } else {
                report.headers_accepted += 1;
            }
            return;
        }

        let parent = header
            .sequence
            .checked_sub(1)
            .and_then(|seq| state.headers.get(&seq));
        if let Some(parent) = parent {
            if parent.hash() != header.parent_hash {
                let reason = format!("parent hash does not match ledger {}", parent.sequence);
                report.reject(hash, reason);
                return;
            }
        }
        let child = header
            .sequence
            .checked_add(1)
            .and_then(|seq| state.headers.get(&seq));
        if let Some(child) = child {
            if child.parent_hash != hash {
                let reason = format!("not the parent of known ledger {}", child.sequence);
                report.reject(hash, reason);
                return;
            }
        }

        state.headers.insert(header.sequence, header);
        report.headers_accepted += 1;
    }
}

fn root_of(headers: &BTreeMap<u32, LedgerHeader>, sequence: u32) -> SyncResult<Hash256> {
    headers
        .get(&sequence)
        .map(|h| h.state_root)
        .ok_or(SyncError::UnknownLedger(sequence))
}

impl SyncCoordinator for LedgerSync {
    fn current(&self, sequence: u32) -> SyncResult<()> {
        let previous = {
            let mut state = self.state.write().expect("lock poisoned");
            let root = root_of(&state.headers, sequence)?;
            let previous = state.current.replace(sequence);
            state.tip = RadixMap::from_root(Arc::clone(&self.store), root);
            previous
        };

        match previous {
            Some(from) if from != sequence => match self.changes(from, sequence) {
                Ok(ops) => {
                    let summary = ops.summary();
                    info!(
                        from,
                        to = sequence,
                        additions = summary.additions,
                        deletions = summary.deletions,
                        movements = summary.movements,
                        "advanced ledger tip"
                    );
                }
                Err(SyncError::Diff(DiffError::StoreMiss(hash))) => {
                    info!(from, to = sequence, "advanced ledger tip");
                    debug!(missing = %hash.short_hex(), "change plan unavailable, trie incomplete");
                }
                Err(e) => {
                    warn!(
                        from,
                        to = sequence,
                        error = %e,
                        "advanced ledger tip without change plan"
                    );
                }
            },
            _ => info!(to = sequence, "set ledger tip"),
        }
        Ok(())
    }

    fn missing(&self, range: LedgerRange) -> SyncResult<WorkUnit> {
        range.validate()?;
        let roots: Vec<(u32, Option<Hash256>)> = {
            let state = self.state.read().expect("lock poisoned");
            range
                .sequences()
                .map(|seq| (seq, state.headers.get(&seq).map(|h| h.state_root)))
                .collect()
        };

        let mut work = WorkUnit::default();
        let mut seen = HashSet::new();
        for (sequence, root) in roots {
            match root {
                None => {
                    if work.ledgers.len() < self.config.max_ledgers_per_unit {
                        work.ledgers.push(sequence);
                    }
                }
                Some(root) => self.collect_missing(
                    root,
                    &mut seen,
                    &mut work.nodes,
                    self.config.max_missing_nodes,
                )?,
            }
        }

        debug!(
            range = %range,
            ledgers = work.ledgers.len(),
            nodes = work.nodes.len(),
            "computed missing work"
        );
        Ok(work)
    }

    fn submit(&self, items: Vec<SyncItem>) -> SyncResult<SubmitReport> {
        let mut report = SubmitReport::default();
        let mut state = self.state.write().expect("lock poisoned");

        for item in items {
            match item {
                SyncItem::Header(header) => Self::accept_header(&mut state, header, &mut report),
                SyncItem::Node { hash, node } => match self.store.put_verified(&hash, &node) {
                    Ok(_) => report.nodes_accepted += 1,
                    Err(StoreError::HashMismatch { computed, .. }) => {
                        report.reject(hash, format!("content hashes to {computed}"));
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
        drop(state);

        if !report.rejected.is_empty() {
            warn!(
                rejected = report.rejected.len(),
                accepted = report.accepted(),
                "submission contained invalid items"
            );
        }
        debug!(
            headers = report.headers_accepted,
            nodes = report.nodes_accepted,
            "submission ingested"
        );
        Ok(report)
    }

    fn copy(&self) -> RadixMap {
        self.state.read().expect("lock poisoned").tip.clone()
    }
}

impl std::fmt::Debug for LedgerSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("LedgerSync")
            .field("headers", &state.headers.len())
            .field("current", &state.current)
            .field("tip", &state.tip.root_hash())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_diff::RadixAction;
    use radix_store::InMemoryContentStore;

    fn key(prefix: &[u8]) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[..prefix.len()].copy_from_slice(prefix);
        Hash256::from_bytes(bytes)
    }

    /// A source store holding two ledgers and their headers.
    struct Fixture {
        source: Arc<InMemoryContentStore>,
        first: LedgerHeader,
        second: LedgerHeader,
        second_map: RadixMap,
    }

    fn fixture() -> Fixture {
        let source = Arc::new(InMemoryContentStore::new());
        let mut map = RadixMap::new(source.clone());
        map.insert(key(&[0x12, 0x34]), b"alice".to_vec()).unwrap();
        map.insert(key(&[0x50]), b"bob".to_vec()).unwrap();
        let first = LedgerHeader::new(1, Hash256::ZERO, map.root_hash());

        map.insert(key(&[0x12, 0x35]), b"carol".to_vec()).unwrap();
        map.insert(key(&[0x50]), b"bob v2".to_vec()).unwrap();
        let second = LedgerHeader::child_of(&first, map.root_hash());

        Fixture {
            source,
            first,
            second,
            second_map: map,
        }
    }

    fn node_items(source: &InMemoryContentStore, hashes: &[Hash256]) -> Vec<SyncItem> {
        hashes
            .iter()
            .map(|h| SyncItem::Node {
                hash: *h,
                node: source.get(h).unwrap(),
            })
            .collect()
    }

    fn empty_sync() -> LedgerSync {
        LedgerSync::new(Arc::new(InMemoryContentStore::new()), SyncConfig::default())
    }

    /// Run missing/submit locally until nothing is missing.
    fn fill(sync: &LedgerSync, f: &Fixture, range: LedgerRange) {
        for _ in 0..16 {
            let work = sync.missing(range).unwrap();
            if work.is_empty() {
                return;
            }
            let mut items: Vec<SyncItem> = work
                .ledgers
                .iter()
                .filter_map(|seq| [&f.first, &f.second].into_iter().find(|h| h.sequence == *seq))
                .cloned()
                .map(SyncItem::Header)
                .collect();
            items.extend(node_items(&f.source, &work.nodes));
            sync.submit(items).unwrap();
        }
        panic!("range never completed");
    }

    #[test]
    fn unknown_headers_are_reported_first() {
        let sync = empty_sync();
        let work = sync.missing(LedgerRange::new(1, 3).unwrap()).unwrap();
        assert_eq!(work.ledgers, vec![1, 2, 3]);
        assert!(work.nodes.is_empty());
    }

    #[test]
    fn missing_respects_ledger_limit() {
        let config = SyncConfig {
            max_ledgers_per_unit: 2,
            ..Default::default()
        };
        let sync = LedgerSync::new(Arc::new(InMemoryContentStore::new()), config);
        let work = sync.missing(LedgerRange::new(10, 20).unwrap()).unwrap();
        assert_eq!(work.ledgers, vec![10, 11]);
    }

    #[test]
    fn missing_rejects_inverted_range() {
        let sync = empty_sync();
        assert!(matches!(
            sync.missing(LedgerRange { start: 4, end: 2 }),
            Err(SyncError::InvalidRange { .. })
        ));
    }

    #[test]
    fn known_header_yields_its_root_then_children() {
        let f = fixture();
        let sync = empty_sync();
        sync.submit(vec![SyncItem::Header(f.second.clone())]).unwrap();

        let range = LedgerRange::single(2);
        let work = sync.missing(range).unwrap();
        assert!(work.ledgers.is_empty());
        assert_eq!(work.nodes, vec![f.second.state_root]);

        sync.submit(node_items(&f.source, &work.nodes)).unwrap();
        let next = sync.missing(range).unwrap();
        let root = f.source.get(&f.second.state_root).unwrap();
        let children: Vec<Hash256> = root.as_inner().unwrap().occupied().map(|(_, h)| h).collect();
        assert_eq!(next.nodes, children);
    }

    #[test]
    fn missing_respects_node_limit() {
        let f = fixture();
        let config = SyncConfig {
            max_missing_nodes: 1,
            ..Default::default()
        };
        let sync = LedgerSync::new(Arc::new(InMemoryContentStore::new()), config);
        sync.submit(vec![SyncItem::Header(f.second.clone())]).unwrap();
        sync.submit(node_items(&f.source, &[f.second.state_root])).unwrap();
        assert_eq!(sync.missing(LedgerRange::single(2)).unwrap().nodes.len(), 1);
    }

    #[test]
    fn fill_completes_and_shares_nodes() {
        let f = fixture();
        let sync = empty_sync();
        let range = LedgerRange::new(1, 2).unwrap();
        fill(&sync, &f, range);

        assert!(sync.missing(range).unwrap().is_empty());
        let local = RadixMap::from_root(sync.store().clone(), f.second.state_root);
        assert_eq!(local.leaves().unwrap(), f.second_map.leaves().unwrap());
    }

    #[test]
    fn submit_rejects_tampered_node() {
        let f = fixture();
        let sync = empty_sync();
        let real = f.source.get(&f.first.state_root).unwrap();
        let forged = Node::leaf(key(&[0x99]), b"forged".to_vec());

        let report = sync
            .submit(vec![
                SyncItem::Node {
                    hash: f.first.state_root,
                    node: forged,
                },
                SyncItem::Node {
                    hash: f.first.state_root,
                    node: real,
                },
            ])
            .unwrap();
        assert_eq!(report.nodes_accepted, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].hash, f.first.state_root);
        assert!(sync.store().contains(&f.first.state_root).unwrap());
    }

    #[test]
    fn submit_rejects_broken_header_links() {
        let f = fixture();
        let sync = empty_sync();
        sync.submit(vec![SyncItem::Header(f.first.clone())]).unwrap();

        let orphan = LedgerHeader::new(2, key(&[0xee]), f.second.state_root);
        let conflicting = LedgerHeader::new(1, Hash256::ZERO, key(&[0x01]));
        let report = sync
            .submit(vec![
                SyncItem::Header(orphan),
                SyncItem::Header(conflicting),
                SyncItem::Header(f.first.clone()),
            ])
            .unwrap();
        assert_eq!(report.headers_accepted, 1);
        assert_eq!(report.rejected.len(), 2);
        assert!(sync.header(2).is_none());

        // A known child constrains a late-arriving parent.
        let sync = empty_sync();
        sync.submit(vec![SyncItem::Header(f.second.clone())]).unwrap();
        let wrong_parent = LedgerHeader::new(1, Hash256::ZERO, key(&[0x02]));
        let report = sync
            .submit(vec![
                SyncItem::Header(wrong_parent),
                SyncItem::Header(f.first.clone()),
            ])
            .unwrap();
        assert_eq!(report.headers_accepted, 1);
        assert_eq!(sync.header(1), Some(f.first.clone()));
    }

    #[test]
    fn current_requires_known_header() {
        let sync = empty_sync();
        assert!(matches!(sync.current(7), Err(SyncError::UnknownLedger(7))));
        assert_eq!(sync.current_sequence(), None);
    }

    #[test]
    fn current_moves_snapshot_and_old_copies_stay_valid() {
        let f = fixture();
        let sync = empty_sync();
        fill(&sync, &f, LedgerRange::new(1, 2).unwrap());

        assert!(sync.copy().is_empty());
        sync.current(1).unwrap();
        let first = sync.copy();
        sync.current(2).unwrap();
        let second = sync.copy();

        assert_eq!(sync.current_sequence(), Some(2));
        assert_eq!(first.root_hash(), f.first.state_root);
        assert_eq!(second.root_hash(), f.second.state_root);
        assert_eq!(first.get(&key(&[0x50])).unwrap(), Some(b"bob".to_vec()));
        assert_eq!(second.get(&key(&[0x50])).unwrap(), Some(b"bob v2".to_vec()));
        assert_eq!(first.get(&key(&[0x12, 0x35])).unwrap(), None);
    }

    #[test]
    fn current_tolerates_incomplete_tries() {
        let f = fixture();
        let sync = empty_sync();
        sync.submit(vec![
            SyncItem::Header(f.first.clone()),
            SyncItem::Header(f.second.clone()),
        ])
        .unwrap();
        sync.current(1).unwrap();
        sync.current(2).unwrap();
        assert_eq!(sync.copy().root_hash(), f.second.state_root);
    }

    #[test]
    fn current_survives_malformed_target_trie() {
        let sync = empty_sync();
        let mut root = sync
            .store()
            .put(&Node::leaf(key(&[0x01]), b"deep".to_vec()))
            .unwrap();
        // One inner level more than a 256-bit key can branch on.
        for _ in 0..65 {
            let mut children = [Hash256::ZERO; 16];
            children[0] = root;
            root = sync.store().put(&Node::inner(children)).unwrap();
        }
        let first = LedgerHeader::new(1, Hash256::ZERO, Hash256::ZERO);
        let second = LedgerHeader::child_of(&first, root);
        sync.submit(vec![SyncItem::Header(first), SyncItem::Header(second)]).unwrap();

        assert!(matches!(
            sync.changes(1, 2),
            Err(SyncError::Diff(DiffError::Structural { .. }))
        ));
        sync.current(1).unwrap();
        sync.current(2).unwrap();
        assert_eq!(sync.current_sequence(), Some(2));
        assert_eq!(sync.copy().root_hash(), root);
    }

    #[test]
    fn changes_fold_the_moved_leaf() {
        let f = fixture();
        let sync = empty_sync();
        fill(&sync, &f, LedgerRange::new(1, 2).unwrap());

        let ops = sync.changes(1, 2).unwrap();
        let summary = ops.summary();
        assert_eq!(summary.movements, 1, "alice moves below the new split");
        assert!(summary.additions > 0);
        assert!(summary.deletions > 0);
        assert_eq!(ops.as_slice()[0].action, RadixAction::Movement);

        let raw = LedgerSync::new(
            sync.store().clone(),
            SyncConfig {
                fold_operations: false,
                ..Default::default()
            },
        );
        raw.submit(vec![
            SyncItem::Header(f.first.clone()),
            SyncItem::Header(f.second.clone()),
        ])
        .unwrap();
        let unfolded = raw.changes(1, 2).unwrap();
        assert_eq!(unfolded.summary().movements, 0);
        assert_eq!(unfolded.len(), ops.len() + 1);
    }

    #[test]
    fn changes_on_incomplete_trie_is_store_miss() {
        let f = fixture();
        let sync = empty_sync();
        sync.submit(vec![
            SyncItem::Header(f.first.clone()),
            SyncItem::Header(f.second.clone()),
        ])
        .unwrap();
        assert!(matches!(
            sync.changes(1, 2),
            Err(SyncError::Diff(DiffError::StoreMiss(_)))
        ));
        assert!(matches!(sync.changes(1, 9), Err(SyncError::UnknownLedger(9))));
    }

    #[test]
    fn debug_format() {
        let sync = empty_sync();
        let debug = format!("{sync:?}");
        assert!(debug.contains("LedgerSync"));
        assert!(debug.contains("current"));
    }
}
