use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use radix_store::{ContentStore, Node};
use radix_types::Hash256;

use crate::error::SyncResult;
use crate::types::LedgerHeader;

/// Where a [`SyncDriver`](crate::SyncDriver) fetches from.
///
/// Implementations return what they have and skip what they don't; an
/// empty answer is not an error.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn fetch_headers(&self, sequences: &[u32]) -> SyncResult<Vec<LedgerHeader>>;
    async fn fetch_nodes(&self, hashes: &[Hash256]) -> SyncResult<Vec<(Hash256, Node)>>;
}

/// A [`NodeSource`] backed by a store in the same process.
pub struct LocalSource {
    store: Arc<dyn ContentStore>,
    headers: BTreeMap<u32, LedgerHeader>,
}

impl LocalSource {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = LedgerHeader>) -> Self {
        self.headers
            .extend(headers.into_iter().map(|h| (h.sequence, h)));
        self
    }
}

#[async_trait]
impl NodeSource for LocalSource {
    async fn fetch_headers(&self, sequences: &[u32]) -> SyncResult<Vec<LedgerHeader>> {
        Ok(sequences
            .iter()
            .filter_map(|seq| self.headers.get(seq).cloned())
            .collect())
    }

    async fn fetch_nodes(&self, hashes: &[Hash256]) -> SyncResult<Vec<(Hash256, Node)>> {
        let mut out = Vec::with_capacity(hashes.len());
        for hash in hashes {
            if let Some(node) = self.store.read(hash)? {
                out.push((*hash, node));
            }
        }
        Ok(out)
    }
}
