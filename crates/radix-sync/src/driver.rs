use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::coordinator::SyncCoordinator;
use crate::error::{SyncError, SyncResult};
use crate::transport::NodeSource;
use crate::types::{LedgerRange, SyncItem};

/// Totals for one [`SyncDriver::sync_range`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncProgress {
    pub rounds: u32,
    pub headers_received: usize,
    pub nodes_received: usize,
    pub rejected: usize,
}

/// Repeats missing, fetch and submit until a range is complete.
pub struct SyncDriver<C: ?Sized, S> {
    coordinator: Arc<C>,
    source: S,
    config: SyncConfig,
}

impl<C, S> SyncDriver<C, S>
where
    C: SyncCoordinator + ?Sized,
    S: NodeSource,
{
    pub fn new(coordinator: Arc<C>, source: S, config: SyncConfig) -> Self {
        Self {
            coordinator,
            source,
            config,
        }
    }

    pub fn coordinator(&self) -> &Arc<C> {
        &self.coordinator
    }

    /// Fetch every header and node `range` still lacks.
    ///
    /// Fails with [`SyncError::Stalled`] when a round stores nothing and with
    /// [`SyncError::Incomplete`] once [`SyncConfig::max_rounds`] rounds have
    /// run without finishing.
    pub async fn sync_range(&self, range: LedgerRange) -> SyncResult<SyncProgress> {
        range.validate()?;
        let mut progress = SyncProgress::default();

        for round in 1..=self.config.max_rounds {
            let work = self.coordinator.missing(range)?;
            if work.is_empty() {
                info!(range = %range, rounds = progress.rounds, "range synchronized");
                return Ok(progress);
            }
            progress.rounds = round;

            let headers = self.source.fetch_headers(&work.ledgers).await?;
            let nodes = self.source.fetch_nodes(&work.nodes).await?;
            debug!(
                round,
                wanted = work.len(),
                headers = headers.len(),
                nodes = nodes.len(),
                "fetched sync items"
            );

            let items: Vec<SyncItem> = headers
                .into_iter()
                .map(SyncItem::Header)
                .chain(nodes.into_iter().map(|(hash, node)| SyncItem::Node { hash, node }))
                .collect();
            let report = self.coordinator.submit(items)?;
            progress.headers_received += report.headers_accepted;
            progress.nodes_received += report.nodes_accepted;
            progress.rejected += report.rejected.len();

            if report.accepted() == 0 {
                warn!(round, rejected = report.rejected.len(), "sync round made no progress");
                return Err(SyncError::Stalled {
                    round,
                    rejected: report.rejected.len(),
                });
            }
        }

        if self.coordinator.missing(range)?.is_empty() {
            info!(range = %range, rounds = progress.rounds, "range synchronized");
            return Ok(progress);
        }
        Err(SyncError::Incomplete(self.config.max_rounds))
    }
}
