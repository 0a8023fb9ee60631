use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Limits and switches for [`LedgerSync`](crate::LedgerSync) and
/// [`SyncDriver`](crate::SyncDriver).
///
/// Every field has a default, so a TOML document only needs the keys it
/// overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on node hashes in one work unit.
    pub max_missing_nodes: usize,
    /// Upper bound on unknown ledger headers in one work unit.
    pub max_ledgers_per_unit: usize,
    /// Fetch rounds the driver attempts before giving up on a range.
    pub max_rounds: u32,
    /// Whether change plans collapse moved nodes into movements.
    pub fold_operations: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_missing_nodes: 256,
            max_ledgers_per_unit: 32,
            max_rounds: 64,
            fold_operations: true,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> SyncResult<String> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.max_missing_nodes == 0 {
            return Err(SyncError::Config("max_missing_nodes must be positive".into()));
        }
        if self.max_ledgers_per_unit == 0 {
            return Err(SyncError::Config(
                "max_ledgers_per_unit must be positive".into(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(SyncError::Config("max_rounds must be positive".into()));
        }
        Ok(())
    }
}
