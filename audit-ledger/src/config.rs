//! Configuration for the audit ledger

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest accepted retention horizon (100 years)
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Audit ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// RocksDB directory; `None` keeps the trail in memory
    pub data_dir: Option<PathBuf>,

    /// Retention horizon for the purge sweep (days)
    pub retention_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            retention_days: 365,
        }
    }
}

impl AuditConfig {
    /// Reject retention horizons outside `1..=MAX_RETENTION_DAYS`
    pub fn validate(&self) -> Result<()> {
        if self.retention_days == 0 || self.retention_days > MAX_RETENTION_DAYS {
            return Err(Error::Config(format!(
                "audit retention_days must be within 1-{}, got {}",
                MAX_RETENTION_DAYS, self.retention_days
            )));
        }
        Ok(())
    }
}
