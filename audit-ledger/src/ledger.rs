//! Audit log orchestration layer
//!
//! Appends are serialized through a single chain head holding the next id,
//! the previous digest and the previous timestamp. Reads go straight to
//! storage.
//!
//! # Example
//!
//! ```
//! use audit_ledger::{AuditLog, AuditRecord};
//!
//! let log = AuditLog::in_memory();
//! let id = log.record(AuditRecord {
//!     query_name: "Jane Roe".to_string(),
//!     query_dob: String::new(),
//!     query_country: "Any".to_string(),
//!     sanctions_match_count: 0,
//!     media_match_count: 0,
//!     risk_level: "LOW".to_string(),
//!     risk_score: 0.0,
//!     payload: "{}".to_string(),
//! })?;
//! assert_eq!(log.get(id)?.query_name, "Jane Roe");
//! # Ok::<(), audit_ledger::Error>(())
//! ```

use crate::{
    export::{self, ExportFormat},
    storage::{AuditStorage, MemoryStorage, ScanOrder},
    types::{AuditEntry, AuditRecord, AuditSummary, GENESIS_DIGEST},
    AuditConfig, Error, Result,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

struct ChainHead {
    next_id: u64,
    last_digest: String,
    last_timestamp: Option<DateTime<Utc>>,
}

impl ChainHead {
    fn genesis() -> Self {
        Self {
            next_id: 1,
            last_digest: GENESIS_DIGEST.to_string(),
            last_timestamp: None,
        }
    }

    fn after(last: AuditEntry) -> Self {
        Self {
            next_id: last.id + 1,
            last_digest: last.digest,
            last_timestamp: Some(last.timestamp),
        }
    }
}

/// Append-only audit log
pub struct AuditLog {
    storage: Arc<dyn AuditStorage>,
    head: Mutex<ChainHead>,
    config: AuditConfig,
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("next_id", &self.head.lock().next_id)
            .field("config", &self.config)
            .finish()
    }
}

impl AuditLog {
    /// Open the log described by `config`
    pub fn open(config: AuditConfig) -> Result<Self> {
        let storage: Arc<dyn AuditStorage> = match &config.data_dir {
            None => Arc::new(MemoryStorage::new()),
            #[cfg(feature = "rocksdb")]
            Some(dir) => Arc::new(crate::storage::RocksStorage::open(dir)?),
            #[cfg(not(feature = "rocksdb"))]
            Some(dir) => {
                return Err(Error::Config(format!(
                    "audit data_dir {:?} requires the `rocksdb` feature",
                    dir
                )))
            }
        };
        Self::with_storage(storage, config)
    }

    /// In-memory log with default retention
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            head: Mutex::new(ChainHead::genesis()),
            config: AuditConfig::default(),
        }
    }

    /// Wrap an existing storage backend, resuming its chain
    pub fn with_storage(storage: Arc<dyn AuditStorage>, config: AuditConfig) -> Result<Self> {
        let head = storage.last()?.map_or_else(ChainHead::genesis, ChainHead::after);

        info!(next_id = head.next_id, "Audit log opened");

        Ok(Self {
            storage,
            head: Mutex::new(head),
            config,
        })
    }

    /// Append one entry and return its id. Storage failures propagate.
    pub fn record(&self, record: AuditRecord) -> Result<u64> {
        let mut head = self.head.lock();

        let now = Utc::now();
        let timestamp = match head.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };

        let id = head.next_id;
        let entry = AuditEntry::seal(id, record, timestamp, head.last_digest.clone());
        self.storage.append(&entry)?;

        head.next_id = id + 1;
        head.last_digest = entry.digest.clone();
        head.last_timestamp = Some(timestamp);

        debug!(
            audit_id = id,
            query = %entry.query_name,
            risk_level = %entry.risk_level,
            "Audit entry recorded"
        );

        Ok(id)
    }

    /// Most recent entries first
    pub fn list(&self, limit: usize) -> Result<Vec<AuditSummary>> {
        Ok(self
            .storage
            .scan(ScanOrder::Descending, Some(limit))?
            .iter()
            .map(AuditSummary::from)
            .collect())
    }

    /// Full entry including the result snapshot
    pub fn get(&self, id: u64) -> Result<AuditEntry> {
        self.storage.get(id)?.ok_or(Error::NotFound(id))
    }

    /// Number of entries currently retained
    pub fn len(&self) -> Result<usize> {
        self.storage.count()
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Retention sweep: delete entries older than `retention_days`.
    /// A horizon reaching past the earliest representable time purges nothing.
    pub fn purge_older_than(&self, retention_days: u32) -> Result<usize> {
        let _head = self.head.lock();
        let horizon = Duration::days(i64::from(retention_days));
        let cutoff = match Utc::now().checked_sub_signed(horizon) {
            Some(cutoff) => cutoff,
            None => {
                debug!(retention_days, "Retention horizon out of range, nothing to purge");
                return Ok(0);
            }
        };
        let removed = self.storage.delete_before(cutoff)?;

        if removed > 0 {
            info!(removed, retention_days, "Purged expired audit entries");
        }
        Ok(removed)
    }

    /// Retention sweep using the configured horizon
    pub fn purge_expired(&self) -> Result<usize> {
        self.purge_older_than(self.config.retention_days)
    }

    /// Serialize the whole trail, newest first
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let entries = self.storage.scan(ScanOrder::Descending, None)?;
        export::render(&entries, format)
    }

    /// Check every digest and every link between retained neighbours.
    /// Returns the number of verified entries.
    pub fn verify_chain(&self) -> Result<usize> {
        let entries = self.storage.scan(ScanOrder::Ascending, None)?;

        for (i, entry) in entries.iter().enumerate() {
            if !entry.is_intact() {
                return Err(Error::Integrity(format!(
                    "entry {} digest does not match its contents",
                    entry.id
                )));
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &entries[p]) {
                if entry.prev_digest != prev.digest {
                    return Err(Error::Integrity(format!(
                        "entry {} does not link to entry {}",
                        entry.id, prev.id
                    )));
                }
            }
        }

        Ok(entries.len())
    }

    /// Active configuration
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }
}
