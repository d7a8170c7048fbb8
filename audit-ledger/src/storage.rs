//! Storage backends for the audit trail
//!
//! Entries are keyed by their monotonic id. Because timestamps never go
//! backwards, id order is also timestamp order, so the retention sweep only
//! ever removes a prefix of the trail.

use crate::{error::Result, types::AuditEntry};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Iteration order over the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    Descending,
}

/// Append-only entry storage
pub trait AuditStorage: Send + Sync {
    /// Persist a sealed entry. Must not return before the write is durable
    /// for the backend.
    fn append(&self, entry: &AuditEntry) -> Result<()>;

    /// Fetch one entry
    fn get(&self, id: u64) -> Result<Option<AuditEntry>>;

    /// Most recent entry
    fn last(&self) -> Result<Option<AuditEntry>>;

    /// Entries in id order, optionally limited
    fn scan(&self, order: ScanOrder, limit: Option<usize>) -> Result<Vec<AuditEntry>>;

    /// Delete entries written strictly before `cutoff`; returns how many
    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Number of stored entries
    fn count(&self) -> Result<usize>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<u64, AuditEntry>>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStorage for MemoryStorage {
    fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.entries.write().insert(entry.id, entry.clone());
        Ok(())
    }

    fn get(&self, id: u64) -> Result<Option<AuditEntry>> {
        Ok(self.entries.read().get(&id).cloned())
    }

    fn last(&self) -> Result<Option<AuditEntry>> {
        Ok(self.entries.read().values().next_back().cloned())
    }

    fn scan(&self, order: ScanOrder, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read();
        let limit = limit.unwrap_or(usize::MAX);
        let scanned = match order {
            ScanOrder::Ascending => entries.values().take(limit).cloned().collect(),
            ScanOrder::Descending => entries.values().rev().take(limit).cloned().collect(),
        };
        Ok(scanned)
    }

    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.timestamp >= cutoff);
        Ok(before - entries.len())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
}

#[cfg(feature = "rocksdb")]
pub use self::rocks::RocksStorage;

#[cfg(feature = "rocksdb")]
mod rocks {
    use super::{AuditStorage, ScanOrder};
    use crate::{
        error::{Error, Result},
        types::AuditEntry,
    };
    use chrono::{DateTime, Utc};
    use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
    use std::path::Path;

    const CF_ENTRIES: &str = "audit_entries";

    /// RocksDB-backed storage
    pub struct RocksStorage {
        db: DB,
    }

    impl std::fmt::Debug for RocksStorage {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RocksStorage")
                .field("path", &self.db.path())
                .finish()
        }
    }

    impl RocksStorage {
        /// Open or create database
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            std::fs::create_dir_all(path)?;

            let mut db_opts = Options::default();
            db_opts.create_if_missing(true);
            db_opts.create_missing_column_families(true);

            let mut cf_opts = Options::default();
            cf_opts.set_compression_type(rocksdb::DBCompressionType::Zstd);

            let db = DB::open_cf_descriptors(
                &db_opts,
                path,
                vec![ColumnFamilyDescriptor::new(CF_ENTRIES, cf_opts)],
            )?;

            tracing::info!("Opened audit RocksDB at {:?}", path);
            Ok(Self { db })
        }

        fn cf(&self) -> Result<&ColumnFamily> {
            self.db
                .cf_handle(CF_ENTRIES)
                .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_ENTRIES)))
        }

        fn decode(value: &[u8]) -> Result<AuditEntry> {
            Ok(bincode::deserialize(value)?)
        }
    }

    impl AuditStorage for RocksStorage {
        fn append(&self, entry: &AuditEntry) -> Result<()> {
            let cf = self.cf()?;
            let value = bincode::serialize(entry)?;
            let mut write_opts = rocksdb::WriteOptions::default();
            write_opts.set_sync(true);
            self.db
                .put_cf_opt(cf, entry.id.to_be_bytes(), value, &write_opts)?;
            Ok(())
        }

        fn get(&self, id: u64) -> Result<Option<AuditEntry>> {
            let cf = self.cf()?;
            self.db
                .get_cf(cf, id.to_be_bytes())?
                .map(|value| Self::decode(&value))
                .transpose()
        }

        fn last(&self) -> Result<Option<AuditEntry>> {
            Ok(self.scan(ScanOrder::Descending, Some(1))?.into_iter().next())
        }

        fn scan(&self, order: ScanOrder, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
            let cf = self.cf()?;
            let mode = match order {
                ScanOrder::Ascending => IteratorMode::Start,
                ScanOrder::Descending => IteratorMode::End,
            };

            let mut entries = Vec::new();
            for item in self.db.iterator_cf(cf, mode).take(limit.unwrap_or(usize::MAX)) {
                let (_, value) = item?;
                entries.push(Self::decode(&value)?);
            }
            Ok(entries)
        }

        fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
            let cf = self.cf()?;
            let mut batch = WriteBatch::default();
            let mut removed = 0;

            for item in self.db.iterator_cf(cf, IteratorMode::Start) {
                let (key, value) = item?;
                if Self::decode(&value)?.timestamp >= cutoff {
                    break;
                }
                batch.delete_cf(cf, key);
                removed += 1;
            }

            self.db.write(batch)?;
            Ok(removed)
        }

        fn count(&self) -> Result<usize> {
            let cf = self.cf()?;
            let mut count = 0;
            for item in self.db.iterator_cf(cf, IteratorMode::Start) {
                item?;
                count += 1;
            }
            Ok(count)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::types::{AuditRecord, GENESIS_DIGEST};
        use tempfile::TempDir;

        fn entry(id: u64, timestamp: DateTime<Utc>) -> AuditEntry {
            AuditEntry::seal(
                id,
                AuditRecord {
                    query_name: format!("subject {}", id),
                    query_dob: String::new(),
                    query_country: "Any".to_string(),
                    sanctions_match_count: 0,
                    media_match_count: 0,
                    risk_level: "LOW".to_string(),
                    risk_score: 0.0,
                    payload: "{}".to_string(),
                },
                timestamp,
                GENESIS_DIGEST.to_string(),
            )
        }

        #[test]
        fn test_append_scan_and_reopen() {
            let dir = TempDir::new().unwrap();
            let now = Utc::now();
            {
                let storage = RocksStorage::open(dir.path()).unwrap();
                for id in 1..=3 {
                    storage.append(&entry(id, now)).unwrap();
                }
            }

            let storage = RocksStorage::open(dir.path()).unwrap();
            let newest_first = storage.scan(ScanOrder::Descending, None).unwrap();
            assert_eq!(newest_first.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 2, 1]);
            assert_eq!(storage.last().unwrap().unwrap().id, 3);
            assert!(storage.get(2).unwrap().unwrap().is_intact());
        }

        #[test]
        fn test_delete_before_removes_prefix() {
            let dir = TempDir::new().unwrap();
            let storage = RocksStorage::open(dir.path()).unwrap();
            let now = Utc::now();
            storage.append(&entry(1, now - chrono::Duration::days(10))).unwrap();
            storage.append(&entry(2, now)).unwrap();

            let removed = storage.delete_before(now - chrono::Duration::days(1)).unwrap();
            assert_eq!(removed, 1);
            assert_eq!(storage.count().unwrap(), 1);
            assert!(storage.get(1).unwrap().is_none());
        }
    }
}
