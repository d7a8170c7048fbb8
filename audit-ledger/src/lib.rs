//! Audit Ledger
//!
//! Append-only record of every screening query and its full result.
//!
//! # Invariants
//!
//! - Append-only: entries are never modified; only the retention sweep deletes
//! - Monotonic: ids increase by one and timestamps never go backwards
//! - Tamper-evident: each entry's digest covers its fields and the previous digest

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod storage;
pub mod types;

// Re-exports
pub use config::{AuditConfig, MAX_RETENTION_DAYS};
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use ledger::AuditLog;
pub use storage::{AuditStorage, MemoryStorage, ScanOrder};
pub use types::{AuditEntry, AuditRecord, AuditSummary, GENESIS_DIGEST};

#[cfg(feature = "rocksdb")]
pub use storage::RocksStorage;
