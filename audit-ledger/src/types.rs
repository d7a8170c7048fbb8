//! Audit entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Digest preceding the first entry of a fresh ledger
pub const GENESIS_DIGEST: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Fields supplied by the caller for one screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Subject name as queried
    pub query_name: String,

    /// Date of birth as queried (may be empty)
    pub query_dob: String,

    /// Country filter as queried ("Any" when unfiltered)
    pub query_country: String,

    /// Number of sanctions candidates returned
    pub sanctions_match_count: u32,

    /// Number of adverse-media hits returned
    pub media_match_count: u32,

    /// Risk level label (HIGH / MEDIUM / LOW)
    pub risk_level: String,

    /// Composite risk score
    pub risk_score: f64,

    /// Serialized snapshot of everything returned to the caller
    pub payload: String,
}

/// One immutable audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic id
    pub id: u64,

    /// Subject name as queried
    pub query_name: String,

    /// Date of birth as queried
    pub query_dob: String,

    /// Country filter as queried
    pub query_country: String,

    /// Number of sanctions candidates
    pub sanctions_match_count: u32,

    /// Number of adverse-media hits
    pub media_match_count: u32,

    /// Risk level label
    pub risk_level: String,

    /// Composite risk score
    pub risk_score: f64,

    /// Write timestamp
    pub timestamp: DateTime<Utc>,

    /// Serialized result snapshot
    pub payload: String,

    /// Digest of the preceding entry
    pub prev_digest: String,

    /// Digest of this entry
    pub digest: String,
}

impl AuditEntry {
    /// Build an entry and seal it with its digest
    pub fn seal(id: u64, record: AuditRecord, timestamp: DateTime<Utc>, prev_digest: String) -> Self {
        let mut entry = Self {
            id,
            query_name: record.query_name,
            query_dob: record.query_dob,
            query_country: record.query_country,
            sanctions_match_count: record.sanctions_match_count,
            media_match_count: record.media_match_count,
            risk_level: record.risk_level,
            risk_score: record.risk_score,
            timestamp,
            payload: record.payload,
            prev_digest,
            digest: String::new(),
        };
        entry.digest = entry.compute_digest();
        entry
    }

    /// BLAKE3 over the previous digest and every field except `digest`
    pub fn compute_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.prev_digest.as_bytes());
        hasher.update(&self.id.to_be_bytes());
        for field in [
            &self.query_name,
            &self.query_dob,
            &self.query_country,
            &self.risk_level,
            &self.payload,
        ] {
            hasher.update(&(field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(&self.sanctions_match_count.to_be_bytes());
        hasher.update(&self.media_match_count.to_be_bytes());
        hasher.update(&self.risk_score.to_bits().to_be_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// True if the stored digest matches the entry contents
    pub fn is_intact(&self) -> bool {
        self.digest == self.compute_digest()
    }
}

/// Entry without the payload, for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Monotonic id
    pub id: u64,
    /// Subject name as queried
    pub query_name: String,
    /// Date of birth as queried
    pub query_dob: String,
    /// Country filter as queried
    pub query_country: String,
    /// Number of sanctions candidates
    pub sanctions_match_count: u32,
    /// Number of adverse-media hits
    pub media_match_count: u32,
    /// Risk level label
    pub risk_level: String,
    /// Composite risk score
    pub risk_score: f64,
    /// Write timestamp
    pub timestamp: DateTime<Utc>,
}

impl From<&AuditEntry> for AuditSummary {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id,
            query_name: entry.query_name.clone(),
            query_dob: entry.query_dob.clone(),
            query_country: entry.query_country.clone(),
            sanctions_match_count: entry.sanctions_match_count,
            media_match_count: entry.media_match_count,
            risk_level: entry.risk_level.clone(),
            risk_score: entry.risk_score,
            timestamp: entry.timestamp,
        }
    }
}
