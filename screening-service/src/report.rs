//! Per-query compliance report

use crate::types::{MatchCandidate, MediaArticle, ScreeningResult};
use crate::Result;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref UNSAFE_FILE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
}

/// Component scores as shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportComponents {
    pub sanctions: f64,
    pub pep: f64,
    pub media: f64,
}

/// Canonical export for one screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub subject: String,
    pub dob: String,
    pub country: String,
    pub score: f64,
    pub components: ReportComponents,
    pub sanctions_matches: Vec<MatchCandidate>,
    pub media_hits: Vec<MediaArticle>,
    pub generated_at: DateTime<Utc>,
    /// Load date of the watchlist generation, else the report date
    #[serde(rename = "ofac_snapshot_date")]
    pub watchlist_snapshot_date: String,
}

impl ScreeningReport {
    pub fn from_result(result: &ScreeningResult) -> Self {
        let generated_at = Utc::now();
        let breakdown = &result.risk.breakdown;

        Self {
            subject: result.query_name.clone(),
            dob: result.query_dob.clone(),
            country: result.query_country.to_string(),
            score: result.risk.composite_score,
            components: ReportComponents {
                sanctions: breakdown.sanctions.score,
                pep: breakdown.pep.score,
                media: breakdown.media.score,
            },
            sanctions_matches: result.sanctions_matches.clone(),
            media_hits: result.media_results.clone(),
            generated_at,
            watchlist_snapshot_date: result
                .watchlist_snapshot
                .unwrap_or(generated_at)
                .format("%Y-%m-%d")
                .to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `audit_<subject>_<YYYYmmdd-HHMMSS>.json`
    pub fn file_name(&self) -> String {
        let subject = if self.subject.trim().is_empty() {
            "subject"
        } else {
            self.subject.as_str()
        };
        format!(
            "audit_{}_{}.json",
            UNSAFE_FILE_CHARS.replace_all(subject, "_"),
            self.generated_at.format("%Y%m%d-%H%M%S")
        )
    }
}
