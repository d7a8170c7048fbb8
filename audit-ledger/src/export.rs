//! Compliance export of the audit trail

use crate::{error::Result, types::AuditEntry, types::AuditSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON array of entries with the embedded result
    Json,
    /// CSV of entry summaries (no result payload)
    Csv,
}

impl ExportFormat {
    /// File extension
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// MIME type
    pub fn mime_type(&self) -> &str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(crate::Error::Config(format!("unknown export format: {}", other))),
        }
    }
}

#[derive(Serialize)]
struct ExportedEntry<'a> {
    id: u64,
    query_name: &'a str,
    query_dob: &'a str,
    query_country: &'a str,
    sanctions_matches: u32,
    media_matches: u32,
    risk_level: &'a str,
    risk_score: f64,
    query_timestamp: DateTime<Utc>,
    digest: &'a str,
    result: serde_json::Value,
}

impl<'a> From<&'a AuditEntry> for ExportedEntry<'a> {
    fn from(entry: &'a AuditEntry) -> Self {
        // A payload that is not JSON is exported verbatim as a string
        let result = serde_json::from_str(&entry.payload)
            .unwrap_or_else(|_| serde_json::Value::String(entry.payload.clone()));

        Self {
            id: entry.id,
            query_name: &entry.query_name,
            query_dob: &entry.query_dob,
            query_country: &entry.query_country,
            sanctions_matches: entry.sanctions_match_count,
            media_matches: entry.media_match_count,
            risk_level: &entry.risk_level,
            risk_score: entry.risk_score,
            query_timestamp: entry.timestamp,
            digest: &entry.digest,
            result,
        }
    }
}

pub(crate) fn render(entries: &[AuditEntry], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => {
            let exported: Vec<ExportedEntry<'_>> = entries.iter().map(ExportedEntry::from).collect();
            Ok(serde_json::to_string_pretty(&exported)?)
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for entry in entries {
                writer.serialize(AuditSummary::from(entry))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| crate::Error::Serialization(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| crate::Error::Serialization(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuditLog, AuditRecord};

    fn log_with_two() -> AuditLog {
        let log = AuditLog::in_memory();
        for (name, payload) in [("alpha", r#"{"score":12.5}"#), ("beta", "not json")] {
            log.record(AuditRecord {
                query_name: name.to_string(),
                query_dob: "1970-01-01".to_string(),
                query_country: "Any".to_string(),
                sanctions_match_count: 0,
                media_match_count: 1,
                risk_level: "LOW".to_string(),
                risk_score: 12.5,
                payload: payload.to_string(),
            })
            .unwrap();
        }
        log
    }

    #[test]
    fn test_json_export_embeds_result() {
        let exported = log_with_two().export(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["query_name"], "beta");
        assert_eq!(items[0]["result"], "not json");
        assert_eq!(items[1]["result"]["score"], 12.5);
        assert_eq!(items[1]["media_matches"], 1);
    }

    #[test]
    fn test_csv_export_has_header_and_rows() {
        let exported = log_with_two().export(ExportFormat::Csv).unwrap();
        let lines: Vec<_> = exported.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,query_name,query_dob"));
        assert!(lines[1].starts_with("2,beta"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
