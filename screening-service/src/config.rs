//! Configuration for the screening service

use crate::{Result, ScreeningError};
use audit_ledger::AuditConfig;
use risk_engine::RiskConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Public OFAC SDN endpoints, tried in order
pub const DEFAULT_SDN_URLS: [&str; 4] = [
    "https://files.ofac.treasury.gov/sanctions/SDN.csv",
    "https://sanctionslist.ofac.treasury.gov/SDN.csv",
    "https://ofac.treasury.gov/media/57671/download?inline",
    "https://www.treasury.gov/ofac/downloads/sdn.csv",
];

/// Screening service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name matching
    pub matching: MatchingConfig,

    /// Risk scoring
    pub risk: RiskConfig,

    /// Audit trail
    pub audit: AuditConfig,

    /// Watchlist sources
    pub watchlist: WatchlistConfig,

    /// Adverse media index
    pub media: MediaConfig,

    /// Countries whose subjects are flagged as politically exposed
    pub pep_jurisdictions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            risk: RiskConfig::default(),
            audit: AuditConfig::default(),
            watchlist: WatchlistConfig::default(),
            media: MediaConfig::default(),
            pep_jurisdictions: vec!["USA".to_string(), "UK".to_string(), "CANADA".to_string()],
        }
    }
}

/// Name matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum fuzzy score (0-100) a candidate needs to be reported
    pub threshold: u8,

    /// Maximum number of candidates returned
    pub top_n: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 80,
            top_n: 10,
        }
    }
}

/// Watchlist source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    /// Local SDN CSV, tried before the network
    pub local_path: Option<PathBuf>,

    /// Remote SDN CSV endpoints
    pub urls: Vec<String>,

    /// Fall back to the bundled five-row sample
    pub use_builtin_sample: bool,

    /// Upper bound for one self-heal refresh (seconds)
    pub refresh_timeout_secs: u64,

    /// Per-request HTTP timeout (seconds)
    pub http_timeout_secs: u64,

    /// Remote tables with fewer columns are rejected
    pub min_columns: usize,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            local_path: None,
            urls: DEFAULT_SDN_URLS.iter().map(|u| u.to_string()).collect(),
            use_builtin_sample: true,
            refresh_timeout_secs: 30,
            http_timeout_secs: 5,
            min_columns: 4,
        }
    }
}

/// Longest accepted recent-articles window (100 years)
pub const MAX_RECENT_WINDOW_HOURS: i64 = 24 * 365 * 100;

/// Adverse media configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Maximum articles returned by a name search
    pub search_limit: usize,

    /// Maximum items ingested per feed batch
    pub feed_item_limit: usize,

    /// Default window for the recent-articles listing (hours)
    pub recent_window_hours: i64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            search_limit: 20,
            feed_item_limit: 50,
            recent_window_hours: 24,
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ScreeningError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Defaults overridden by `SCREENING_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `SCREENING_*` environment overrides on top of this config
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("SCREENING_MATCH_THRESHOLD") {
            self.matching.threshold = parse_var("SCREENING_MATCH_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("SCREENING_TOP_N") {
            self.matching.top_n = parse_var("SCREENING_TOP_N", &v)?;
        }
        if let Some(v) = lookup("SCREENING_HIGH_RISK_THRESHOLD") {
            self.risk.thresholds.high = parse_var("SCREENING_HIGH_RISK_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("SCREENING_MEDIUM_RISK_THRESHOLD") {
            self.risk.thresholds.medium = parse_var("SCREENING_MEDIUM_RISK_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("SCREENING_SANCTIONS_WEIGHT") {
            self.risk.weights.sanctions = parse_var("SCREENING_SANCTIONS_WEIGHT", &v)?;
        }
        if let Some(v) = lookup("SCREENING_MEDIA_WEIGHT") {
            self.risk.weights.media = parse_var("SCREENING_MEDIA_WEIGHT", &v)?;
        }
        if let Some(v) = lookup("SCREENING_PEP_WEIGHT") {
            self.risk.weights.pep = parse_var("SCREENING_PEP_WEIGHT", &v)?;
        }
        if let Some(v) = lookup("SCREENING_RECENCY_WINDOW_DAYS") {
            self.risk.recency_window_days = parse_var("SCREENING_RECENCY_WINDOW_DAYS", &v)?;
        }
        if let Some(v) = lookup("SCREENING_AUDIT_RETENTION_DAYS") {
            self.audit.retention_days = parse_var("SCREENING_AUDIT_RETENTION_DAYS", &v)?;
        }
        if let Some(v) = lookup("SCREENING_AUDIT_DIR") {
            self.audit.data_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SCREENING_SDN_PATH") {
            self.watchlist.local_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SCREENING_SDN_URLS") {
            self.watchlist.urls = split_list(&v);
        }
        if let Some(v) = lookup("SCREENING_USE_BUILTIN_SAMPLE") {
            self.watchlist.use_builtin_sample = parse_var("SCREENING_USE_BUILTIN_SAMPLE", &v)?;
        }
        if let Some(v) = lookup("SCREENING_REFRESH_TIMEOUT_SECS") {
            self.watchlist.refresh_timeout_secs = parse_var("SCREENING_REFRESH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("SCREENING_PEP_JURISDICTIONS") {
            self.pep_jurisdictions = split_list(&v);
        }
        Ok(())
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.matching.threshold > 100 {
            return Err(ScreeningError::Config(format!(
                "matching threshold must be within 0-100, got {}",
                self.matching.threshold
            )));
        }
        if self.matching.top_n == 0 {
            return Err(ScreeningError::Config("matching top_n must be at least 1".to_string()));
        }
        if self.watchlist.refresh_timeout_secs == 0 {
            return Err(ScreeningError::Config(
                "watchlist refresh_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.media.search_limit == 0 || self.media.feed_item_limit == 0 {
            return Err(ScreeningError::Config("media limits must be at least 1".to_string()));
        }
        if !(1..=MAX_RECENT_WINDOW_HOURS).contains(&self.media.recent_window_hours) {
            return Err(ScreeningError::Config(format!(
                "media recent_window_hours must be within 1-{}, got {}",
                MAX_RECENT_WINDOW_HOURS, self.media.recent_window_hours
            )));
        }
        self.audit.validate()?;
        self.risk.validate()?;
        Ok(())
    }

    /// Case-insensitive membership in the PEP jurisdiction list
    pub fn is_pep_jurisdiction(&self, country: &str) -> bool {
        let country = country.trim();
        !country.is_empty()
            && self
                .pep_jurisdictions
                .iter()
                .any(|j| j.trim().eq_ignore_ascii_case(country))
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ScreeningError::Config(format!("{}={:?}: {}", key, value, e)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.matching.threshold, 80);
        assert_eq!(config.matching.top_n, 10);
        assert_eq!(config.audit.retention_days, 365);
        assert_eq!(config.watchlist.urls.len(), 4);
        assert!(config.watchlist.use_builtin_sample);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            pep_jurisdictions = ["FRANCE"]

            [matching]
            threshold = 70

            [risk.thresholds]
            high = 80.0
            medium = 50.0
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.threshold, 70);
        assert_eq!(config.matching.top_n, 10);
        assert_eq!(config.risk.thresholds.high, 80.0);
        assert_eq!(config.risk.recency_window_days, 30);
        assert_eq!(config.pep_jurisdictions, vec!["FRANCE".to_string()]);
    }

    #[test]
    fn test_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("SCREENING_MATCH_THRESHOLD", "65"),
            ("SCREENING_PEP_JURISDICTIONS", "usa, germany"),
            ("SCREENING_USE_BUILTIN_SAMPLE", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.matching.threshold, 65);
        assert_eq!(config.pep_jurisdictions, vec!["usa", "germany"]);
        assert!(!config.watchlist.use_builtin_sample);
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "SCREENING_TOP_N").then(|| "many".to_string())
        });
        assert!(matches!(result, Err(ScreeningError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.matching.threshold = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_retention_and_media_window() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| {
                (key == "SCREENING_AUDIT_RETENTION_DAYS").then(|| u32::MAX.to_string())
            })
            .unwrap();
        assert!(matches!(config.validate(), Err(ScreeningError::Audit(_))));

        let mut config = Config::default();
        config.media.recent_window_hours = i64::MAX;
        assert!(matches!(config.validate(), Err(ScreeningError::Config(_))));

        config.media.recent_window_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pep_jurisdiction_lookup() {
        let config = Config::default();
        assert!(config.is_pep_jurisdiction("usa"));
        assert!(config.is_pep_jurisdiction("Canada"));
        assert!(!config.is_pep_jurisdiction("RUSSIA"));
        assert!(!config.is_pep_jurisdiction(""));
    }
}
