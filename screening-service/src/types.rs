use chrono::{DateTime, Utc};
use risk_engine::{MediaCategory, MediaSignal, RiskAssessment, SanctionsSignal};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Individual,
    Entity,
    Vessel,
    Aircraft,
    Unknown, // OFAC uses "-0-" for missing values
}

impl EntityType {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "individual" => EntityType::Individual,
            "entity" => EntityType::Entity,
            "vessel" => EntityType::Vessel,
            "aircraft" => EntityType::Aircraft,
            _ => EntityType::Unknown,
        }
    }
}

/// One watchlisted person or organization. `name` is never empty once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntity {
    pub name: String,
    pub program: String,
    pub entity_type: EntityType,
    pub dob: String,
    pub country: String,
    pub citizenship: String,
    pub nationality: String,
    pub remarks: String,
}

/// Tabular watchlist feed output with arbitrary column naming
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Country filter of a query. "Any" (any case) or blank means unfiltered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CountryFilter {
    Any,
    Only(String),
}

impl CountryFilter {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            CountryFilter::Any
        } else {
            CountryFilter::Only(trimmed.to_uppercase())
        }
    }

    /// Case-insensitive equality against an entity's country
    pub fn matches(&self, country: &str) -> bool {
        match self {
            CountryFilter::Any => true,
            CountryFilter::Only(wanted) => country.trim().to_uppercase() == *wanted,
        }
    }

    pub fn as_only(&self) -> Option<&str> {
        match self {
            CountryFilter::Any => None,
            CountryFilter::Only(country) => Some(country),
        }
    }
}

impl Default for CountryFilter {
    fn default() -> Self {
        CountryFilter::Any
    }
}

impl fmt::Display for CountryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryFilter::Any => f.write_str("Any"),
            CountryFilter::Only(country) => f.write_str(country),
        }
    }
}

impl From<String> for CountryFilter {
    fn from(value: String) -> Self {
        CountryFilter::parse(&value)
    }
}

impl From<CountryFilter> for String {
    fn from(filter: CountryFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    TokenAnd,  // every query token present, fuzzy ranked
    TokenOr,   // any query token present, fuzzy ranked
    Substring, // permissive floor, no similarity scoring
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub entity_name: String,
    pub country: String,
    pub program: String,
    pub match_score: u8, // 0-100
    pub stage: MatchStage,
    pub explanation: String,
}

impl MatchCandidate {
    /// Substring fallback hits carry a literal 100 but are informational only
    pub fn is_high_confidence(&self) -> bool {
        self.stage != MatchStage::Substring
    }
}

impl From<&MatchCandidate> for SanctionsSignal {
    fn from(candidate: &MatchCandidate) -> Self {
        SanctionsSignal {
            match_score: candidate.match_score,
        }
    }
}

/// Media feed item before tagging
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawArticle {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub published: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaArticle {
    pub id: String,
    pub source: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub ingested_at: DateTime<Utc>,
    pub tags: Vec<MediaCategory>,
}

impl From<&MediaArticle> for MediaSignal {
    fn from(article: &MediaArticle) -> Self {
        MediaSignal {
            tags: article.tags.clone(),
            published_at: article.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSummary {
    pub id: String,
    pub source: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<MediaCategory>,
}

impl From<&MediaArticle> for MediaSummary {
    fn from(article: &MediaArticle) -> Self {
        MediaSummary {
            id: article.id.clone(),
            source: article.source.clone(),
            title: article.title.clone(),
            published_at: article.published_at,
            tags: article.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningRequest {
    pub name: String,
    pub dob: Option<String>,
    #[serde(default)]
    pub country: CountryFilter,
}

impl ScreeningRequest {
    pub fn new(name: impl Into<String>, dob: Option<&str>, country: &str) -> Self {
        Self {
            name: name.into(),
            dob: dob.map(str::to_string),
            country: CountryFilter::parse(country),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningResult {
    pub screening_id: Uuid,
    pub query_name: String,
    pub query_dob: String,
    pub query_country: CountryFilter,
    pub sanctions_matches: Vec<MatchCandidate>,
    pub media_results: Vec<MediaArticle>,
    pub pep_flag: bool,
    pub risk: RiskAssessment,
    pub data_available: bool, // false when the watchlist stayed empty after self-heal
    pub watchlist_snapshot: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
