//! Core types for risk engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl RiskLevel {
    /// Upper-case label used in audit records and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adverse-media category assigned by keyword tagging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    /// Sanctions, embargoes, blocked parties
    Sanctions,
    /// Politically exposed persons
    Pep,
    /// Fraud and financial schemes
    Fraud,
    /// Arrests, charges, convictions
    Crime,
    /// No category keyword matched
    Other,
}

impl MediaCategory {
    /// All categories in tagging order
    pub const ALL: [MediaCategory; 5] = [
        MediaCategory::Sanctions,
        MediaCategory::Pep,
        MediaCategory::Fraud,
        MediaCategory::Crime,
        MediaCategory::Other,
    ];

    /// Lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Sanctions => "sanctions",
            MediaCategory::Pep => "pep",
            MediaCategory::Fraud => "fraud",
            MediaCategory::Crime => "crime",
            MediaCategory::Other => "other",
        }
    }

    /// Categories that raise the base media score
    pub fn is_high_risk(&self) -> bool {
        matches!(
            self,
            MediaCategory::Sanctions | MediaCategory::Crime | MediaCategory::Fraud
        )
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sanctions evidence: one ranked watchlist candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanctionsSignal {
    /// Match score (0-100)
    pub match_score: u8,
}

/// Adverse-media evidence: one article mentioning the subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSignal {
    /// Category tags of the article
    pub tags: Vec<MediaCategory>,

    /// Publication instant, if it could be parsed
    pub published_at: Option<DateTime<Utc>>,
}

impl MediaSignal {
    /// Base contribution before recency decay
    pub fn base_score(&self) -> f64 {
        if self.tags.iter().any(MediaCategory::is_high_risk) {
            50.0
        } else {
            30.0
        }
    }
}

/// Everything a scoring model needs for one subject
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringInput {
    /// Sanctions candidates
    pub sanctions: Vec<SanctionsSignal>,

    /// Adverse-media hits
    pub media: Vec<MediaSignal>,

    /// Jurisdiction-derived PEP flag
    pub pep_flag: bool,

    /// Reference instant for recency decay
    pub as_of: DateTime<Utc>,
}

/// One weighted component of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    /// Weight applied to the score
    pub weight: f64,

    /// Component score (0-100)
    pub score: f64,
}

impl ComponentScore {
    /// Weighted contribution to the composite
    pub fn contribution(&self) -> f64 {
        self.weight * self.score
    }
}

/// Per-component breakdown of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    /// Sanctions match component
    pub sanctions: ComponentScore,

    /// Adverse media component
    pub media: ComponentScore,

    /// PEP component
    pub pep: ComponentScore,
}

impl RiskBreakdown {
    /// Sum of weighted contributions, unclamped
    pub fn weighted_sum(&self) -> f64 {
        self.sanctions.contribution() + self.media.contribution() + self.pep.contribution()
    }
}

/// Which scoring tier produced an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Weighted model with recency decay
    Primary,
    /// Simplified fallback model
    Degraded,
}

/// Risk assessment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Composite score (0.0-100.0)
    pub composite_score: f64,

    /// Risk level
    pub risk_level: RiskLevel,

    /// Component breakdown
    pub breakdown: RiskBreakdown,

    /// Scoring tier
    pub mode: ScoringMode,

    /// Human-readable explanation
    pub explanation: String,

    /// Assessment timestamp
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// True when produced by the fallback model
    pub fn is_degraded(&self) -> bool {
        self.mode == ScoringMode::Degraded
    }
}
