//! Scoring configuration

use crate::{Error, Result, RiskLevel};
use serde::{Deserialize, Serialize};

/// Component weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Sanctions match weight
    pub sanctions: f64,
    /// Adverse media weight
    pub media: f64,
    /// PEP weight
    pub pep: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            sanctions: 0.6,
            media: 0.3,
            pep: 0.1,
        }
    }
}

impl RiskWeights {
    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.sanctions + self.media + self.pep
    }

    fn check(&self) -> Result<()> {
        for (name, weight) in [
            ("sanctions", self.sanctions),
            ("media", self.media),
            ("pep", self.pep),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

/// Risk level boundaries (inclusive lower bounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Composite score at or above which the subject is HIGH
    pub high: f64,
    /// Composite score at or above which the subject is MEDIUM
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 75.0,
            medium: 40.0,
        }
    }
}

impl RiskThresholds {
    /// Map a composite score to a level
    pub fn level_for(&self, score: f64) -> RiskLevel {
        if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Risk scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Component weights
    pub weights: RiskWeights,

    /// Level boundaries
    pub thresholds: RiskThresholds,

    /// Days after which an article reaches the minimum decay
    pub recency_window_days: u32,

    /// Score assigned to the PEP component when flagged
    pub pep_score: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            thresholds: RiskThresholds::default(),
            recency_window_days: 30,
            pep_score: 20.0,
        }
    }
}

impl RiskConfig {
    /// Reject configurations the weighted model cannot score with
    pub fn validate(&self) -> Result<()> {
        self.weights.check()?;

        let RiskThresholds { high, medium } = self.thresholds;
        if !(0.0..=100.0).contains(&medium) || !(0.0..=100.0).contains(&high) || medium > high {
            return Err(Error::InvalidConfig(format!(
                "thresholds must satisfy 0 <= medium <= high <= 100 (medium={}, high={})",
                medium, high
            )));
        }

        if self.recency_window_days == 0 {
            return Err(Error::InvalidConfig(
                "recency_window_days must be at least 1".to_string(),
            ));
        }

        if !self.pep_score.is_finite() || !(0.0..=100.0).contains(&self.pep_score) {
            return Err(Error::InvalidConfig(format!(
                "pep_score must be within 0-100, got {}",
                self.pep_score
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RiskConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds_map_levels() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.level_for(75.0), RiskLevel::High);
        assert_eq!(thresholds.level_for(74.99), RiskLevel::Medium);
        assert_eq!(thresholds.level_for(40.0), RiskLevel::Medium);
        assert_eq!(thresholds.level_for(39.9), RiskLevel::Low);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let config = RiskConfig {
            thresholds: RiskThresholds {
                high: 30.0,
                medium: 60.0,
            },
            ..RiskConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_weight() {
        let mut config = RiskConfig::default();
        config.weights.media = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
