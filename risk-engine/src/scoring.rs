//! Risk scoring engine
//!
//! Scoring is a two-tier strategy. The [`WeightedModel`] is the primary
//! formula; when it fails the [`RiskScorer`] falls back to the
//! [`SimplifiedModel`] and marks the assessment as degraded.

use crate::{
    recency_decay, ComponentScore, Error, Result, RiskAssessment, RiskBreakdown, RiskConfig,
    RiskLevel, RiskThresholds, ScoringInput, ScoringMode,
};
use tracing::{debug, warn};

/// A scoring formula
pub trait ScoringModel: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &'static str;

    /// Score one subject
    fn assess(&self, input: &ScoringInput) -> Result<RiskAssessment>;
}

/// Weighted sanctions/media/PEP formula with recency decay
#[derive(Debug, Clone)]
pub struct WeightedModel {
    config: RiskConfig,
}

impl WeightedModel {
    /// Create the model
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Best match score, or 0 without matches
    pub fn sanctions_score(input: &ScoringInput) -> f64 {
        input
            .sanctions
            .iter()
            .map(|s| f64::from(s.match_score))
            .fold(0.0, f64::max)
    }

    /// Average decayed media contribution, capped at 100
    pub fn media_score(&self, input: &ScoringInput) -> f64 {
        if input.media.is_empty() {
            return 0.0;
        }

        let total: f64 = input
            .media
            .iter()
            .map(|item| {
                item.base_score()
                    * recency_decay(item.published_at, input.as_of, self.config.recency_window_days)
            })
            .sum();

        (total / input.media.len() as f64).min(100.0)
    }
}

impl ScoringModel for WeightedModel {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn assess(&self, input: &ScoringInput) -> Result<RiskAssessment> {
        self.config.validate()?;

        let weights = self.config.weights;
        let pep_score = if input.pep_flag { self.config.pep_score } else { 0.0 };

        let breakdown = RiskBreakdown {
            sanctions: ComponentScore {
                weight: weights.sanctions,
                score: round2(Self::sanctions_score(input)),
            },
            media: ComponentScore {
                weight: weights.media,
                score: round2(self.media_score(input)),
            },
            pep: ComponentScore {
                weight: weights.pep,
                score: round2(pep_score),
            },
        };

        let raw = breakdown.weighted_sum();
        if !raw.is_finite() {
            return Err(Error::Calculation(format!(
                "composite score is not finite: {}",
                raw
            )));
        }

        let composite_score = round2(raw.clamp(0.0, 100.0));
        let risk_level = self.config.thresholds.level_for(composite_score);

        Ok(RiskAssessment {
            composite_score,
            risk_level,
            breakdown,
            mode: ScoringMode::Primary,
            explanation: explain(risk_level, composite_score),
            assessed_at: input.as_of,
        })
    }
}

/// Fallback formula using only match scores, article count and the PEP flag
#[derive(Debug, Clone)]
pub struct SimplifiedModel {
    thresholds: RiskThresholds,
}

impl SimplifiedModel {
    /// Sanctions weight
    pub const SANCTIONS_WEIGHT: f64 = 0.7;
    /// Media weight
    pub const MEDIA_WEIGHT: f64 = 0.2;
    /// PEP weight
    pub const PEP_WEIGHT: f64 = 0.1;

    /// Create the model
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Score without any fallible step
    pub fn assess_infallible(&self, input: &ScoringInput) -> RiskAssessment {
        let article_count = input.media.len().min(5) as f64;

        let breakdown = RiskBreakdown {
            sanctions: ComponentScore {
                weight: Self::SANCTIONS_WEIGHT,
                score: WeightedModel::sanctions_score(input),
            },
            media: ComponentScore {
                weight: Self::MEDIA_WEIGHT,
                score: article_count * 20.0,
            },
            pep: ComponentScore {
                weight: Self::PEP_WEIGHT,
                score: if input.pep_flag { 100.0 } else { 0.0 },
            },
        };

        let composite_score = round2(breakdown.weighted_sum().clamp(0.0, 100.0));
        let risk_level = self.thresholds.level_for(composite_score);

        RiskAssessment {
            composite_score,
            risk_level,
            breakdown,
            mode: ScoringMode::Degraded,
            explanation: format!(
                "[degraded scoring] {}",
                explain(risk_level, composite_score)
            ),
            assessed_at: input.as_of,
        }
    }
}

impl ScoringModel for SimplifiedModel {
    fn name(&self) -> &'static str {
        "simplified"
    }

    fn assess(&self, input: &ScoringInput) -> Result<RiskAssessment> {
        Ok(self.assess_infallible(input))
    }
}

/// Risk scorer: primary model with a simplified fallback
pub struct RiskScorer {
    primary: Box<dyn ScoringModel>,
    fallback: SimplifiedModel,
}

impl RiskScorer {
    /// Create new risk scorer with the weighted model as primary
    pub fn new(config: RiskConfig) -> Self {
        if (config.weights.total() - 1.0).abs() > 1e-6 {
            warn!(
                total = config.weights.total(),
                "Risk weights do not sum to 1.0; composite scores are still clamped"
            );
        }

        let fallback = SimplifiedModel::new(config.thresholds);
        Self {
            primary: Box::new(WeightedModel::new(config)),
            fallback,
        }
    }

    /// Create a scorer around a custom primary model
    pub fn with_primary(primary: Box<dyn ScoringModel>, thresholds: RiskThresholds) -> Self {
        Self {
            primary,
            fallback: SimplifiedModel::new(thresholds),
        }
    }

    /// Score a subject. Never fails: a primary failure yields a degraded assessment.
    pub fn score(&self, input: &ScoringInput) -> RiskAssessment {
        match self.primary.assess(input) {
            Ok(assessment) => {
                debug!(
                    model = self.primary.name(),
                    composite = assessment.composite_score,
                    level = %assessment.risk_level,
                    "Risk assessed"
                );
                assessment
            }
            Err(e) => {
                warn!(
                    model = self.primary.name(),
                    error = %e,
                    "Primary scoring failed, using simplified model"
                );
                self.fallback.assess_infallible(input)
            }
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

/// Human-readable summary for a level and score
pub fn explain(level: RiskLevel, score: f64) -> String {
    match level {
        RiskLevel::High => format!(
            "High-risk profile (score: {}/100). Immediate escalation recommended.",
            score
        ),
        RiskLevel::Medium => format!(
            "Medium-risk profile (score: {}/100). Further investigation advised.",
            score
        ),
        RiskLevel::Low => format!("Low-risk profile (score: {}/100). Screening completed.", score),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MediaCategory, MediaSignal, RiskWeights, SanctionsSignal};
    use chrono::{Duration, Utc};

    fn input(scores: &[u8], media: Vec<MediaSignal>, pep_flag: bool) -> ScoringInput {
        ScoringInput {
            sanctions: scores
                .iter()
                .map(|&match_score| SanctionsSignal { match_score })
                .collect(),
            media,
            pep_flag,
            as_of: Utc::now(),
        }
    }

    struct FailingModel;

    impl ScoringModel for FailingModel {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn assess(&self, _input: &ScoringInput) -> Result<RiskAssessment> {
            Err(Error::Calculation("boom".to_string()))
        }
    }

    #[test]
    fn test_perfect_match_alone_is_medium() {
        let scorer = RiskScorer::default();
        let assessment = scorer.score(&input(&[100], vec![], false));

        assert_eq!(assessment.composite_score, 60.0);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.mode, ScoringMode::Primary);
        assert_eq!(assessment.breakdown.sanctions.score, 100.0);
        assert_eq!(assessment.breakdown.media.score, 0.0);
        assert_eq!(assessment.breakdown.pep.score, 0.0);
    }

    #[test]
    fn test_best_match_is_used() {
        let scorer = RiskScorer::default();
        let assessment = scorer.score(&input(&[72, 91, 80], vec![], false));
        assert_eq!(assessment.breakdown.sanctions.score, 91.0);
    }

    #[test]
    fn test_no_signals_is_low() {
        let scorer = RiskScorer::default();
        let assessment = scorer.score(&input(&[], vec![], false));

        assert_eq!(assessment.composite_score, 0.0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.explanation.starts_with("Low-risk profile"));
    }

    #[test]
    fn test_media_and_pep_push_to_high() {
        let scorer = RiskScorer::default();
        let now = Utc::now();
        let media = vec![MediaSignal {
            tags: vec![MediaCategory::Sanctions],
            published_at: Some(now),
        }];
        let mut scoring_input = input(&[100], media, true);
        scoring_input.as_of = now;

        let assessment = scorer.score(&scoring_input);

        // 100*0.6 + 50*0.3 + 20*0.1
        assert_eq!(assessment.composite_score, 77.0);
        assert_eq!(assessment.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_media_average_uses_base_and_decay() {
        let now = Utc::now();
        let model = WeightedModel::new(RiskConfig::default());
        let scoring_input = ScoringInput {
            sanctions: vec![],
            media: vec![
                MediaSignal {
                    tags: vec![MediaCategory::Fraud],
                    published_at: Some(now),
                },
                MediaSignal {
                    tags: vec![MediaCategory::Other],
                    published_at: None,
                },
            ],
            pep_flag: false,
            as_of: now,
        };

        // (50*1.0 + 30*0.5) / 2
        assert!((model.media_score(&scoring_input) - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_old_media_decays_to_floor() {
        let now = Utc::now();
        let model = WeightedModel::new(RiskConfig::default());
        let scoring_input = ScoringInput {
            sanctions: vec![],
            media: vec![MediaSignal {
                tags: vec![MediaCategory::Pep],
                published_at: Some(now - Duration::days(365)),
            }],
            pep_flag: false,
            as_of: now,
        };

        assert!((model.media_score(&scoring_input) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_failing_primary_degrades() {
        let scorer = RiskScorer::with_primary(Box::new(FailingModel), RiskThresholds::default());
        let assessment = scorer.score(&input(&[100], vec![], true));

        assert!(assessment.is_degraded());
        assert!(assessment.explanation.starts_with("[degraded scoring]"));
        // 100*0.7 + 0*0.2 + 100*0.1
        assert_eq!(assessment.composite_score, 80.0);
        assert_eq!(assessment.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_invalid_weights_degrade() {
        let config = RiskConfig {
            weights: RiskWeights {
                sanctions: f64::NAN,
                media: 0.3,
                pep: 0.1,
            },
            ..RiskConfig::default()
        };
        let scorer = RiskScorer::new(config);
        let now = Utc::now();
        let media = (0..7)
            .map(|_| MediaSignal {
                tags: vec![MediaCategory::Other],
                published_at: Some(now),
            })
            .collect();

        let assessment = scorer.score(&input(&[50], media, false));

        assert!(assessment.is_degraded());
        // 50*0.7 + min(7,5)*20*0.2
        assert_eq!(assessment.composite_score, 55.0);
        assert_eq!(assessment.breakdown.media.score, 100.0);
    }

    #[test]
    fn test_breakdown_serializes_with_component_keys() {
        let assessment = RiskScorer::default().score(&input(&[80], vec![], false));
        let json = serde_json::to_value(&assessment).unwrap();

        assert_eq!(json["risk_level"], "MEDIUM");
        assert_eq!(json["breakdown"]["sanctions"]["weight"], 0.6);
        assert_eq!(json["breakdown"]["sanctions"]["score"], 80.0);
        assert!(json["breakdown"]["media"].is_object());
        assert!(json["breakdown"]["pep"].is_object());
    }
}
