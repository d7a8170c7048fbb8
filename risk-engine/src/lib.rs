//! Risk Engine for subject screening
//!
//! Combines sanctions matches, adverse media and a PEP flag into an
//! explainable composite score.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod decay;
pub mod error;
pub mod scoring;
pub mod types;

pub use config::{RiskConfig, RiskThresholds, RiskWeights};
pub use decay::recency_decay;
pub use error::{Error, Result};
pub use scoring::{RiskScorer, ScoringModel, SimplifiedModel, WeightedModel};
pub use types::*;
