//! Watchlist screening service
//!
//! Screens a subject (name, optional date of birth, optional country) against
//! a sanctions watchlist and an adverse-media index, scores the result with
//! an explainable composite model, and records every query in an
//! append-only audit trail.
//!
//! # Example
//!
//! ```no_run
//! use screening_service::{Config, Screener};
//!
//! # async fn run() -> screening_service::Result<()> {
//! let screener = Screener::from_config(Config::default())?;
//! let result = screener.screen_name("Putin Vladimir", None, "Russia").await?;
//! println!("{} -> {}", result.query_name, result.risk.risk_level);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod entity_store;
pub mod error;
pub mod feed;
pub mod loader;
pub mod matching;
pub mod media;
pub mod metrics;
pub mod normalize;
pub mod report;
pub mod screening;
pub mod types;

// Re-exports
pub use config::Config;
pub use entity_store::{EntityStore, Generation};
pub use error::{Result, ScreeningError};
pub use feed::{BuiltinSampleFeed, CsvFileFeed, EntityFeed, HttpFeed};
pub use loader::WatchlistLoader;
pub use matching::MatchingEngine;
pub use media::{IngestStats, MediaIndex};
pub use metrics::Metrics;
pub use report::ScreeningReport;
pub use screening::{Screener, ScreeningStage};
pub use types::*;

pub use audit_ledger::ExportFormat;
pub use risk_engine::{MediaCategory, RiskAssessment, RiskLevel, ScoringMode};
