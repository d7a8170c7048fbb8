//! Screening orchestrator
//!
//! A call moves through
//! `RECEIVED -> ENTITY_STORE_READY -> MATCHED -> MEDIA_SEARCHED -> SCORED -> AUDITED -> RETURNED`.
//! Only validation is fatal. A missing watchlist, a failed primary model and
//! a failed audit write all degrade the result and are reported in
//! `warnings`.

use crate::{
    config::Config,
    entity_store::EntityStore,
    feed::{BuiltinSampleFeed, CsvFileFeed, EntityFeed, HttpFeed},
    loader::WatchlistLoader,
    matching::{tokenize, MatchingEngine},
    media::{IngestStats, MediaIndex},
    metrics::Metrics,
    types::{RawArticle, ScreeningRequest, ScreeningResult},
    Result, ScreeningError,
};
use audit_ledger::{AuditLog, AuditRecord, AuditSummary, ExportFormat};
use chrono::Utc;
use risk_engine::{MediaSignal, RiskScorer, SanctionsSignal, ScoringInput};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Pipeline stage, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningStage {
    Received,
    EntityStoreReady,
    Matched,
    MediaSearched,
    Scored,
    Audited,
    Returned,
}

impl ScreeningStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningStage::Received => "RECEIVED",
            ScreeningStage::EntityStoreReady => "ENTITY_STORE_READY",
            ScreeningStage::Matched => "MATCHED",
            ScreeningStage::MediaSearched => "MEDIA_SEARCHED",
            ScreeningStage::Scored => "SCORED",
            ScreeningStage::Audited => "AUDITED",
            ScreeningStage::Returned => "RETURNED",
        }
    }
}

impl fmt::Display for ScreeningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screens subjects against the watchlist and the media index
pub struct Screener {
    matching: MatchingEngine,
    media: Arc<MediaIndex>,
    scorer: RiskScorer,
    audit: Arc<AuditLog>,
    config: Config,
    metrics: Metrics,
}

impl fmt::Debug for Screener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screener")
            .field("matching", &self.matching)
            .field("media_articles", &self.media.len())
            .field("audit", &self.audit)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl Screener {
    /// Build every component from configuration. Any failure here is a
    /// startup error.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let mut feeds: Vec<Arc<dyn EntityFeed>> = Vec::new();
        if let Some(path) = &config.watchlist.local_path {
            feeds.push(Arc::new(CsvFileFeed::new(path.clone())));
        }
        if !config.watchlist.urls.is_empty() {
            feeds.push(Arc::new(HttpFeed::new(
                config.watchlist.urls.clone(),
                Duration::from_secs(config.watchlist.http_timeout_secs),
                config.watchlist.min_columns,
            )?));
        }
        if config.watchlist.use_builtin_sample {
            feeds.push(Arc::new(BuiltinSampleFeed));
        }
        if feeds.is_empty() {
            warn!("No watchlist feeds configured; sanctions matching will report no data");
        }

        let loader = Arc::new(WatchlistLoader::new(
            Arc::new(EntityStore::new()),
            feeds,
            Duration::from_secs(config.watchlist.refresh_timeout_secs),
        ));
        let media = Arc::new(MediaIndex::new(config.media.clone()));
        let scorer = RiskScorer::new(config.risk.clone());
        let audit = Arc::new(AuditLog::open(config.audit.clone())?);

        Self::new(loader, media, scorer, audit, config)
    }

    /// Assemble a screener from prebuilt components
    pub fn new(
        loader: Arc<WatchlistLoader>,
        media: Arc<MediaIndex>,
        scorer: RiskScorer,
        audit: Arc<AuditLog>,
        config: Config,
    ) -> Result<Self> {
        let metrics = Metrics::new().map_err(|e| ScreeningError::Config(e.to_string()))?;

        info!(
            threshold = config.matching.threshold,
            top_n = config.matching.top_n,
            pep_jurisdictions = ?config.pep_jurisdictions,
            "Screener initialized"
        );

        Ok(Self {
            matching: MatchingEngine::new(loader),
            media,
            scorer,
            audit,
            config,
            metrics,
        })
    }

    /// Screen one subject
    pub async fn screen(&self, request: &ScreeningRequest) -> Result<ScreeningResult> {
        let name = request.name.trim();
        if tokenize(name).is_empty() {
            self.metrics.screenings_rejected.inc();
            warn!(query = %request.name, "Rejected screening request");
            return Err(ScreeningError::Validation(
                "subject name must contain at least one letter or digit".to_string(),
            ));
        }

        let timer = self.metrics.screening_duration.start_timer();
        self.metrics.screenings_total.inc();

        let screening_id = Uuid::now_v7();
        let mut warnings = Vec::new();
        info!(
            %screening_id,
            stage = %ScreeningStage::Received,
            query = name,
            country = %request.country,
            "Screening received"
        );

        let loader = self.matching.loader();
        if loader.store().is_empty() {
            self.metrics.watchlist_refresh.inc();
        }
        let (sanctions_matches, data_available) = match self
            .matching
            .find(
                name,
                &request.country,
                self.config.matching.top_n,
                self.config.matching.threshold,
            )
            .await
        {
            Ok(matches) => (matches, true),
            Err(e) => {
                warn!(%screening_id, error = %e, "Watchlist unavailable, continuing without sanctions data");
                warnings.push(e.to_string());
                (Vec::new(), false)
            }
        };
        let generation = loader.store().snapshot();
        debug!(
            %screening_id,
            stage = %ScreeningStage::EntityStoreReady,
            generation = generation.number,
            entities = generation.len(),
            data_available,
            "Watchlist checked"
        );
        debug!(
            %screening_id,
            stage = %ScreeningStage::Matched,
            matches = sanctions_matches.len(),
            "Sanctions matched"
        );

        let media_results = self.media.search_by_name(name);
        debug!(
            %screening_id,
            stage = %ScreeningStage::MediaSearched,
            articles = media_results.len(),
            "Media searched"
        );

        let pep_flag = request
            .country
            .as_only()
            .map_or(false, |country| self.config.is_pep_jurisdiction(country));

        let risk = self.scorer.score(&ScoringInput {
            sanctions: sanctions_matches.iter().map(SanctionsSignal::from).collect(),
            media: media_results.iter().map(MediaSignal::from).collect(),
            pep_flag,
            as_of: Utc::now(),
        });
        if risk.is_degraded() {
            self.metrics.scoring_degraded.inc();
            warnings.push(ScreeningError::ScoringDegraded(risk.explanation.clone()).to_string());
        }
        debug!(
            %screening_id,
            stage = %ScreeningStage::Scored,
            composite = risk.composite_score,
            level = %risk.risk_level,
            mode = ?risk.mode,
            "Risk scored"
        );

        let mut result = ScreeningResult {
            screening_id,
            query_name: name.to_string(),
            query_dob: request.dob.clone().unwrap_or_default(),
            query_country: request.country.clone(),
            sanctions_matches,
            media_results,
            pep_flag,
            risk,
            data_available,
            watchlist_snapshot: generation.loaded_at,
            timestamp: Utc::now(),
            audit_id: None,
            warnings,
        };

        match self.append_audit(&result) {
            Ok(id) => {
                result.audit_id = Some(id);
                debug!(%screening_id, stage = %ScreeningStage::Audited, audit_id = id, "Audited");
            }
            Err(e) => {
                error!(%screening_id, error = %e, "Audit write failed, returning unaudited result");
                self.metrics.audit_write_failures.inc();
                result.warnings.push(ScreeningError::AuditWrite(e.to_string()).to_string());
            }
        }

        timer.observe_duration();
        info!(
            %screening_id,
            stage = %ScreeningStage::Returned,
            matches = result.sanctions_matches.len(),
            articles = result.media_results.len(),
            score = result.risk.composite_score,
            level = %result.risk.risk_level,
            "Screening completed"
        );

        Ok(result)
    }

    fn append_audit(&self, result: &ScreeningResult) -> Result<u64> {
        let payload = serde_json::to_string(result)?;
        let record = AuditRecord {
            query_name: result.query_name.clone(),
            query_dob: result.query_dob.clone(),
            query_country: result.query_country.to_string(),
            sanctions_match_count: u32::try_from(result.sanctions_matches.len()).unwrap_or(u32::MAX),
            media_match_count: u32::try_from(result.media_results.len()).unwrap_or(u32::MAX),
            risk_level: result.risk.risk_level.as_str().to_string(),
            risk_score: result.risk.composite_score,
            payload,
        };
        Ok(self.audit.record(record)?)
    }

    /// Screen by name, optional date of birth and country ("Any" for none)
    pub async fn screen_name(
        &self,
        name: &str,
        dob: Option<&str>,
        country: &str,
    ) -> Result<ScreeningResult> {
        self.screen(&ScreeningRequest::new(name, dob, country)).await
    }

    /// Screen several subjects in order
    pub async fn screen_batch(&self, requests: &[ScreeningRequest]) -> Vec<Result<ScreeningResult>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.screen(request).await);
        }
        results
    }

    /// Reload the watchlist from the configured feeds
    pub async fn refresh_watchlist(&self) -> Result<usize> {
        self.metrics.watchlist_refresh.inc();
        self.matching.loader().refresh().await
    }

    /// Add one batch of feed items to the media index
    pub fn ingest_media(&self, source: &str, items: Vec<RawArticle>) -> IngestStats {
        self.media.ingest_feed(source, items)
    }

    /// Most recent audit entries first
    pub fn audit_history(&self, limit: usize) -> Result<Vec<AuditSummary>> {
        Ok(self.audit.list(limit)?)
    }

    /// Whole audit trail as JSON or CSV
    pub fn export_audit_log(&self, format: ExportFormat) -> Result<String> {
        Ok(self.audit.export(format)?)
    }

    /// Apply the configured audit retention
    pub fn purge_audit(&self) -> Result<usize> {
        Ok(self.audit.purge_expired()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn media(&self) -> &Arc<MediaIndex> {
        &self.media
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn loader(&self) -> &Arc<WatchlistLoader> {
        self.matching.loader()
    }
}
