//! Metrics collection for observability
//!
//! Each [`Metrics`] owns its registry, so several screeners can coexist in
//! one process.
//!
//! # Metrics
//!
//! - `screenings_total` - Screening calls that passed validation
//! - `screenings_rejected_total` - Calls rejected by validation
//! - `scoring_degraded_total` - Assessments produced by the fallback model
//! - `audit_write_failures_total` - Screenings whose audit append failed
//! - `watchlist_refresh_total` - Self-heal refresh attempts
//! - `screening_duration_seconds` - End-to-end screening latency

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Screenings that passed validation
    pub screenings_total: IntCounter,

    /// Screenings rejected by validation
    pub screenings_rejected: IntCounter,

    /// Assessments from the fallback model
    pub scoring_degraded: IntCounter,

    /// Failed audit appends
    pub audit_write_failures: IntCounter,

    /// Self-heal refresh attempts
    pub watchlist_refresh: IntCounter,

    /// Screening latency histogram
    pub screening_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("screenings_total", &self.screenings_total.get())
            .field("screenings_rejected", &self.screenings_rejected.get())
            .field("scoring_degraded", &self.scoring_degraded.get())
            .field("audit_write_failures", &self.audit_write_failures.get())
            .finish()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let counter = |name: &str, help: &str| -> prometheus::Result<IntCounter> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let screenings_total = counter("screenings_total", "Screening calls that passed validation")?;
        let screenings_rejected =
            counter("screenings_rejected_total", "Screening calls rejected by validation")?;
        let scoring_degraded =
            counter("scoring_degraded_total", "Assessments produced by the fallback model")?;
        let audit_write_failures =
            counter("audit_write_failures_total", "Screenings whose audit append failed")?;
        let watchlist_refresh =
            counter("watchlist_refresh_total", "Watchlist self-heal refresh attempts")?;

        let screening_duration = Histogram::with_opts(
            HistogramOpts::new("screening_duration_seconds", "End-to-end screening latency")
                .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 5.0]),
        )?;
        registry.register(Box::new(screening_duration.clone()))?;

        Ok(Self {
            screenings_total,
            screenings_rejected,
            scoring_degraded,
            audit_write_failures,
            watchlist_refresh,
            screening_duration,
            registry,
        })
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();

        a.screenings_total.inc();
        assert_eq!(a.screenings_total.get(), 1);
        assert_eq!(b.screenings_total.get(), 0);
    }

    #[test]
    fn test_render_lists_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.audit_write_failures.inc();
        metrics.screening_duration.observe(0.01);

        let text = metrics.render().unwrap();
        assert!(text.contains("audit_write_failures_total 1"));
        assert!(text.contains("screening_duration_seconds_count 1"));
    }
}
