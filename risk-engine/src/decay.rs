//! Recency decay for adverse media

use chrono::{DateTime, Utc};

/// Floor applied to old articles
pub const MIN_DECAY: f64 = 0.1;

/// Decay used when the publication date is unknown
pub const UNKNOWN_DATE_DECAY: f64 = 0.5;

/// Multiplicative factor in `[0.1, 1.0]` that shrinks as an article ages.
///
/// Age is measured in whole days before `as_of`. Articles dated in the
/// future count as fresh.
pub fn recency_decay(
    published_at: Option<DateTime<Utc>>,
    as_of: DateTime<Utc>,
    window_days: u32,
) -> f64 {
    let Some(published_at) = published_at else {
        return UNKNOWN_DATE_DECAY;
    };

    let days_old = (as_of - published_at).num_days() as f64;
    let window = f64::from(window_days.max(1));

    (1.0 - days_old / window).clamp(MIN_DECAY, 1.0)
}
