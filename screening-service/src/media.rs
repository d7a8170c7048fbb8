//! Adverse media index
//!
//! Articles are keyed by their feed id (guid, else link). Re-ingesting an id
//! is a no-op, so the first version of an article is the one kept.

use crate::{
    config::{MediaConfig, MAX_RECENT_WINDOW_HOURS},
    types::{MediaArticle, MediaSummary, RawArticle},
    Result, ScreeningError,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use lazy_static::lazy_static;
use regex::Regex;
use risk_engine::MediaCategory;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

const SANCTIONS_KEYWORDS: &[&str] = &["sanctions", "embargo", "blocked", "sdn", "ofac", "restricted"];
const PEP_KEYWORDS: &[&str] = &["government", "official", "minister", "diplomat", "president"];
const FRAUD_KEYWORDS: &[&str] = &["fraud", "embezzlement", "forgery", "scheme", "scam"];
const CRIME_KEYWORDS: &[&str] = &["arrest", "convicted", "charged", "indictment", "crime", "criminal"];

fn keyword_pattern(keywords: &[&str]) -> Regex {
    let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).unwrap()
}

lazy_static! {
    static ref CATEGORY_PATTERNS: Vec<(MediaCategory, Regex)> = vec![
        (MediaCategory::Sanctions, keyword_pattern(SANCTIONS_KEYWORDS)),
        (MediaCategory::Pep, keyword_pattern(PEP_KEYWORDS)),
        (MediaCategory::Fraud, keyword_pattern(FRAUD_KEYWORDS)),
        (MediaCategory::Crime, keyword_pattern(CRIME_KEYWORDS)),
    ];
}

/// Keyword categories present in `title` and `content`; `Other` when none
pub fn tag(title: &str, content: &str) -> Vec<MediaCategory> {
    let text = format!("{} {}", title, content).to_lowercase();
    let tags: Vec<MediaCategory> = CATEGORY_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&text))
        .map(|(category, _)| *category)
        .collect();

    if tags.is_empty() {
        vec![MediaCategory::Other]
    } else {
        tags
    }
}

/// RFC 3339, RFC 2822 (RSS) or a bare `YYYY-MM-DD`
pub fn parse_published(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Outcome of one feed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

// Most recent first, undated last
fn by_recency(a: &MediaArticle, b: &MediaArticle) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.ingested_at.cmp(&a.ingested_at))
    .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug)]
pub struct MediaIndex {
    articles: DashMap<String, MediaArticle>,
    config: MediaConfig,
}

impl Default for MediaIndex {
    fn default() -> Self {
        Self::new(MediaConfig::default())
    }
}

impl MediaIndex {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            articles: DashMap::new(),
            config,
        }
    }

    /// Tag and store a feed item. Fails when it has neither guid nor link.
    pub fn ingest(&self, source: &str, raw: RawArticle) -> Result<bool> {
        let link = non_blank(&raw.link);
        let id = non_blank(&raw.guid).or_else(|| link.clone()).ok_or_else(|| {
            ScreeningError::InvalidArticle(format!("{:?} has no guid or link", raw.title))
        })?;

        let article = MediaArticle {
            tags: tag(&raw.title, &raw.summary),
            published_at: raw.published.as_deref().and_then(parse_published),
            id,
            source: source.to_string(),
            url: link.unwrap_or_default(),
            title: raw.title,
            content: raw.summary,
            ingested_at: Utc::now(),
        };

        Ok(self.ingest_article(article))
    }

    /// Insert-or-ignore on `id`
    pub fn ingest_article(&self, article: MediaArticle) -> bool {
        match self.articles.entry(article.id.clone()) {
            Entry::Occupied(_) => {
                debug!(id = %article.id, "Duplicate article ignored");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(article);
                true
            }
        }
    }

    /// Ingest up to `feed_item_limit` items from one feed
    pub fn ingest_feed(&self, source: &str, items: Vec<RawArticle>) -> IngestStats {
        let mut stats = IngestStats::default();

        for raw in items.into_iter().take(self.config.feed_item_limit) {
            match self.ingest(source, raw) {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.duplicates += 1,
                Err(e) => {
                    debug!(source, error = %e, "Skipping feed item");
                    stats.skipped += 1;
                }
            }
        }

        info!(
            source,
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            skipped = stats.skipped,
            "Media feed ingested"
        );
        stats
    }

    /// Articles mentioning `name` in title or content (case-insensitive)
    pub fn search_by_name(&self, name: &str) -> Vec<MediaArticle> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<MediaArticle> = self
            .articles
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&needle) || a.content.to_lowercase().contains(&needle)
            })
            .map(|a| a.value().clone())
            .collect();

        hits.sort_by(by_recency);
        hits.truncate(self.config.search_limit);
        hits
    }

    /// Articles ingested within `window`, most recently published first.
    /// A window reaching past the earliest representable time covers everything.
    pub fn recent(&self, window: Duration, limit: usize) -> Vec<MediaSummary> {
        let cutoff = Utc::now().checked_sub_signed(window);
        let mut recent: Vec<MediaArticle> = self
            .articles
            .iter()
            .filter(|a| cutoff.map_or(true, |cutoff| a.ingested_at > cutoff))
            .map(|a| a.value().clone())
            .collect();

        recent.sort_by(by_recency);
        recent.iter().take(limit).map(MediaSummary::from).collect()
    }

    /// `recent` over the configured default window
    pub fn recent_default(&self) -> Vec<MediaSummary> {
        self.recent(
            Duration::hours(self.config.recent_window_hours.clamp(0, MAX_RECENT_WINDOW_HOURS)),
            self.config.search_limit,
        )
    }

    pub fn get(&self, id: &str) -> Option<MediaArticle> {
        self.articles.get(id).map(|a| a.value().clone())
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
