//! Name matching against the watchlist
//!
//! Four stages, each only reached when the previous one comes up empty:
//!
//! 1. token-AND prefilter (every query token is a substring of the name)
//! 2. fuzzy token-set ranking of the prefiltered pool
//! 3. token-OR prefilter, ranked the same way, when stage 1 found nobody
//! 4. whole-query substring hits when nothing cleared the threshold
//!
//! Stage 4 hits carry a literal score of 100 and are marked low confidence.

use crate::{
    loader::WatchlistLoader,
    types::{CountryFilter, MatchCandidate, MatchStage, WatchlistEntity},
    Result,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Upper-cased alphanumeric runs
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// Trimmed, whitespace-collapsed, upper-cased query
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

fn joined(common: &str, rest: &[&str]) -> String {
    let rest = rest.join(" ");
    match (common.is_empty(), rest.is_empty()) {
        (true, _) => rest,
        (_, true) => common.to_string(),
        _ => format!("{} {}", common, rest),
    }
}

/// Order- and duplicate-insensitive similarity, 0-100.
///
/// Token sets are compared as sorted intersection plus each side's
/// remainder. A query whose tokens are all contained in the candidate (or
/// vice versa) scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let left: BTreeSet<String> = tokenize(a).into_iter().collect();
    let right: BTreeSet<String> = tokenize(b).into_iter().collect();
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let common: Vec<&str> = left.intersection(&right).map(String::as_str).collect();
    let only_left: Vec<&str> = left.difference(&right).map(String::as_str).collect();
    let only_right: Vec<&str> = right.difference(&left).map(String::as_str).collect();

    if !common.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100;
    }

    let sect = common.join(" ");
    let with_left = joined(&sect, &only_left);
    let with_right = joined(&sect, &only_right);

    let best = ratio(&sect, &with_left)
        .max(ratio(&sect, &with_right))
        .max(ratio(&with_left, &with_right));

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    All,
    Any,
}

/// Entities in `country` whose name contains all (or any) of `tokens`
pub fn prefilter<'a>(
    entities: &'a [WatchlistEntity],
    tokens: &[String],
    country: &CountryFilter,
    mode: TokenMode,
) -> Vec<&'a WatchlistEntity> {
    if tokens.is_empty() {
        return Vec::new();
    }

    entities
        .iter()
        .filter(|e| country.matches(&e.country))
        .filter(|e| {
            let name = e.name.to_uppercase();
            match mode {
                TokenMode::All => tokens.iter().all(|t| name.contains(t.as_str())),
                TokenMode::Any => tokens.iter().any(|t| name.contains(t.as_str())),
            }
        })
        .collect()
}

fn candidate(entity: &WatchlistEntity, score: u8, stage: MatchStage) -> MatchCandidate {
    let explanation = match stage {
        MatchStage::TokenAnd => format!("token-AND + fuzzy token-set, score={}", score),
        MatchStage::TokenOr => format!("token-OR + fuzzy token-set, score={}", score),
        MatchStage::Substring => "substring fallback, no similarity scoring applied".to_string(),
    };

    MatchCandidate {
        entity_name: entity.name.clone(),
        country: entity.country.clone(),
        program: entity.program.clone(),
        match_score: score,
        stage,
        explanation,
    }
}

/// Rank `entities` against `query`. Highest score first, ties by name.
pub fn rank(
    entities: &[WatchlistEntity],
    query: &str,
    country: &CountryFilter,
    top_n: usize,
    threshold: u8,
) -> Vec<MatchCandidate> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let (pool, stage) = match prefilter(entities, &tokens, country, TokenMode::All) {
        pool if !pool.is_empty() => (pool, MatchStage::TokenAnd),
        _ => (
            prefilter(entities, &tokens, country, TokenMode::Any),
            MatchStage::TokenOr,
        ),
    };
    let pool_size = pool.len();

    let mut candidates: Vec<MatchCandidate> = pool
        .into_iter()
        .filter_map(|e| {
            let score = token_set_ratio(query, &e.name);
            (score >= threshold).then(|| candidate(e, score, stage))
        })
        .collect();

    if candidates.is_empty() {
        let needle = normalize_query(query);
        candidates = entities
            .iter()
            .filter(|e| country.matches(&e.country) && e.name.to_uppercase().contains(&needle))
            .map(|e| candidate(e, 100, MatchStage::Substring))
            .collect();
    }

    candidates.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.entity_name.cmp(&b.entity_name))
    });
    candidates.truncate(top_n);

    debug!(
        query = %query,
        ?stage,
        pool = pool_size,
        matches = candidates.len(),
        "Ranked watchlist candidates"
    );
    candidates
}

/// Matching over the loader's current generation
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    loader: Arc<WatchlistLoader>,
}

impl MatchingEngine {
    pub fn new(loader: Arc<WatchlistLoader>) -> Self {
        Self { loader }
    }

    /// Self-heals an empty store once, then ranks the current generation.
    /// Fails with `DataUnavailable` only when the store is still empty.
    pub async fn find(
        &self,
        query: &str,
        country: &CountryFilter,
        top_n: usize,
        threshold: u8,
    ) -> Result<Vec<MatchCandidate>> {
        self.loader.ensure().await?;
        let generation = self.loader.store().snapshot();
        Ok(rank(&generation.entities, query, country, top_n, threshold))
    }

    pub fn loader(&self) -> &Arc<WatchlistLoader> {
        &self.loader
    }
}
