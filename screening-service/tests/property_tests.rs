//! Property-based tests for matching and media invariants
//!
//! - Fallback monotonicity: the token-AND pool is contained in the token-OR pool,
//!   and every token-AND match is also returned by token-OR ranking
//! - Ranking: results are ordered, bounded by top-N and above the threshold
//! - Idempotent ingestion: re-ingesting an id keeps the first record

use proptest::prelude::*;
use screening_service::matching::{prefilter, rank, token_set_ratio, tokenize, TokenMode};
use screening_service::{
    CountryFilter, EntityType, MatchStage, MediaIndex, RawArticle, WatchlistEntity,
};

fn entity_strategy() -> impl Strategy<Value = WatchlistEntity> {
    (
        "[A-Z]{2,8}(, [A-Z]{2,8})?( [A-Z]{2,8})?",
        prop_oneof![Just("RUSSIA"), Just("IRAN"), Just("BELARUS"), Just("")],
    )
        .prop_map(|(name, country)| WatchlistEntity {
            name,
            program: "SDGT".to_string(),
            entity_type: EntityType::Individual,
            dob: String::new(),
            country: country.to_string(),
            citizenship: String::new(),
            nationality: String::new(),
            remarks: String::new(),
        })
}

fn country_strategy() -> impl Strategy<Value = CountryFilter> {
    prop_oneof![
        Just(CountryFilter::Any),
        Just(CountryFilter::parse("russia")),
        Just(CountryFilter::parse("IRAN")),
    ]
}

proptest! {
    #[test]
    fn prop_and_pool_is_subset_of_or_pool(
        entities in prop::collection::vec(entity_strategy(), 0..40),
        query in "[A-Za-z]{1,6}( [A-Za-z]{1,6}){0,2}",
        country in country_strategy(),
    ) {
        let tokens = tokenize(&query);
        let all = prefilter(&entities, &tokens, &country, TokenMode::All);
        let any = prefilter(&entities, &tokens, &country, TokenMode::Any);

        for entity in &all {
            prop_assert!(any.iter().any(|e| std::ptr::eq(*e, *entity)));
        }
    }

    #[test]
    fn prop_and_matches_survive_or_ranking(
        entities in prop::collection::vec(entity_strategy(), 0..40),
        query in "[A-Za-z]{1,6}( [A-Za-z]{1,6}){0,2}",
        country in country_strategy(),
        threshold in 0u8..=100,
    ) {
        let tokens = tokenize(&query);
        let top_n = entities.len() + 1;
        let matches = rank(&entities, &query, &country, top_n, threshold);

        let or_ranked: Vec<(&str, &str, u8)> = prefilter(&entities, &tokens, &country, TokenMode::Any)
            .into_iter()
            .map(|e| (e.name.as_str(), e.country.as_str(), token_set_ratio(&query, &e.name)))
            .filter(|(_, _, score)| *score >= threshold)
            .collect();

        let and_hits: Vec<_> = matches.iter().filter(|m| m.stage == MatchStage::TokenAnd).collect();
        prop_assert!(and_hits.len() <= or_ranked.len());
        for m in and_hits {
            prop_assert!(or_ranked.contains(&(
                m.entity_name.as_str(),
                m.country.as_str(),
                m.match_score,
            )));
        }
    }

    #[test]
    fn prop_rank_is_ordered_and_bounded(
        entities in prop::collection::vec(entity_strategy(), 0..40),
        query in "[A-Za-z]{1,6}( [A-Za-z]{1,6}){0,2}",
        country in country_strategy(),
        top_n in 1usize..8,
        threshold in 0u8..=100,
    ) {
        let matches = rank(&entities, &query, &country, top_n, threshold);

        prop_assert!(matches.len() <= top_n);
        for m in &matches {
            prop_assert!(m.match_score >= threshold);
            prop_assert!(m.match_score <= 100);
            prop_assert!(country.matches(&m.country));
        }
        for pair in matches.windows(2) {
            prop_assert!(
                pair[0].match_score > pair[1].match_score
                    || (pair[0].match_score == pair[1].match_score
                        && pair[0].entity_name <= pair[1].entity_name)
            );
        }
    }

    #[test]
    fn prop_token_set_ratio_is_symmetric_and_bounded(
        a in "[A-Za-z ,]{0,30}",
        b in "[A-Za-z ,]{0,30}",
    ) {
        let ab = token_set_ratio(&a, &b);
        prop_assert!(ab <= 100);
        prop_assert_eq!(ab, token_set_ratio(&b, &a));
    }

    #[test]
    fn prop_ingestion_is_idempotent(
        id in "[a-z0-9]{1,12}",
        first_title in "[A-Za-z ]{0,40}",
        second_title in "[A-Za-z ]{0,40}",
    ) {
        let index = MediaIndex::default();
        let article = |title: &str| RawArticle {
            guid: Some(id.clone()),
            link: None,
            title: title.to_string(),
            summary: String::new(),
            published: None,
        };

        prop_assert!(index.ingest("wire", article(&first_title)).unwrap());
        let stored = index.get(id.trim()).unwrap();

        prop_assert!(!index.ingest("wire", article(&second_title)).unwrap());
        prop_assert_eq!(index.len(), 1);
        prop_assert_eq!(index.get(id.trim()).unwrap(), stored);
    }
}
