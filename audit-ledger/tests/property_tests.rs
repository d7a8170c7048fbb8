//! Property-based tests for audit log invariants
//!
//! - Append-only: every recorded entry is retrievable unchanged
//! - Ordering: listing is newest first with non-increasing timestamps
//! - Chain: concurrent writers still produce a verifiable chain

use audit_ledger::{AuditLog, AuditRecord};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn record_strategy() -> impl Strategy<Value = AuditRecord> {
    (
        "[A-Za-z ,.'-]{1,40}",
        prop::option::of("[0-9]{4}-[0-9]{2}-[0-9]{2}"),
        prop_oneof![Just("Any".to_string()), "[A-Z]{2,10}"],
        0u32..20,
        0u32..20,
        prop_oneof![Just("LOW"), Just("MEDIUM"), Just("HIGH")],
        0.0f64..=100.0,
    )
        .prop_map(
            |(name, dob, country, sanctions, media, level, score)| AuditRecord {
                query_name: name.clone(),
                query_dob: dob.unwrap_or_default(),
                query_country: country,
                sanctions_match_count: sanctions,
                media_match_count: media,
                risk_level: level.to_string(),
                risk_score: score,
                payload: serde_json::json!({ "query_name": name, "risk_score": score }).to_string(),
            },
        )
}

proptest! {
    #[test]
    fn prop_recorded_entries_are_retrievable(records in prop::collection::vec(record_strategy(), 1..30)) {
        let log = AuditLog::in_memory();
        let mut ids = Vec::new();
        for record in &records {
            ids.push(log.record(record.clone()).unwrap());
        }

        for (id, record) in ids.iter().zip(&records) {
            let entry = log.get(*id).unwrap();
            prop_assert_eq!(&entry.query_name, &record.query_name);
            prop_assert_eq!(&entry.payload, &record.payload);
            prop_assert_eq!(entry.risk_score, record.risk_score);
        }

        prop_assert_eq!(log.verify_chain().unwrap(), records.len());
    }

    #[test]
    fn prop_listing_is_reverse_chronological(records in prop::collection::vec(record_strategy(), 1..30)) {
        let log = AuditLog::in_memory();
        for record in records.iter().cloned() {
            log.record(record).unwrap();
        }

        let listed = log.list(usize::MAX).unwrap();
        prop_assert_eq!(listed.len(), records.len());
        for pair in listed.windows(2) {
            prop_assert!(pair[0].id > pair[1].id);
            prop_assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }
}

#[test]
fn test_concurrent_writers_keep_chain_intact() {
    let log = Arc::new(AuditLog::in_memory());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let log = log.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    log.record(AuditRecord {
                        query_name: format!("worker {} query {}", worker, i),
                        query_dob: String::new(),
                        query_country: "Any".to_string(),
                        sanctions_match_count: 0,
                        media_match_count: 0,
                        risk_level: "LOW".to_string(),
                        risk_score: 0.0,
                        payload: "{}".to_string(),
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(log.len().unwrap(), 200);
    assert_eq!(log.verify_chain().unwrap(), 200);

    let ids: Vec<u64> = log.list(usize::MAX).unwrap().iter().map(|s| s.id).collect();
    let expected: Vec<u64> = (1..=200).rev().collect();
    assert_eq!(ids, expected);
}
