//! Property tests for record merging
//!
//! Previously stored scalars always survive, list keys grow by
//! order-preserving union, and merging is idempotent.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vessel_canon::resolve::union_preserving_order;
use vessel_canon::{merge_records, CanonicalKey, CanonicalRecord, CanonicalValue};

// -- Arbitrary types --

fn arb_items() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("m[0-9]", 0..6)
}

fn arb_unique_items() -> impl Strategy<Value = Vec<String>> {
    arb_items().prop_map(|items| union_preserving_order(&[], &items))
}

fn arb_record() -> impl Strategy<Value = CanonicalRecord> {
    (
        prop::option::of("[A-Z]{2,10}"),
        prop::option::of(prop::sample::select(vec!["MALTA", "ITALY", "PANAMA"])),
        prop::option::of(1900i64..2026),
        prop::option::of(1.0f64..50.0),
        prop::option::of(arb_unique_items()),
        prop::option::of(arb_unique_items()),
    )
        .prop_map(|(name, flag, year, beam, models, previous_names)| {
            let mut record = CanonicalRecord::new();
            if let Some(name) = name {
                record.insert(CanonicalKey::YachtName, name.as_str());
            }
            if let Some(flag) = flag {
                record.insert(CanonicalKey::FlagState, flag);
            }
            if let Some(year) = year {
                record.insert(CanonicalKey::YearBuilt, year);
            }
            if let Some(beam) = beam {
                record.insert(CanonicalKey::BeamM, beam);
            }
            if let Some(models) = models {
                record.insert(CanonicalKey::DiscoveredModels, models);
            }
            if let Some(names) = previous_names {
                record.insert(CanonicalKey::PreviousNames, names);
            }
            record
        })
}

#[test]
fn test_union_law_example() {
    let a = vec!["a".to_string(), "b".to_string()];
    let b = vec!["b".to_string(), "c".to_string()];
    assert_eq!(
        union_preserving_order(&a, &b),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[test]
fn test_discovered_models_scenario() {
    let previous = CanonicalRecord::new().with(
        CanonicalKey::DiscoveredModels,
        vec!["m1".to_string(), "m2".to_string()],
    );
    let fresh = CanonicalRecord::new().with(
        CanonicalKey::DiscoveredModels,
        vec!["m2".to_string(), "m3".to_string()],
    );
    let merged = merge_records(&previous, &fresh);
    assert_eq!(
        merged.get(CanonicalKey::DiscoveredModels),
        Some(&CanonicalValue::List(vec![
            "m1".to_string(),
            "m2".to_string(),
            "m3".to_string()
        ]))
    );
}

proptest! {
    #[test]
    fn merge_with_self_is_identity(record in arb_record()) {
        prop_assert_eq!(merge_records(&record, &record), record);
    }

    #[test]
    fn merge_with_empty_is_identity(record in arb_record()) {
        let empty = CanonicalRecord::new();
        prop_assert_eq!(merge_records(&record, &empty), record.clone());
        prop_assert_eq!(merge_records(&empty, &record), record);
    }

    #[test]
    fn merge_is_idempotent(previous in arb_record(), fresh in arb_record()) {
        let once = merge_records(&previous, &fresh);
        let twice = merge_records(&once, &fresh);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn previous_scalars_survive(previous in arb_record(), fresh in arb_record()) {
        let merged = merge_records(&previous, &fresh);
        for (key, value) in previous.iter() {
            if key.is_list() {
                continue;
            }
            prop_assert_eq!(merged.get(*key), Some(value));
        }
        for (key, value) in fresh.iter() {
            if !previous.contains_key(*key) {
                prop_assert_eq!(merged.get(*key), Some(value));
            }
        }
    }

    #[test]
    fn lists_union_in_first_seen_order(old in arb_unique_items(), new in arb_unique_items()) {
        let merged = union_preserving_order(&old, &new);

        // Previous items keep their positions
        prop_assert_eq!(&merged[..old.len()], &old[..]);
        // Every fresh item is present exactly once
        for item in &new {
            prop_assert_eq!(merged.iter().filter(|m| *m == item).count(), 1);
        }
        // Nothing invented
        prop_assert!(merged.iter().all(|m| old.contains(m) || new.contains(m)));
    }
}
