// crates/catalog-core/tests/matcher.rs
// ============================================================================
// Module: Query Matcher Tests
// Description: Selection, existence, and duplicate matching.
// Purpose: Ensure filters are conjunctive and ids override attributes.
// ============================================================================

//! ## Overview
//! Exercises the matcher over the sample item and activity stores.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use catalog_core::Activity;
use catalog_core::ActivityPatch;
use catalog_core::Category;
use catalog_core::Item;
use catalog_core::ItemPatch;
use catalog_core::RecordId;
use catalog_core::Weekday;
use catalog_core::runtime::matcher::find_duplicate;
use catalog_core::runtime::matcher::find_existing;
use catalog_core::runtime::matcher::matches;
use catalog_core::runtime::matcher::select;

#[test]
fn empty_filter_matches_everything() {
    let store = common::item_store();
    let selection = select::<Item, _>(&store, &ItemPatch::default()).unwrap();
    assert_eq!(selection.len(), 3);
}

#[test]
fn filter_is_conjunctive() {
    let store = common::item_store();
    let filter = ItemPatch {
        category: Some(Category::Tools),
        count: Some(5),
        ..ItemPatch::default()
    };
    let selection = select::<Item, _>(&store, &filter).unwrap();
    assert_eq!(selection.len(), 1);
    assert_eq!(selection[0].name, "APliers");

    let hammer = &common::sample_items()[0];
    assert!(!matches(hammer, &filter));
}

#[test]
fn selection_preserves_store_order() {
    let store = common::item_store();
    let filter = ItemPatch {
        category: Some(Category::Tools),
        ..ItemPatch::default()
    };
    let names: Vec<String> =
        select::<Item, _>(&store, &filter).unwrap().into_iter().map(|item| item.name).collect();
    assert_eq!(names, vec!["Hammer".to_string(), "APliers".to_string()]);
}

#[test]
fn existence_by_id_ignores_attributes() {
    let store = common::activity_store();
    let filter = ActivityPatch {
        id: Some(RecordId::new(2)),
        name: Some("Not Physics".to_string()),
        ..ActivityPatch::default()
    };
    assert_eq!(find_existing::<Activity, _>(&store, &filter).unwrap(), Some(RecordId::new(2)));

    let missing = ActivityPatch {
        id: Some(RecordId::new(42)),
        name: Some("Physics".to_string()),
        ..ActivityPatch::default()
    };
    assert_eq!(find_existing::<Activity, _>(&store, &missing).unwrap(), None);
}

#[test]
fn existence_by_attributes_returns_lowest_match() {
    let store = common::activity_store();
    let filter = ActivityPatch {
        name: Some("Algebra".to_string()),
        ..ActivityPatch::default()
    };
    assert_eq!(find_existing::<Activity, _>(&store, &filter).unwrap(), Some(RecordId::new(0)));

    let none = ActivityPatch {
        day: Some(Weekday::Sunday),
        ..ActivityPatch::default()
    };
    assert_eq!(find_existing::<Activity, _>(&store, &none).unwrap(), None);
}

#[test]
fn duplicate_check_skips_excluded_record() {
    let store = common::activity_store();
    let mut candidate = common::sample_activities()[1].clone();
    candidate.id = RecordId::new(9);
    assert_eq!(find_duplicate(&store, &candidate, None).unwrap(), Some(RecordId::new(1)));
    assert_eq!(find_duplicate(&store, &candidate, Some(RecordId::new(1))).unwrap(), None);
}
