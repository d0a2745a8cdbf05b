// crates/catalog-core/tests/allocator.rs
// ============================================================================
// Module: Identity Allocator Tests
// Description: Gap-filling and uniqueness properties of id allocation.
// Purpose: Ensure allocated ids are always unused and minimal.
// ============================================================================

//! Property-based tests for smallest-free id allocation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;

use catalog_core::RecordId;
use catalog_core::next_id;
use proptest::prelude::*;

fn id_set(values: &[u64]) -> BTreeSet<RecordId> {
    values.iter().copied().map(RecordId::new).collect()
}

#[test]
fn next_id_reuses_gap_left_by_delete() {
    let mut ids = id_set(&[0, 1, 2, 3]);
    ids.remove(&RecordId::new(1));
    assert_eq!(next_id(&ids), RecordId::new(1));
}

#[test]
fn next_id_starts_at_zero_when_zero_is_free() {
    assert_eq!(next_id(&id_set(&[5, 6])), RecordId::new(0));
}

proptest! {
    #[test]
    fn next_id_is_unused_and_minimal(values in prop::collection::btree_set(0_u64 .. 64, 0 .. 32)) {
        let ids: BTreeSet<RecordId> = values.iter().copied().map(RecordId::new).collect();
        let allocated = next_id(&ids);
        prop_assert!(!ids.contains(&allocated));
        for smaller in 0 .. allocated.get() {
            prop_assert!(ids.contains(&RecordId::new(smaller)));
        }
    }
}
