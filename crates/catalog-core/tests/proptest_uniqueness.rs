// crates/catalog-core/tests/proptest_uniqueness.rs
// ============================================================================
// Module: Identity Uniqueness Property Tests
// Description: Random operation sequences against the merge engine.
// Purpose: Ensure no sequence of operations produces duplicate ids.
// ============================================================================

//! Property-based tests for id uniqueness under mixed operations.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;

use catalog_core::Catalog;
use catalog_core::Category;
use catalog_core::InMemoryKeyValueStore;
use catalog_core::InMemoryRecordStore;
use catalog_core::Item;
use catalog_core::ItemPatch;
use catalog_core::KvRecordStore;
use catalog_core::RecordId;
use catalog_core::RecordStore;
use catalog_core::SharedKeyValueStore;
use catalog_core::SharedRecordStore;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Upsert(u64, u64),
    Move(u64, u64),
    Delete(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_u64 .. 8, 0_u64 .. 50).prop_map(|(id, count)| Op::Upsert(id, count)),
        (0_u64 .. 8, 0_u64 .. 8).prop_map(|(from, to)| Op::Move(from, to)),
        (0_u64 .. 8).prop_map(Op::Delete),
    ]
}

fn full_patch(count: u64) -> ItemPatch {
    ItemPatch {
        name: Some("Widget".to_string()),
        price: Some(1.0),
        count: Some(count),
        category: Some(Category::Tools),
        ..ItemPatch::default()
    }
}

fn run(store: SharedRecordStore<Item>, ops: &[Op]) -> Result<(), TestCaseError> {
    let catalog: Catalog<Item, _> = Catalog::new(store);
    for op in ops {
        // Rejections are expected; only the resulting state is checked.
        let _ = match op {
            Op::Upsert(id, count) => {
                catalog.upsert(RecordId::new(*id), &full_patch(*count)).map(|_| ())
            }
            Op::Move(from, to) => catalog
                .update(
                    RecordId::new(*from),
                    &ItemPatch {
                        id: Some(RecordId::new(*to)),
                        ..ItemPatch::default()
                    },
                )
                .map(|_| ()),
            Op::Delete(id) => catalog.delete(RecordId::new(*id)).map(|_| ()),
        };
        let records = catalog.list().unwrap();
        let ids: BTreeSet<RecordId> = records.iter().map(|item| item.id).collect();
        prop_assert_eq!(ids.len(), records.len());
        prop_assert_eq!(ids, catalog.store().ids().unwrap());
    }
    Ok(())
}

proptest! {
    #[test]
    fn in_memory_store_never_duplicates_ids(ops in prop::collection::vec(op_strategy(), 0 .. 40)) {
        run(SharedRecordStore::from_store(InMemoryRecordStore::new()), &ops)?;
    }

    #[test]
    fn kv_store_never_duplicates_ids(ops in prop::collection::vec(op_strategy(), 0 .. 40)) {
        let kv = SharedKeyValueStore::from_store(InMemoryKeyValueStore::new());
        run(SharedRecordStore::from_store(KvRecordStore::<Item>::new(kv)), &ops)?;
    }
}
