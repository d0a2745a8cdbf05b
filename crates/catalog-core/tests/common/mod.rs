// crates/catalog-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Sample items and activities shared by core tests.
// Purpose: Keep fixture records consistent across test files.
// Dependencies: catalog-core
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use catalog_core::Activity;
use catalog_core::ActivityCategory;
use catalog_core::Category;
use catalog_core::InMemoryRecordStore;
use catalog_core::Item;
use catalog_core::RecordId;
use catalog_core::RecordStore;
use catalog_core::Weekday;

// ============================================================================
// SECTION: Items
// ============================================================================

/// Builds an item fixture.
pub fn item(id: u64, name: &str, price: f64, count: u64, category: Category) -> Item {
    Item {
        id: RecordId::new(id),
        name: name.to_string(),
        price,
        count,
        category,
    }
}

/// Returns the three sample inventory items.
pub fn sample_items() -> Vec<Item> {
    vec![
        item(0, "Hammer", 9.99, 20, Category::Tools),
        item(1, "APliers", 3.5, 5, Category::Tools),
        item(2, "Nails", 5.99, 4, Category::Consumables),
    ]
}

/// Returns an in-memory store seeded with the sample items.
pub fn item_store() -> InMemoryRecordStore<Item> {
    let store = InMemoryRecordStore::new();
    for item in sample_items() {
        store.insert(item).unwrap();
    }
    store
}

// ============================================================================
// SECTION: Activities
// ============================================================================

/// Builds an activity fixture.
pub fn activity(
    id: u64,
    name: &str,
    teacher: &str,
    day: Weekday,
    hour: u8,
    category: ActivityCategory,
) -> Activity {
    Activity {
        id: RecordId::new(id),
        name: name.to_string(),
        duration: 2,
        teacher: teacher.to_string(),
        room: "C112".to_string(),
        day,
        hour,
        category,
    }
}

/// Returns the sample timetable.
pub fn sample_activities() -> Vec<Activity> {
    vec![
        activity(0, "Algebra", "Popescu", Weekday::Monday, 8, ActivityCategory::Lecture),
        activity(1, "Algebra", "Ionescu", Weekday::Tuesday, 10, ActivityCategory::Seminar),
        activity(2, "Physics", "Marin", Weekday::Wednesday, 12, ActivityCategory::Lab),
        activity(3, "Databases", "Stan", Weekday::Friday, 14, ActivityCategory::Lecture),
    ]
}

/// Returns an in-memory store seeded with the sample activities.
pub fn activity_store() -> InMemoryRecordStore<Activity> {
    let store = InMemoryRecordStore::new();
    for activity in sample_activities() {
        store.insert(activity).unwrap();
    }
    store
}
