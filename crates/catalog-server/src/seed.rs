// crates/catalog-server/src/seed.rs
// ============================================================================
// Module: Seed Data
// Description: Sample inventory items and timetable activities.
// Purpose: Populate empty stores at startup without clobbering existing data.
// Dependencies: catalog-core
// ============================================================================

//! ## Overview
//! Seeding inserts each sample record whose id is not already taken, so
//! restarting against a durable key-value store leaves edited records alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use catalog_core::Activity;
use catalog_core::ActivityCategory;
use catalog_core::Catalog;
use catalog_core::CatalogError;
use catalog_core::Category;
use catalog_core::Item;
use catalog_core::Record;
use catalog_core::RecordId;
use catalog_core::RecordStore;
use catalog_core::Weekday;

// ============================================================================
// SECTION: Samples
// ============================================================================

/// Returns the sample inventory items.
#[must_use]
pub fn sample_items() -> Vec<Item> {
    [
        (0, "Hammer", 9.99, 20, Category::Tools),
        (1, "APliers", 3.5, 5, Category::Tools),
        (2, "Nails", 5.99, 4, Category::Consumables),
    ]
    .into_iter()
    .map(|(id, name, price, count, category)| Item {
        id: RecordId::new(id),
        name: name.to_string(),
        price,
        count,
        category,
    })
    .collect()
}

/// Returns the sample timetable activities.
#[must_use]
pub fn sample_activities() -> Vec<Activity> {
    [
        (0, "Mathematics", "Catalin", "A101", Weekday::Tuesday, 14, ActivityCategory::Lecture),
        (1, "Romanian", "Mihai", "A102", Weekday::Wednesday, 12, ActivityCategory::Seminar),
        (2, "English", "Ion", "A103", Weekday::Monday, 8, ActivityCategory::Lecture),
        (3, "Sport", "Catalin", "B003", Weekday::Thursday, 10, ActivityCategory::Lab),
    ]
    .into_iter()
    .map(|(id, name, teacher, room, day, hour, category)| Activity {
        id: RecordId::new(id),
        name: name.to_string(),
        duration: 2,
        teacher: teacher.to_string(),
        room: room.to_string(),
        day,
        hour,
        category,
    })
    .collect()
}

// ============================================================================
// SECTION: Seeding
// ============================================================================

/// Inserts every record whose id is free and returns how many were added.
///
/// # Errors
///
/// Returns [`CatalogError`] when the store fails or a sample is rejected.
pub fn seed<R: Record, S: RecordStore<R>>(
    catalog: &Catalog<R, S>,
    records: Vec<R>,
) -> Result<usize, CatalogError> {
    let mut added = 0;
    for record in records {
        if !catalog.store().contains(record.id())? {
            catalog.insert(record)?;
            added += 1;
        }
    }
    Ok(added)
}
