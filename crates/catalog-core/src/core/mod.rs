// crates/catalog-core/src/core/mod.rs
// ============================================================================
// Module: Catalog Core Types
// Description: Record schemas, patches, identifiers, and the error taxonomy.
// Purpose: Define the data model shared by every catalog component.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types describe the two record shapes served by the catalog (items and
//! activities), the sparse patches used for both filtering and updating, and
//! the error kinds every operation reports.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod activity;
pub mod error;
pub mod item;
pub mod record;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use activity::Activity;
pub use activity::ActivityCategory;
pub use activity::ActivityPatch;
pub use activity::Weekday;
pub use error::CatalogError;
pub use item::Category;
pub use item::Item;
pub use item::ItemPatch;
pub use record::Record;
pub use record::RecordId;
pub use record::RecordPatch;
pub use record::field_matches;
