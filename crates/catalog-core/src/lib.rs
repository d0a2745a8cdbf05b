// crates/catalog-core/src/lib.rs
// ============================================================================
// Module: Catalog Core Library
// Description: Public API surface for the Catalog core.
// Purpose: Expose record types, interfaces, and runtime engines.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Catalog core owns the record-identity and query-matching rules of the
//! catalog service: how records are keyed, how sparse patches are matched and
//! merged, and how cache-aside lookups stay fresh. It is backend-agnostic and
//! integrates with storage and upstream services through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::KeyValueStore;
pub use interfaces::KvError;
pub use interfaces::RecordStore;
pub use interfaces::StoreError;
pub use interfaces::UpstreamError;
pub use interfaces::UpstreamSource;
pub use runtime::CacheAsideGateway;
pub use runtime::CacheKey;
pub use runtime::CacheLookup;
pub use runtime::CacheOutcome;
pub use runtime::Catalog;
pub use runtime::DEFAULT_CACHE_TTL;
pub use runtime::InMemoryKeyValueStore;
pub use runtime::InMemoryRecordStore;
pub use runtime::KvRecordStore;
pub use runtime::ManualClock;
pub use runtime::SharedKeyValueStore;
pub use runtime::SharedRecordStore;
pub use runtime::SystemClock;
pub use runtime::UpsertOutcome;
pub use runtime::next_id;
