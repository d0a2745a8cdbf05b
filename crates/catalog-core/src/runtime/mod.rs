// crates/catalog-core/src/runtime/mod.rs
// ============================================================================
// Module: Catalog Runtime
// Description: Identity allocation, matching, merge engine, stores, and cache.
// Purpose: Execute catalog operations against pluggable stores and upstreams.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the catalog engine and its default backends.
//! Every transport calls into [`Catalog`] so identity and matching rules stay
//! identical regardless of how records are stored.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod allocator;
pub mod cache;
pub mod clock;
pub mod engine;
pub mod kv_store;
pub mod matcher;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use allocator::next_id;
pub use cache::CacheAsideGateway;
pub use cache::CacheKey;
pub use cache::CacheLookup;
pub use cache::CacheOutcome;
pub use cache::DEFAULT_CACHE_TTL;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use engine::Catalog;
pub use engine::UpsertOutcome;
pub use kv_store::KvRecordStore;
pub use store::InMemoryKeyValueStore;
pub use store::InMemoryRecordStore;
pub use store::SharedKeyValueStore;
pub use store::SharedRecordStore;
