// crates/catalog-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Key-Value Store
// Description: Durable KeyValueStore backend using SQLite.
// Purpose: Persist catalog records and cached lookups across restarts.
// Dependencies: catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`KeyValueStore`] with per-entry
//! expiry and ordered prefix scans. It backs both the key-value record store
//! and the cache-aside gateway when the service runs with a durable store.
//!
//! [`KeyValueStore`]: catalog_core::KeyValueStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteKeyValueStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
