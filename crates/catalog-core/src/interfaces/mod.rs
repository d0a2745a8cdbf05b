// crates/catalog-core/src/interfaces/mod.rs
// ============================================================================
// Module: Catalog Interfaces
// Description: Backend-agnostic interfaces for record storage, key-value
//              storage, upstream lookups, and time.
// Purpose: Define the contract surfaces consumed by the catalog runtime.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the catalog integrates with storage backends and
//! remote resources without embedding backend-specific details. All traits
//! are synchronous; async transports shift calls onto blocking contexts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::core::CatalogError;
use crate::core::Record;
use crate::core::RecordId;
use crate::runtime::CacheKey;

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record exists under the identifier.
    #[error("record {0} not found")]
    NotFound(RecordId),
    /// A record already exists under the identifier.
    #[error("record {0} already exists")]
    Conflict(RecordId),
    /// Backend failure.
    #[error("record store backend error: {0}")]
    Backend(String),
    /// Stored data could not be decoded or is inconsistent.
    #[error("record store corruption: {0}")]
    Corrupt(String),
}

impl From<KvError> for StoreError {
    fn from(error: KvError) -> Self {
        match error {
            KvError::Backend(message) => Self::Backend(message),
            KvError::Invalid(message) => Self::Corrupt(message),
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => Self::NotFound(format!("record {id} does not exist")),
            StoreError::Conflict(id) => Self::Conflict(format!("record {id} already exists")),
            StoreError::Backend(message) | StoreError::Corrupt(message) => Self::Store(message),
        }
    }
}

/// Authoritative record storage keyed by [`RecordId`].
///
/// Implementations own record state exclusively; the engine never mutates a
/// record except through this trait.
pub trait RecordStore<R: Record> {
    /// Loads the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn get(&self, id: RecordId) -> Result<Option<R>, StoreError>;

    /// Returns every record in store iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn get_all(&self) -> Result<Vec<R>, StoreError>;

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the id is already present.
    fn insert(&self, record: R) -> Result<(), StoreError>;

    /// Overwrites an existing record in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent.
    fn replace(&self, record: R) -> Result<(), StoreError>;

    /// Removes and returns the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent.
    fn remove(&self, id: RecordId) -> Result<R, StoreError>;

    /// Returns true when a record exists under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn contains(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Returns the set of identifiers currently in use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn ids(&self) -> Result<BTreeSet<RecordId>, StoreError> {
        Ok(self.get_all()?.iter().map(Record::id).collect())
    }

    /// Moves the record stored under `from` to `record.id()`.
    ///
    /// The default implementation is a non-atomic check, remove, and insert
    /// sequence that restores the original record if the insert fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the target id is in use and
    /// [`StoreError::NotFound`] when `from` is absent.
    fn relocate(&self, from: RecordId, record: R) -> Result<(), StoreError> {
        let to = record.id();
        if self.contains(to)? {
            return Err(StoreError::Conflict(to));
        }
        let previous = self.remove(from)?;
        if let Err(err) = self.insert(record) {
            self.insert(previous)?;
            return Err(err);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Key-Value Store
// ============================================================================

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// Backend failure.
    #[error("kv backend error: {0}")]
    Backend(String),
    /// Invalid key, value, or stored entry.
    #[error("kv invalid data: {0}")]
    Invalid(String),
}

impl From<KvError> for CatalogError {
    fn from(error: KvError) -> Self {
        Self::Store(error.to_string())
    }
}

/// External key-value store with optional per-entry expiry.
///
/// Each call is atomic on its own; sequences of calls are not.
pub trait KeyValueStore {
    /// Returns the live value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] when the backend fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A `ttl` of `None` keeps the entry until it is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] when the backend fails.
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), KvError>;

    /// Deletes `key`, returning the removed live value.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] when the backend fails.
    fn delete(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Returns true when a live entry exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] when the backend fails.
    fn exists(&self, key: &str) -> Result<bool, KvError>;

    /// Returns the live keys starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] when the backend fails.
    fn scan(&self, prefix: &str) -> Result<Vec<String>, KvError>;

    /// Sets a new expiry on an existing live entry.
    ///
    /// Returns false when `key` has no live entry.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] when the backend fails.
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, KvError>;
}

// ============================================================================
// SECTION: Upstream Source
// ============================================================================

/// Upstream lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Upstream could not be reached or failed.
    #[error("upstream request failed: {0}")]
    Unavailable(String),
    /// Upstream answered with a payload that is not valid JSON.
    #[error("upstream returned malformed data: {0}")]
    Malformed(String),
}

impl From<UpstreamError> for CatalogError {
    fn from(error: UpstreamError) -> Self {
        Self::UpstreamUnavailable(error.to_string())
    }
}

/// Read-only remote resource consulted on cache misses.
pub trait UpstreamSource {
    /// Fetches the resource named by `key`.
    ///
    /// Returns `Ok(None)` when the upstream reports the resource as absent.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the call fails or the payload is invalid.
    fn fetch(&self, key: &CacheKey) -> Result<Option<Value>, UpstreamError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall-clock source used for entry expiry.
pub trait Clock {
    /// Returns milliseconds since the unix epoch.
    fn now_millis(&self) -> u64;
}
