// crates/catalog-core/src/runtime/kv_store.rs
// ============================================================================
// Module: Key-Value Record Store
// Description: Record store persisted as one key-value entry per record.
// Purpose: Keep records in an external key-value store shared with the cache.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! Each record lives under `"<resource>:<id>"` as a flat JSON object with
//! enum fields stored as string tags. Listing scans the resource prefix and
//! returns records in ascending id order.
//!
//! Individual calls are as atomic as the backing store; multi-step sequences
//! such as check-then-insert are not, so concurrent writers follow last write
//! wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::marker::PhantomData;

use crate::core::Record;
use crate::core::RecordId;
use crate::interfaces::KeyValueStore;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;
use crate::runtime::store::SharedKeyValueStore;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record store backed by a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct KvRecordStore<R: Record, K: KeyValueStore = SharedKeyValueStore> {
    /// Backing key-value store.
    kv: K,
    /// Record type marker.
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, K: KeyValueStore> KvRecordStore<R, K> {
    /// Creates a record store over `kv`.
    #[must_use]
    pub const fn new(kv: K) -> Self {
        Self {
            kv,
            _record: PhantomData,
        }
    }

    /// Returns the key-value key for `id`.
    #[must_use]
    pub fn key(id: RecordId) -> String {
        format!("{}:{id}", R::RESOURCE)
    }

    /// Returns the key prefix shared by every record of this type.
    fn prefix() -> String {
        format!("{}:", R::RESOURCE)
    }

    /// Decodes a stored record and checks it sits under the expected id.
    fn decode(id: RecordId, bytes: &[u8]) -> Result<R, StoreError> {
        let record: R = serde_json::from_slice(bytes).map_err(|err| {
            StoreError::Corrupt(format!("{} entry {id} is not valid json: {err}", R::RESOURCE))
        })?;
        if record.id() != id {
            return Err(StoreError::Corrupt(format!(
                "{} entry {id} holds record {}",
                R::RESOURCE,
                record.id()
            )));
        }
        Ok(record)
    }

    /// Encodes a record for storage.
    fn encode(record: &R) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(record).map_err(|err| {
            StoreError::Backend(format!("failed to encode {} {}: {err}", R::RESOURCE, record.id()))
        })
    }

    /// Parses the id suffix of a scanned key.
    fn parse_key(key: &str) -> Result<RecordId, StoreError> {
        key.strip_prefix(&Self::prefix())
            .and_then(|suffix| suffix.parse::<u64>().ok())
            .map(RecordId::new)
            .ok_or_else(|| StoreError::Corrupt(format!("unexpected record key: {key}")))
    }
}

impl<R: Record, K: KeyValueStore> RecordStore<R> for KvRecordStore<R, K> {
    fn get(&self, id: RecordId) -> Result<Option<R>, StoreError> {
        self.kv.get(&Self::key(id))?.map(|bytes| Self::decode(id, &bytes)).transpose()
    }

    fn get_all(&self) -> Result<Vec<R>, StoreError> {
        let mut records = Vec::new();
        for id in self.ids()? {
            // Entries deleted between scan and read are skipped.
            if let Some(record) = self.get(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn insert(&self, record: R) -> Result<(), StoreError> {
        let id = record.id();
        let key = Self::key(id);
        if self.kv.exists(&key)? {
            return Err(StoreError::Conflict(id));
        }
        self.kv.set(&key, &Self::encode(&record)?, None)?;
        Ok(())
    }

    fn replace(&self, record: R) -> Result<(), StoreError> {
        let id = record.id();
        let key = Self::key(id);
        if !self.kv.exists(&key)? {
            return Err(StoreError::NotFound(id));
        }
        self.kv.set(&key, &Self::encode(&record)?, None)?;
        Ok(())
    }

    fn remove(&self, id: RecordId) -> Result<R, StoreError> {
        let bytes = self.kv.delete(&Self::key(id))?.ok_or(StoreError::NotFound(id))?;
        Self::decode(id, &bytes)
    }

    fn contains(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.kv.exists(&Self::key(id))?)
    }

    fn ids(&self) -> Result<BTreeSet<RecordId>, StoreError> {
        self.kv.scan(&Self::prefix())?.iter().map(|key| Self::parse_key(key)).collect()
    }
}
