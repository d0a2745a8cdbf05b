// crates/catalog-core/src/runtime/store.rs
// ============================================================================
// Module: Catalog In-Memory Stores
// Description: In-process record and key-value stores plus shared wrappers.
// Purpose: Provide mutex-guarded stores for local runs and tests.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryRecordStore`] serializes every operation through one mutex, so
//! id uniqueness holds under concurrent callers. Records list in insertion
//! order; a record moved to a new id counts as freshly inserted.
//!
//! [`InMemoryKeyValueStore`] keeps byte values with optional expiry read from
//! an injected [`Clock`]. Expired entries are dropped lazily on access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use crate::core::Record;
use crate::core::RecordId;
use crate::interfaces::Clock;
use crate::interfaces::KeyValueStore;
use crate::interfaces::KvError;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: In-Memory Record Store
// ============================================================================

/// Record map with insertion sequence numbers.
#[derive(Debug)]
struct RecordTable<R> {
    /// Records keyed by id, tagged with their insertion sequence.
    records: BTreeMap<RecordId, (u64, R)>,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl<R> RecordTable<R> {
    /// Stores `record` under `id` at the end of the insertion order.
    fn push(&mut self, id: RecordId, record: R) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.records.insert(id, (seq, record));
    }
}

/// In-memory record store for local runs and tests.
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore<R: Record> {
    /// Record table protected by a mutex.
    table: Arc<Mutex<RecordTable<R>>>,
}

impl<R: Record> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> InMemoryRecordStore<R> {
    /// Creates an empty in-memory record store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(RecordTable {
                records: BTreeMap::new(),
                next_seq: 0,
            })),
        }
    }

    /// Acquires the table lock.
    fn lock(&self) -> Result<MutexGuard<'_, RecordTable<R>>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Backend(format!("{} store mutex poisoned", R::RESOURCE)))
    }
}

impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    fn get(&self, id: RecordId) -> Result<Option<R>, StoreError> {
        Ok(self.lock()?.records.get(&id).map(|(_, record)| record.clone()))
    }

    fn get_all(&self) -> Result<Vec<R>, StoreError> {
        let guard = self.lock()?;
        let mut entries: Vec<&(u64, R)> = guard.records.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, record)| record.clone()).collect())
    }

    fn insert(&self, record: R) -> Result<(), StoreError> {
        let id = record.id();
        let mut guard = self.lock()?;
        if guard.records.contains_key(&id) {
            return Err(StoreError::Conflict(id));
        }
        guard.push(id, record);
        drop(guard);
        Ok(())
    }

    fn replace(&self, record: R) -> Result<(), StoreError> {
        let id = record.id();
        let mut guard = self.lock()?;
        let slot = guard.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        slot.1 = record;
        drop(guard);
        Ok(())
    }

    fn remove(&self, id: RecordId) -> Result<R, StoreError> {
        self.lock()?
            .records
            .remove(&id)
            .map(|(_, record)| record)
            .ok_or(StoreError::NotFound(id))
    }

    fn contains(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.lock()?.records.contains_key(&id))
    }

    fn ids(&self) -> Result<BTreeSet<RecordId>, StoreError> {
        Ok(self.lock()?.records.keys().copied().collect())
    }

    fn relocate(&self, from: RecordId, record: R) -> Result<(), StoreError> {
        let to = record.id();
        let mut guard = self.lock()?;
        if guard.records.contains_key(&to) {
            return Err(StoreError::Conflict(to));
        }
        if guard.records.remove(&from).is_none() {
            return Err(StoreError::NotFound(from));
        }
        guard.push(to, record);
        drop(guard);
        Ok(())
    }
}

// ============================================================================
// SECTION: Shared Record Store
// ============================================================================

/// Shared record store backed by an `Arc` trait object.
pub struct SharedRecordStore<R: Record> {
    /// Inner store implementation.
    inner: Arc<dyn RecordStore<R> + Send + Sync>,
}

impl<R: Record> Clone for SharedRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> fmt::Debug for SharedRecordStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRecordStore").field("resource", &R::RESOURCE).finish()
    }
}

impl<R: Record> SharedRecordStore<R> {
    /// Wraps a record store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RecordStore<R> + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RecordStore<R> + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl<R: Record> RecordStore<R> for SharedRecordStore<R> {
    fn get(&self, id: RecordId) -> Result<Option<R>, StoreError> {
        self.inner.get(id)
    }

    fn get_all(&self) -> Result<Vec<R>, StoreError> {
        self.inner.get_all()
    }

    fn insert(&self, record: R) -> Result<(), StoreError> {
        self.inner.insert(record)
    }

    fn replace(&self, record: R) -> Result<(), StoreError> {
        self.inner.replace(record)
    }

    fn remove(&self, id: RecordId) -> Result<R, StoreError> {
        self.inner.remove(id)
    }

    fn contains(&self, id: RecordId) -> Result<bool, StoreError> {
        self.inner.contains(id)
    }

    fn ids(&self) -> Result<BTreeSet<RecordId>, StoreError> {
        self.inner.ids()
    }

    fn relocate(&self, from: RecordId, record: R) -> Result<(), StoreError> {
        self.inner.relocate(from, record)
    }
}

// ============================================================================
// SECTION: In-Memory Key-Value Store
// ============================================================================

/// Stored value with optional absolute expiry.
#[derive(Debug, Clone)]
struct KvEntry {
    /// Raw value bytes.
    value: Vec<u8>,
    /// Expiry in unix milliseconds; `None` never expires.
    expires_at: Option<u64>,
}

impl KvEntry {
    /// Returns true when the entry is still visible at `now`.
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// In-process key-value store with per-entry expiry.
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    /// Entries protected by a mutex.
    entries: Arc<Mutex<BTreeMap<String, KvEntry>>>,
    /// Time source for expiry.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl fmt::Debug for InMemoryKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryKeyValueStore").finish_non_exhaustive()
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKeyValueStore {
    /// Creates an empty store driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates an empty store driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Clock + Send + Sync + 'static) -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            clock: Arc::new(clock),
        }
    }

    /// Acquires the entry lock.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, KvEntry>>, KvError> {
        self.entries.lock().map_err(|_| KvError::Backend("kv store mutex poisoned".to_string()))
    }

    /// Returns the absolute expiry for a relative TTL.
    fn expiry(&self, ttl: Duration) -> Result<u64, KvError> {
        if ttl.is_zero() {
            return Err(KvError::Invalid("ttl must be greater than zero".to_string()));
        }
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Ok(self.clock.now_millis().saturating_add(ttl_ms))
    }
}

/// Drops `key` if its entry has expired, then returns the live entry.
fn live_entry<'a>(
    entries: &'a mut BTreeMap<String, KvEntry>,
    key: &str,
    now: u64,
) -> Option<&'a mut KvEntry> {
    if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let now = self.clock.now_millis();
        let mut guard = self.lock()?;
        Ok(live_entry(&mut guard, key, now).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), KvError> {
        let expires_at = ttl.map(|ttl| self.expiry(ttl)).transpose()?;
        self.lock()?.insert(
            key.to_string(),
            KvEntry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let now = self.clock.now_millis();
        Ok(self.lock()?.remove(key).filter(|entry| entry.is_live(now)).map(|entry| entry.value))
    }

    fn exists(&self, key: &str) -> Result<bool, KvError> {
        let now = self.clock.now_millis();
        let mut guard = self.lock()?;
        Ok(live_entry(&mut guard, key, now).is_some())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let now = self.clock.now_millis();
        let mut guard = self.lock()?;
        guard.retain(|_, entry| entry.is_live(now));
        Ok(guard
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, KvError> {
        let expires_at = self.expiry(ttl)?;
        let now = self.clock.now_millis();
        let mut guard = self.lock()?;
        let Some(entry) = live_entry(&mut guard, key, now) else {
            return Ok(false);
        };
        entry.expires_at = Some(expires_at);
        drop(guard);
        Ok(true)
    }
}

// ============================================================================
// SECTION: Shared Key-Value Store
// ============================================================================

/// Shared key-value store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedKeyValueStore {
    /// Inner store implementation.
    inner: Arc<dyn KeyValueStore + Send + Sync>,
}

impl fmt::Debug for SharedKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKeyValueStore").finish_non_exhaustive()
    }
}

impl SharedKeyValueStore {
    /// Wraps a key-value store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl KeyValueStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn KeyValueStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl KeyValueStore for SharedKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), KvError> {
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        self.inner.delete(key)
    }

    fn exists(&self, key: &str) -> Result<bool, KvError> {
        self.inner.exists(key)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        self.inner.scan(prefix)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, KvError> {
        self.inner.expire(key, ttl)
    }
}
