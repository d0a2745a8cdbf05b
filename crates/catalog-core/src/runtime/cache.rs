// crates/catalog-core/src/runtime/cache.rs
// ============================================================================
// Module: Cache-Aside Gateway
// Description: Read-through caching of upstream lookups with expiry.
// Purpose: Serve repeated upstream lookups from the key-value store.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! The gateway reads `"<class>:<id>"` from the key-value store first. On a
//! miss it calls the upstream, stores the JSON payload with a TTL, and
//! returns it. Upstream "not found" answers are never cached, and a cached
//! payload that fails to decode is treated as a miss and overwritten.
//!
//! Concurrent misses for one key may each call the upstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::core::CatalogError;
use crate::interfaces::KeyValueStore;
use crate::interfaces::UpstreamSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default lifetime of a cached upstream payload.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1800);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Cache key naming an upstream resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Resource class, e.g. `entries`.
    pub class: String,
    /// Resource identifier within the class, e.g. `fact`.
    pub id: String,
}

impl CacheKey {
    /// Creates a cache key.
    #[must_use]
    pub fn new(class: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.id)
    }
}

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    /// Served from a live cache entry.
    Hit,
    /// Fetched from the upstream and stored.
    Miss,
}

impl CacheOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

/// Result of a gateway lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    /// Resource payload.
    pub value: Value,
    /// How the payload was obtained.
    pub outcome: CacheOutcome,
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Read-through cache over an upstream source.
#[derive(Debug, Clone)]
pub struct CacheAsideGateway<K, U> {
    /// Cache storage.
    kv: K,
    /// Upstream consulted on misses.
    upstream: U,
    /// Lifetime of stored entries.
    ttl: Duration,
}

impl<K: KeyValueStore, U: UpstreamSource> CacheAsideGateway<K, U> {
    /// Creates a gateway with the default TTL.
    #[must_use]
    pub const fn new(kv: K, upstream: U) -> Self {
        Self::with_ttl(kv, upstream, DEFAULT_CACHE_TTL)
    }

    /// Creates a gateway with an explicit TTL.
    #[must_use]
    pub const fn with_ttl(kv: K, upstream: U, ttl: Duration) -> Self {
        Self {
            kv,
            upstream,
            ttl,
        }
    }

    /// Returns the configured entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the payload for `key`, from cache when possible.
    ///
    /// # Errors
    ///
    /// See [`CacheAsideGateway::lookup`].
    pub fn fetch(&self, key: &CacheKey) -> Result<Value, CatalogError> {
        self.lookup(key).map(|lookup| lookup.value)
    }

    /// Returns the payload for `key` together with its cache outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the upstream reports the
    /// resource absent, [`CatalogError::UpstreamUnavailable`] when the
    /// upstream fails, and [`CatalogError::Store`] when the cache backend
    /// fails.
    pub fn lookup(&self, key: &CacheKey) -> Result<CacheLookup, CatalogError> {
        let cache_key = key.to_string();
        if let Some(bytes) = self.kv.get(&cache_key)?
            && let Ok(value) = serde_json::from_slice::<Value>(&bytes)
        {
            return Ok(CacheLookup {
                value,
                outcome: CacheOutcome::Hit,
            });
        }

        let value = self
            .upstream
            .fetch(key)?
            .ok_or_else(|| CatalogError::NotFound(format!("upstream resource {key} not found")))?;
        let bytes = serde_json::to_vec(&value)
            .map_err(|err| CatalogError::Store(format!("failed to encode {key}: {err}")))?;
        self.kv.set(&cache_key, &bytes, Some(self.ttl))?;
        Ok(CacheLookup {
            value,
            outcome: CacheOutcome::Miss,
        })
    }
}
