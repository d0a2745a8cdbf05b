// crates/catalog-core/tests/cache_aside.rs
// ============================================================================
// Module: Cache-Aside Gateway Tests
// Description: Hit, miss, expiry, and failure handling of the gateway.
// Purpose: Ensure upstream calls happen only on misses and errors are not cached.
// ============================================================================

//! ## Overview
//! Drives the gateway with a scripted upstream and a manual clock so expiry
//! is deterministic.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use catalog_core::CacheAsideGateway;
use catalog_core::CacheKey;
use catalog_core::CacheOutcome;
use catalog_core::CatalogError;
use catalog_core::DEFAULT_CACHE_TTL;
use catalog_core::InMemoryKeyValueStore;
use catalog_core::KeyValueStore;
use catalog_core::ManualClock;
use catalog_core::UpstreamError;
use catalog_core::UpstreamSource;
use serde_json::Value;
use serde_json::json;

/// Upstream that replays a fixed response and counts calls.
#[derive(Clone)]
struct ScriptedUpstream {
    response: Arc<Mutex<Result<Option<Value>, UpstreamError>>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedUpstream {
    fn new(response: Result<Option<Value>, UpstreamError>) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn respond(&self, response: Result<Option<Value>, UpstreamError>) {
        *self.response.lock().unwrap() = response;
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl UpstreamSource for ScriptedUpstream {
    fn fetch(&self, _key: &CacheKey) -> Result<Option<Value>, UpstreamError> {
        *self.calls.lock().unwrap() += 1;
        self.response.lock().unwrap().clone()
    }
}

fn fact_key() -> CacheKey {
    CacheKey::new("entries", "fact")
}

#[test]
fn cache_key_renders_class_and_id() {
    assert_eq!(fact_key().to_string(), "entries:fact");
}

#[test]
fn miss_then_hit_calls_upstream_once() {
    let kv = InMemoryKeyValueStore::new();
    let upstream = ScriptedUpstream::new(Ok(Some(json!({"fact": "cats sleep", "length": 10}))));
    let gateway = CacheAsideGateway::new(kv.clone(), upstream.clone());

    let first = gateway.lookup(&fact_key()).unwrap();
    assert_eq!(first.outcome, CacheOutcome::Miss);
    let second = gateway.lookup(&fact_key()).unwrap();
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(first.value, second.value);
    assert_eq!(upstream.calls(), 1);
    assert!(kv.exists("entries:fact").unwrap());
}

#[test]
fn entry_is_refetched_after_ttl() {
    let clock = ManualClock::new(0);
    let kv = InMemoryKeyValueStore::with_clock(clock.clone());
    let upstream = ScriptedUpstream::new(Ok(Some(json!({"fact": "one"}))));
    let gateway = CacheAsideGateway::new(kv, upstream.clone());
    assert_eq!(gateway.ttl(), DEFAULT_CACHE_TTL);

    assert_eq!(gateway.fetch(&fact_key()).unwrap(), json!({"fact": "one"}));
    upstream.respond(Ok(Some(json!({"fact": "two"}))));

    clock.advance(DEFAULT_CACHE_TTL - Duration::from_secs(1));
    assert_eq!(gateway.fetch(&fact_key()).unwrap(), json!({"fact": "one"}));

    clock.advance(Duration::from_secs(1));
    assert_eq!(gateway.fetch(&fact_key()).unwrap(), json!({"fact": "two"}));
    assert_eq!(upstream.calls(), 2);
}

#[test]
fn upstream_not_found_is_not_cached() {
    let kv = InMemoryKeyValueStore::new();
    let upstream = ScriptedUpstream::new(Ok(None));
    let gateway = CacheAsideGateway::new(kv.clone(), upstream.clone());

    assert!(matches!(gateway.fetch(&fact_key()), Err(CatalogError::NotFound(_))));
    assert!(matches!(gateway.fetch(&fact_key()), Err(CatalogError::NotFound(_))));
    assert_eq!(upstream.calls(), 2);
    assert!(!kv.exists("entries:fact").unwrap());
}

#[test]
fn upstream_failure_is_unavailable() {
    let kv = InMemoryKeyValueStore::new();
    let upstream = ScriptedUpstream::new(Err(UpstreamError::Unavailable("timeout".to_string())));
    let gateway = CacheAsideGateway::new(kv.clone(), upstream);
    assert!(matches!(gateway.fetch(&fact_key()), Err(CatalogError::UpstreamUnavailable(_))));
    assert!(kv.scan("").unwrap().is_empty());
}

#[test]
fn corrupt_cache_entry_is_treated_as_miss() {
    let kv = InMemoryKeyValueStore::new();
    kv.set("entries:fact", b"{broken", Some(Duration::from_secs(60))).unwrap();
    let upstream = ScriptedUpstream::new(Ok(Some(json!({"fact": "fresh"}))));
    let gateway = CacheAsideGateway::new(kv.clone(), upstream.clone());

    let lookup = gateway.lookup(&fact_key()).unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Miss);
    assert_eq!(lookup.value, json!({"fact": "fresh"}));
    let stored: Value = serde_json::from_slice(&kv.get("entries:fact").unwrap().unwrap()).unwrap();
    assert_eq!(stored, json!({"fact": "fresh"}));
}
