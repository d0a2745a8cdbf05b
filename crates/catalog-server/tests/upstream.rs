// crates/catalog-server/tests/upstream.rs
// ============================================================================
// Module: HTTP Upstream Tests
// Description: Tests for the blocking upstream client.
// Purpose: Validate URL policy, status mapping, and response limits.
// Dependencies: catalog-server, catalog-config, catalog-core, tiny_http
// ============================================================================

//! Tests for the blocking upstream client.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use catalog_config::UpstreamConfig;
use catalog_core::CacheKey;
use catalog_core::UpstreamError;
use catalog_core::UpstreamSource;
use catalog_server::HttpUpstream;
use serde_json::json;

use crate::common::FakeUpstream;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config(base_url: &str) -> UpstreamConfig {
    UpstreamConfig {
        base_url: base_url.to_string(),
        allow_http: true,
        timeout_ms: 2_000,
        ..UpstreamConfig::default()
    }
}

fn fetch(upstream: &HttpUpstream, resource: &str) -> Result<Option<serde_json::Value>, UpstreamError> {
    upstream.fetch(&CacheKey::new("entries", resource))
}

// ============================================================================
// SECTION: URL Policy
// ============================================================================

#[test]
fn cleartext_base_url_requires_opt_in() {
    let mut upstream_config = config("http://127.0.0.1:9");
    upstream_config.allow_http = false;
    let err = HttpUpstream::new(&upstream_config).unwrap_err();
    assert!(matches!(err, UpstreamError::Unavailable(_)));
}

#[test]
fn non_http_scheme_is_rejected() {
    let err = HttpUpstream::new(&config("ftp://example.com")).unwrap_err();
    assert!(matches!(err, UpstreamError::Unavailable(_)));
}

#[test]
fn resource_url_joins_beneath_base_path() {
    let upstream = HttpUpstream::new(&config("https://api.example.com/v1")).unwrap();
    let url = upstream.resource_url("facts/1").unwrap();
    assert_eq!(url.as_str(), "https://api.example.com/v1/facts/1");
}

#[test]
fn resource_url_rejects_escaping_paths() {
    let upstream = HttpUpstream::new(&config("https://api.example.com/v1/")).unwrap();
    for resource in ["../admin", "/facts", "facts?x=1", "https://evil.example/x"] {
        assert!(upstream.resource_url(resource).is_err(), "accepted {resource}");
    }
}

// ============================================================================
// SECTION: Fetch
// ============================================================================

#[test]
fn fetch_parses_json_and_sends_user_agent() {
    let server = FakeUpstream::start(vec![("api/fact", 200, r#"{"fact":"purr"}"#)]);
    let mut upstream_config = config(&format!("{}/api", server.base_url));
    upstream_config.user_agent = "catalog-test/1".to_string();
    let upstream = HttpUpstream::new(&upstream_config).unwrap();

    let value = fetch(&upstream, "fact").unwrap();
    assert_eq!(value, Some(json!({"fact": "purr"})));
    assert_eq!(server.user_agents(), vec!["catalog-test/1".to_string()]);
}

#[test]
fn not_found_and_blank_bodies_are_absent() {
    let server = FakeUpstream::start(vec![("blank", 200, "  \n")]);
    let upstream = HttpUpstream::new(&config(&server.base_url)).unwrap();

    assert_eq!(fetch(&upstream, "missing").unwrap(), None);
    assert_eq!(fetch(&upstream, "blank").unwrap(), None);
}

#[test]
fn invalid_json_is_malformed() {
    let server = FakeUpstream::start(vec![("fact", 200, "{\"fact\":")]);
    let upstream = HttpUpstream::new(&config(&server.base_url)).unwrap();

    let err = fetch(&upstream, "fact").unwrap_err();
    assert!(matches!(err, UpstreamError::Malformed(_)));
}

#[test]
fn server_errors_and_redirects_are_unavailable() {
    let server = FakeUpstream::start(vec![("broken", 500, "{}"), ("moved", 302, "")]);
    let upstream = HttpUpstream::new(&config(&server.base_url)).unwrap();

    let err = fetch(&upstream, "broken").unwrap_err();
    assert!(matches!(err, UpstreamError::Unavailable(_)));
    let err = fetch(&upstream, "moved").unwrap_err();
    assert_eq!(err, UpstreamError::Unavailable("http redirect not allowed".to_string()));
    assert_eq!(server.hits(), 2);
}

#[test]
fn oversized_response_is_rejected() {
    let body = r#"{"fact":"this payload is longer than the configured limit"}"#;
    let server = FakeUpstream::start(vec![("fact", 200, body)]);
    let mut upstream_config = config(&server.base_url);
    upstream_config.max_response_bytes = 16;
    let upstream = HttpUpstream::new(&upstream_config).unwrap();

    let err = fetch(&upstream, "fact").unwrap_err();
    assert_eq!(err, UpstreamError::Unavailable("http response exceeds size limit".to_string()));
}

#[test]
fn unreachable_upstream_is_unavailable() {
    let upstream = HttpUpstream::new(&config("http://127.0.0.1:9")).unwrap();
    let err = fetch(&upstream, "fact").unwrap_err();
    assert!(matches!(err, UpstreamError::Unavailable(_)));
}
