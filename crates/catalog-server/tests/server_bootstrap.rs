// crates/catalog-server/tests/server_bootstrap.rs
// ============================================================================
// Module: Server Bootstrap Tests
// Description: Tests for building a server from configuration.
// Purpose: Validate sqlite-backed records, idempotent seeding, and audit files.
// Dependencies: catalog-server, catalog-config, tempfile, tokio
// ============================================================================

//! Tests for building a server from configuration.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;

use catalog_config::CatalogConfig;
use catalog_config::KvStoreType;
use catalog_config::RecordBackend;
use catalog_core::ItemPatch;
use catalog_core::RecordId;
use catalog_server::CatalogServer;
use catalog_server::ServerError;
use serde_json::Value;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sqlite_config(dir: &Path) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.server.bind = "127.0.0.1:0".to_string();
    config.server.audit.enabled = false;
    config.kv.store_type = KvStoreType::Sqlite;
    config.kv.path = Some(dir.join("catalog.db"));
    config.records.backend = RecordBackend::Kv;
    config.upstream.base_url = "http://127.0.0.1:9".to_string();
    config.upstream.allow_http = true;
    config
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn sqlite_records_survive_restart_and_seed_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());

    let server = CatalogServer::from_config(&config).unwrap();
    let patch = ItemPatch {
        count: Some(42),
        ..ItemPatch::default()
    };
    server.state().items.update(RecordId::new(0), &patch).unwrap();
    assert_eq!(server.state().activities.list().unwrap().len(), 4);
    drop(server);

    let server = CatalogServer::from_config(&config).unwrap();
    let items = server.state().items.list().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].name, "Hammer");
    assert_eq!(items[0].count, 42);
    assert_eq!(server.state().activities.list().unwrap().len(), 4);
}

#[test]
fn seeding_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = sqlite_config(dir.path());
    config.records.seed = false;

    let server = CatalogServer::from_config(&config).unwrap();
    assert!(server.state().items.list().unwrap().is_empty());
    assert!(server.state().activities.list().unwrap().is_empty());
}

#[test]
fn invalid_config_is_reported_as_config_error() {
    let mut config = CatalogConfig::default();
    config.kv.store_type = KvStoreType::Sqlite;

    let Err(err) = CatalogServer::from_config(&config) else {
        panic!("expected config error");
    };
    assert!(matches!(err, ServerError::Config(_)));
    assert!(err.to_string().starts_with("config error:"));
}

#[test]
fn unparseable_bind_is_reported_as_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = sqlite_config(dir.path());
    config.server.bind = "localhost".to_string();

    let Err(err) = CatalogServer::from_config(&config) else {
        panic!("expected config error");
    };
    assert!(matches!(err, ServerError::Config(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn requests_are_appended_to_audit_file() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.log");
    let mut config = sqlite_config(dir.path());
    config.server.audit.enabled = true;
    config.server.audit.path = Some(audit_path.display().to_string());

    let server = tokio::task::spawn_blocking(move || CatalogServer::from_config(&config))
        .await
        .unwrap()
        .unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_on(listener));

    let response = reqwest::get(format!("http://{addr}/items/1")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let response = reqwest::get(format!("http://{addr}/nowhere")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let contents = std::fs::read_to_string(&audit_path).unwrap();
    let events: Vec<Value> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "catalog_request");
    assert_eq!(events[0]["route"], "/items/{id}");
    assert_eq!(events[0]["record_id"], 1);
    assert_eq!(events[1]["status"], 404);
    assert_eq!(events[1]["error_kind"], "not_found");
}
