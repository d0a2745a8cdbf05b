// crates/catalog-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Fixtures
// Description: Fake upstream, recording audit sink, and server spawning.
// Purpose: Run the HTTP transport end to end against local fixtures.
// Dependencies: catalog-server, tiny_http, tokio, reqwest
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared test helpers may be unused in some cases."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use catalog_config::CatalogConfig;
use catalog_core::InMemoryKeyValueStore;
use catalog_core::SharedKeyValueStore;
use catalog_server::CacheAuditEvent;
use catalog_server::CatalogAuditSink;
use catalog_server::CatalogServer;
use catalog_server::RequestAuditEvent;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Fake Upstream
// ============================================================================

/// Scripted upstream route: path, status, body.
pub type UpstreamRoute = (&'static str, u16, &'static str);

/// Local HTTP server answering from a fixed route table.
pub struct FakeUpstream {
    /// Base URL of the server, without a trailing slash.
    pub base_url: String,
    /// Number of requests received.
    hits: Arc<AtomicUsize>,
    /// User agents seen, in request order.
    user_agents: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    /// Starts the server on an ephemeral port; unknown paths answer 404.
    pub fn start(routes: Vec<UpstreamRoute>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let user_agents = Arc::new(Mutex::new(Vec::new()));
        let thread_hits = Arc::clone(&hits);
        let thread_agents = Arc::clone(&user_agents);
        thread::spawn(move || {
            for request in server.incoming_requests() {
                thread_hits.fetch_add(1, Ordering::SeqCst);
                if let Some(agent) =
                    request.headers().iter().find(|header| header.field.equiv("User-Agent"))
                {
                    thread_agents.lock().unwrap().push(agent.value.as_str().to_string());
                }
                let path = request.url().trim_start_matches('/').to_string();
                let (status, body) = routes
                    .iter()
                    .find(|(route, _, _)| *route == path)
                    .map_or((404, ""), |(_, status, body)| (*status, *body));
                let mut response = Response::from_string(body).with_status_code(status);
                if status == 302 {
                    let location = Header::from_bytes(&b"Location"[..], &b"/elsewhere"[..]).unwrap();
                    response.add_header(location);
                }
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            hits,
            user_agents,
        }
    }

    /// Returns the number of requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Returns the user agents seen so far.
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Request events.
    pub requests: Mutex<Vec<RequestAuditEvent>>,
    /// Cache events.
    pub cache: Mutex<Vec<CacheAuditEvent>>,
}

impl CatalogAuditSink for RecordingAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_cache(&self, event: &CacheAuditEvent) {
        self.cache.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Returns an in-memory config pointing at `upstream_url`.
pub fn test_config(upstream_url: &str) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.server.bind = "127.0.0.1:0".to_string();
    config.server.audit.enabled = false;
    config.upstream.base_url = upstream_url.to_string();
    config.upstream.allow_http = true;
    config.upstream.timeout_ms = 2_000;
    config
}

/// Running server under test.
pub struct TestServer {
    /// Base URL of the running server.
    pub base: String,
    /// HTTP client for requests.
    pub client: reqwest::Client,
    /// Audit events recorded by the server.
    pub audit: Arc<RecordingAuditSink>,
}

impl TestServer {
    /// Returns the absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

/// Spawns a server over a fresh in-memory key-value store.
pub async fn spawn_server(config: CatalogConfig) -> TestServer {
    spawn_server_with_kv(config, SharedKeyValueStore::from_store(InMemoryKeyValueStore::new()))
        .await
}

/// Spawns a server over `kv`.
pub async fn spawn_server_with_kv(config: CatalogConfig, kv: SharedKeyValueStore) -> TestServer {
    let audit = Arc::new(RecordingAuditSink::default());
    let sink: Arc<dyn CatalogAuditSink> = Arc::clone(&audit) as Arc<dyn CatalogAuditSink>;
    let server = tokio::task::spawn_blocking(move || CatalogServer::with_parts(&config, kv, sink))
        .await
        .unwrap()
        .unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_on(listener));
    TestServer {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        audit,
    }
}
