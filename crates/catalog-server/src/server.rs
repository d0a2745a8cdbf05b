// crates/catalog-server/src/server.rs
// ============================================================================
// Module: Catalog Server
// Description: Server bootstrap wiring stores, cache, and HTTP transport.
// Purpose: Build runtime state from configuration and serve HTTP requests.
// Dependencies: catalog-config, catalog-core, catalog-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! [`CatalogServer::from_config`] builds the key-value store, both record
//! stores, the cache-aside gateway, and the audit sink, seeds sample data when
//! enabled, and hands the shared [`ServerState`] to the axum router.
//!
//! Core calls are synchronous; handlers shift them onto a blocking context
//! when running on the multi-thread runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use catalog_config::CatalogConfig;
use catalog_config::KvStoreType;
use catalog_config::RecordBackend;
use catalog_core::Activity;
use catalog_core::CacheAsideGateway;
use catalog_core::Catalog;
use catalog_core::InMemoryKeyValueStore;
use catalog_core::InMemoryRecordStore;
use catalog_core::Item;
use catalog_core::KvRecordStore;
use catalog_core::Record;
use catalog_core::SharedKeyValueStore;
use catalog_core::SharedRecordStore;
use catalog_store_sqlite::SqliteKeyValueStore;
use tokio::net::TcpListener;

use crate::audit::CatalogAuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::routes;
use crate::seed;
use crate::upstream::HttpUpstream;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Engine over the shared item store.
pub type ItemCatalog = Catalog<Item, SharedRecordStore<Item>>;
/// Engine over the shared activity store.
pub type ActivityCatalog = Catalog<Activity, SharedRecordStore<Activity>>;
/// Cache-aside gateway for upstream entries.
pub type EntryGateway = CacheAsideGateway<SharedKeyValueStore, HttpUpstream>;

/// Shared state handed to every request handler.
pub struct ServerState {
    /// Item engine.
    pub items: ItemCatalog,
    /// Activity engine.
    pub activities: ActivityCatalog,
    /// Upstream entry gateway.
    pub entries: EntryGateway,
    /// Resource path served by `GET /entries`.
    pub default_path: String,
    /// Audit sink for request and cache events.
    pub audit: Arc<dyn CatalogAuditSink>,
}

// ============================================================================
// SECTION: Catalog Server
// ============================================================================

/// Catalog HTTP server instance.
pub struct CatalogServer {
    /// Listener address.
    bind: SocketAddr,
    /// Maximum accepted request body size.
    max_body_bytes: usize,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl CatalogServer {
    /// Builds a server from configuration.
    ///
    /// Builds a blocking HTTP client, so call it outside async contexts
    /// (for example through `spawn_blocking`).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or a backend
    /// cannot be initialized.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let kv = build_kv_store(config)?;
        let audit = build_audit_sink(config)?;
        Self::with_parts(config, kv, audit)
    }

    /// Builds a server over an explicit key-value store and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the upstream client cannot be built or
    /// seeding fails.
    pub fn with_parts(
        config: &CatalogConfig,
        kv: SharedKeyValueStore,
        audit: Arc<dyn CatalogAuditSink>,
    ) -> Result<Self, ServerError> {
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let items: ItemCatalog = Catalog::new(build_record_store(config, &kv));
        let activities: ActivityCatalog = Catalog::new(build_record_store(config, &kv));
        if config.records.seed {
            seed::seed(&items, seed::sample_items())
                .map_err(|err| ServerError::Init(format!("item seed failed: {err}")))?;
            seed::seed(&activities, seed::sample_activities())
                .map_err(|err| ServerError::Init(format!("activity seed failed: {err}")))?;
        }
        let upstream =
            HttpUpstream::new(&config.upstream).map_err(|err| ServerError::Init(err.to_string()))?;
        let entries = CacheAsideGateway::with_ttl(kv, upstream, config.cache.ttl());
        emit_cleartext_upstream_warning(config);
        Ok(Self {
            bind,
            max_body_bytes: config.server.max_body_bytes,
            state: Arc::new(ServerState {
                items,
                activities,
                entries,
                default_path: config.upstream.default_path.clone(),
                audit,
            }),
        })
    }

    /// Returns the shared handler state.
    #[must_use]
    pub const fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Returns the configured listener address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Builds the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(Arc::clone(&self.state), self.max_body_bytes)
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_on(listener).await
    }

    /// Serves requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the server fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the key-value store from configuration.
fn build_kv_store(config: &CatalogConfig) -> Result<SharedKeyValueStore, ServerError> {
    let store = match config.kv.store_type {
        KvStoreType::Memory => SharedKeyValueStore::from_store(InMemoryKeyValueStore::new()),
        KvStoreType::Sqlite => {
            let sqlite_config = config
                .kv
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite kv requires path".to_string()))?;
            let store = SqliteKeyValueStore::new(sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedKeyValueStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the record store for `R` from configuration.
fn build_record_store<R: Record>(
    config: &CatalogConfig,
    kv: &SharedKeyValueStore,
) -> SharedRecordStore<R> {
    match config.records.backend {
        RecordBackend::Memory => SharedRecordStore::from_store(InMemoryRecordStore::<R>::new()),
        RecordBackend::Kv => SharedRecordStore::from_store(KvRecordStore::<R, _>::new(kv.clone())),
    }
}

/// Builds the audit sink from configuration.
fn build_audit_sink(config: &CatalogConfig) -> Result<Arc<dyn CatalogAuditSink>, ServerError> {
    let audit = &config.server.audit;
    if !audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &audit.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path.trim()))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Warns when upstream lookups travel over cleartext HTTP.
fn emit_cleartext_upstream_warning(config: &CatalogConfig) {
    if config.upstream.allow_http && config.upstream.base_url.trim().starts_with("http://") {
        let _ = writeln!(
            std::io::stderr(),
            "catalog-server: WARNING: upstream.base_url uses cleartext http; cached payloads \
             are not integrity protected",
        );
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
