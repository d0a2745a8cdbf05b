// crates/catalog-server/src/lib.rs
// ============================================================================
// Module: Catalog Server Library
// Description: HTTP transport, upstream client, audit sinks, and bootstrap.
// Purpose: Serve the catalog engine and cache-aside gateway over HTTP.
// Dependencies: axum, catalog-config, catalog-core, catalog-store-sqlite, reqwest, tokio
// ============================================================================

//! ## Overview
//! `catalog-server` wires the synchronous catalog core to an axum router.
//! Records and cached upstream entries share one configured key-value store;
//! every request is recorded through a [`CatalogAuditSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod routes;
pub mod seed;
pub mod server;
pub mod upstream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::CacheAuditEvent;
pub use audit::CacheAuditOutcome;
pub use audit::CatalogAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditEventParams;
pub use audit::RequestOutcome;
pub use audit::StderrAuditSink;
pub use routes::ActivityChangeQuery;
pub use routes::CACHE_STATUS_HEADER;
pub use routes::ENTRY_CACHE_CLASS;
pub use routes::ItemQuery;
pub use server::CatalogServer;
pub use server::ServerError;
pub use server::ServerState;
pub use upstream::HttpUpstream;
