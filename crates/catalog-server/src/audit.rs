// crates/catalog-server/src/audit.rs
// ============================================================================
// Module: Catalog Audit Logging
// Description: Structured audit events for catalog request handling.
// Purpose: Emit JSON-line audit logs without hard logging dependencies.
// Dependencies: catalog-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every handled request produces one [`RequestAuditEvent`]; every cache-aside
//! lookup also produces a [`CacheAuditEvent`]. Sinks serialize events as JSON
//! lines to stderr or to an append-only file. Payload bodies are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use catalog_core::CacheOutcome;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request succeeded.
    Ok,
    /// Request failed.
    Error,
}

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: &'static str,
    /// Route template, e.g. `/items/{id}`.
    pub route: &'static str,
    /// Response status code.
    pub status: u16,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Identifier of the record the request touched, when known.
    pub record_id: Option<u64>,
}

/// Cache lookup outcome, including failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheAuditOutcome {
    /// Served from a live cache entry.
    Hit,
    /// Fetched from the upstream and stored.
    Miss,
    /// Lookup failed.
    Error,
}

impl From<CacheOutcome> for CacheAuditOutcome {
    fn from(outcome: CacheOutcome) -> Self {
        match outcome {
            CacheOutcome::Hit => Self::Hit,
            CacheOutcome::Miss => Self::Miss,
        }
    }
}

/// Cache-aside audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct CacheAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Cache key, `"<class>:<id>"`.
    pub key: String,
    /// Lookup outcome.
    pub outcome: CacheAuditOutcome,
    /// Normalized error kind label on failure.
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct a request audit event.
pub struct RequestAuditEventParams {
    /// HTTP method.
    pub method: &'static str,
    /// Route template.
    pub route: &'static str,
    /// Response status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Identifier of the record the request touched.
    pub record_id: Option<u64>,
}

impl RequestAuditEvent {
    /// Creates a new request audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        let outcome =
            if params.error_kind.is_some() { RequestOutcome::Error } else { RequestOutcome::Ok };
        Self {
            event: "catalog_request",
            timestamp_ms: now_ms(),
            method: params.method,
            route: params.route,
            status: params.status,
            outcome,
            error_kind: params.error_kind,
            record_id: params.record_id,
        }
    }
}

impl CacheAuditEvent {
    /// Creates a new cache audit event with a consistent timestamp.
    #[must_use]
    pub fn new(
        key: String,
        outcome: CacheAuditOutcome,
        error_kind: Option<&'static str>,
    ) -> Self {
        Self {
            event: "catalog_cache",
            timestamp_ms: now_ms(),
            key,
            outcome,
            error_kind,
        }
    }
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for catalog events.
pub trait CatalogAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &RequestAuditEvent);

    /// Record a cache audit event.
    fn record_cache(&self, _event: &CacheAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl CatalogAuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_cache(&self, event: &CacheAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl CatalogAuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_cache(&self, event: &CacheAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl CatalogAuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}
