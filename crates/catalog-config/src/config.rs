// crates/catalog-config/src/config.rs
// ============================================================================
// Module: Catalog Configuration
// Description: Configuration loading and validation for the catalog service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: catalog-core, catalog-store-sqlite, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file yields an in-memory service
//! that caches `https://catfact.ninja/fact`. Invalid configuration fails
//! closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use catalog_core::DEFAULT_CACHE_TTL;
use catalog_store_sqlite::SqliteStoreConfig;
use catalog_store_sqlite::SqliteStoreMode;
use catalog_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "catalog.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CATALOG_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default server bind address.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:5050";
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default `SQLite` busy timeout in milliseconds.
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum cache TTL in seconds (30 days).
pub(crate) const MAX_CACHE_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;
/// Default upstream base URL.
pub(crate) const DEFAULT_UPSTREAM_BASE_URL: &str = "https://catfact.ninja";
/// Default upstream resource path.
pub(crate) const DEFAULT_UPSTREAM_PATH: &str = "fact";
/// Default upstream request timeout in milliseconds.
pub(crate) const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5_000;
/// Minimum upstream request timeout in milliseconds.
pub(crate) const MIN_UPSTREAM_TIMEOUT_MS: u64 = 100;
/// Maximum upstream request timeout in milliseconds.
pub(crate) const MAX_UPSTREAM_TIMEOUT_MS: u64 = 60_000;
/// Default maximum upstream response size in bytes.
pub(crate) const DEFAULT_UPSTREAM_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Maximum allowed upstream response size in bytes.
pub(crate) const MAX_UPSTREAM_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// Maximum length of an upstream resource path.
pub(crate) const MAX_RESOURCE_PATH_LENGTH: usize = 256;
/// Default upstream user agent.
pub(crate) const DEFAULT_USER_AGENT: &str = "catalog/0.1";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Catalog service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Key-value store configuration.
    #[serde(default)]
    pub kv: KvConfig,
    /// Record storage configuration.
    #[serde(default)]
    pub records: RecordsConfig,
    /// Cache-aside configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upstream lookup configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl CatalogConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then `CATALOG_CONFIG`, then
    /// `catalog.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.kv.validate()?;
        self.cache.validate()?;
        self.upstream.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid server.bind address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        self.audit.validate()
    }
}

/// Audit logging configuration for server requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Key-Value Store
// ============================================================================

/// Key-value store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KvStoreType {
    /// In-process store; contents are lost on restart.
    #[default]
    Memory,
    /// `SQLite`-backed durable store.
    Sqlite,
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: KvStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            store_type: KvStoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl KvConfig {
    /// Returns the `SQLite` store configuration when the sqlite backend is set.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (KvStoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates key-value store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            KvStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory kv must not set path".to_string()));
                }
                Ok(())
            }
            KvStoreType::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite kv requires path".to_string()))?;
                validate_path_string("kv.path", &path.to_string_lossy())
            }
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Record storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordBackend {
    /// Mutex-guarded in-process map.
    #[default]
    Memory,
    /// One key-value entry per record in the configured kv store.
    Kv,
}

/// Record storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsConfig {
    /// Record storage backend.
    #[serde(default)]
    pub backend: RecordBackend,
    /// Insert sample records at startup, skipping ids already present.
    #[serde(default = "default_seed")]
    pub seed: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: RecordBackend::default(),
            seed: default_seed(),
        }
    }
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cache-aside configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of cached upstream payloads in seconds.
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    /// Returns the configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Validates cache configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_seconds == 0 || self.ttl_seconds > MAX_CACHE_TTL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_seconds must be within 1..={MAX_CACHE_TTL_SECONDS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Upstream
// ============================================================================

/// Upstream lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL prefixed to every resource path.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Resource path served by `GET /entries`.
    #[serde(default = "default_upstream_path")]
    pub default_path: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_upstream_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow cleartext `http://` base URLs.
    #[serde(default)]
    pub allow_http: bool,
    /// User agent sent with upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            default_path: default_upstream_path(),
            timeout_ms: default_upstream_timeout_ms(),
            max_response_bytes: default_upstream_max_response_bytes(),
            allow_http: false,
            user_agent: default_user_agent(),
        }
    }
}

impl UpstreamConfig {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates upstream configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|err| ConfigError::Invalid(format!("upstream.base_url is invalid: {err}")))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            "http" => {
                return Err(ConfigError::Invalid(
                    "upstream.base_url uses http:// without allow_http".to_string(),
                ));
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "upstream.base_url has unsupported scheme: {other}"
                )));
            }
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "upstream.base_url must not include a query or fragment".to_string(),
            ));
        }
        validate_resource_path(&self.default_path)
            .map_err(|reason| ConfigError::Invalid(format!("upstream.default_path {reason}")))?;
        if !(MIN_UPSTREAM_TIMEOUT_MS ..= MAX_UPSTREAM_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "upstream.timeout_ms must be within \
                 {MIN_UPSTREAM_TIMEOUT_MS}..={MAX_UPSTREAM_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0
            || self.max_response_bytes > MAX_UPSTREAM_MAX_RESPONSE_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "upstream.max_response_bytes must be within 1..={MAX_UPSTREAM_MAX_RESPONSE_BYTES}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Checks that an upstream resource path is a plain relative path.
///
/// # Errors
///
/// Returns a human-readable reason when the path is empty, absolute,
/// overlong, contains dot segments, or carries a query or fragment.
pub fn validate_resource_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("must be non-empty".to_string());
    }
    if path.len() > MAX_RESOURCE_PATH_LENGTH {
        return Err(format!("exceeds {MAX_RESOURCE_PATH_LENGTH} bytes"));
    }
    if path.starts_with('/') {
        return Err("must be relative".to_string());
    }
    if path.contains(['?', '#', '\\']) || path.chars().any(char::is_control) {
        return Err("contains a reserved character".to_string());
    }
    if path.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err("contains an empty or dot segment".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default audit enablement.
const fn default_audit_enabled() -> bool {
    true
}

/// Returns the default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default seeding behavior.
const fn default_seed() -> bool {
    true
}

/// Returns the default cache TTL in seconds.
const fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

/// Returns the default upstream base URL.
fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

/// Returns the default upstream resource path.
fn default_upstream_path() -> String {
    DEFAULT_UPSTREAM_PATH.to_string()
}

/// Returns the default upstream timeout.
const fn default_upstream_timeout_ms() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_MS
}

/// Returns the default upstream response size limit.
const fn default_upstream_max_response_bytes() -> usize {
    DEFAULT_UPSTREAM_MAX_RESPONSE_BYTES
}

/// Returns the default upstream user agent.
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use super::*;

    #[test]
    fn resource_paths_reject_traversal() {
        assert!(validate_resource_path("fact").is_ok());
        assert!(validate_resource_path("breeds/list").is_ok());
        assert!(validate_resource_path("../admin").is_err());
        assert!(validate_resource_path("/fact").is_err());
        assert!(validate_resource_path("fact?limit=1").is_err());
        assert!(validate_resource_path("a//b").is_err());
    }

    #[test]
    fn sqlite_config_requires_sqlite_type() {
        let mut kv = KvConfig {
            path: Some(PathBuf::from("catalog.db")),
            ..KvConfig::default()
        };
        assert!(kv.sqlite_config().is_none());
        kv.store_type = KvStoreType::Sqlite;
        assert_eq!(kv.sqlite_config().unwrap().path, PathBuf::from("catalog.db"));
    }
}
