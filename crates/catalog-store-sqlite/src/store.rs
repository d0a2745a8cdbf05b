// crates/catalog-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Key-Value Store
// Description: Durable KeyValueStore backed by a single SQLite table.
// Purpose: Store byte values by key with optional absolute expiry.
// Dependencies: catalog-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! Entries live in `kv_entries(key, value, expires_at)`. Expiry is stored as
//! absolute unix milliseconds read from an injected [`Clock`], and expired
//! rows behave as absent on every read. Expired rows are purged on write.
//!
//! Connection access is serialized through a mutex, so each trait call is
//! atomic. Sequences of calls are not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use catalog_core::Clock;
use catalog_core::KeyValueStore;
use catalog_core::KvError;
use catalog_core::SystemClock;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` key-value store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for KvError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Maps a rusqlite error into a store error.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed key-value store.
///
/// # Invariants
/// - Expired entries are never returned.
/// - `SQLite` connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection.
    connection: Arc<Mutex<Connection>>,
    /// Time source for expiry.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl fmt::Debug for SqliteKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteKeyValueStore").field("config", &self.config).finish_non_exhaustive()
    }
}

impl SqliteKeyValueStore {
    /// Opens an `SQLite`-backed key-value store on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        Self::with_clock(config, SystemClock)
    }

    /// Opens an `SQLite`-backed key-value store driven by `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn with_clock(
        config: SqliteStoreConfig,
        clock: impl Clock + Send + Sync + 'static,
    ) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
            clock: Arc::new(clock),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Deletes every expired row and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the delete fails.
    pub fn purge_expired(&self) -> Result<usize, SqliteStoreError> {
        let now = self.now();
        let guard = self.lock()?;
        purge_expired_rows(&guard, now)
    }

    /// Acquires the connection lock.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))
    }

    /// Returns the current time as a column value.
    fn now(&self) -> i64 {
        to_column(self.clock.now_millis())
    }

    /// Returns the absolute expiry column value for a relative TTL.
    fn expiry(&self, ttl: Duration) -> Result<i64, SqliteStoreError> {
        if ttl.is_zero() {
            return Err(SqliteStoreError::Invalid("ttl must be greater than zero".to_string()));
        }
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Ok(to_column(self.clock.now_millis().saturating_add(ttl_ms)))
    }

    /// Loads the live value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, SqliteStoreError> {
        let now = self.now();
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT value FROM kv_entries
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_error(&err))
    }

    /// Writes `value` under `key`, purging expired rows first.
    fn store(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), SqliteStoreError> {
        let expires_at = ttl.map(|ttl| self.expiry(ttl)).transpose()?;
        let now = self.now();
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        purge_expired_rows(&tx, now)?;
        tx.execute(
            "INSERT INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )
        .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Removes `key`, returning its value if it was live.
    fn take(&self, key: &str) -> Result<Option<Vec<u8>>, SqliteStoreError> {
        let now = self.now();
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        let live: Option<Vec<u8>> = tx
            .query_row(
                "SELECT value FROM kv_entries
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(live)
    }

    /// Lists live keys starting with `prefix` in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SqliteStoreError> {
        let now = self.now();
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT key FROM kv_entries
                 WHERE key >= ?1 AND (expires_at IS NULL OR expires_at > ?2)
                 ORDER BY key",
            )
            .map_err(|err| db_error(&err))?;
        let rows = stmt
            .query_map(params![prefix, now], |row| row.get::<_, String>(0))
            .map_err(|err| db_error(&err))?;
        let mut keys = Vec::new();
        for row in rows {
            let key = row.map_err(|err| db_error(&err))?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key);
        }
        Ok(keys)
    }

    /// Updates the expiry of a live entry.
    fn touch(&self, key: &str, ttl: Duration) -> Result<bool, SqliteStoreError> {
        let expires_at = self.expiry(ttl)?;
        let now = self.now();
        let guard = self.lock()?;
        let updated = guard
            .execute(
                "UPDATE kv_entries SET expires_at = ?1
                 WHERE key = ?2 AND (expires_at IS NULL OR expires_at > ?3)",
                params![expires_at, key, now],
            )
            .map_err(|err| db_error(&err))?;
        Ok(updated > 0)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.load(key)?)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), KvError> {
        Ok(self.store(key, value, ttl)?)
    }

    fn delete(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.take(key)?)
    }

    fn exists(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.load(key)?.is_some())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        Ok(self.keys_with_prefix(prefix)?)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, KvError> {
        Ok(self.touch(key, ttl)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts unix milliseconds into an `INTEGER` column value.
fn to_column(millis: u64) -> i64 {
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// Deletes rows whose expiry is at or before `now`.
fn purge_expired_rows(connection: &Connection, now: i64) -> Result<usize, SqliteStoreError> {
    connection
        .execute(
            "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now],
        )
        .map_err(|err| db_error(&err))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    if path
        .components()
        .any(|component| component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(SqliteStoreError::Invalid(
            "store path contains an overlong component".to_string(),
        ));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_entries (
                    key TEXT PRIMARY KEY NOT NULL,
                    value BLOB NOT NULL,
                    expires_at INTEGER
                );
                CREATE INDEX IF NOT EXISTS idx_kv_entries_expires_at
                    ON kv_entries (expires_at);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {other}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))
}
