// crates/catalog-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Starting point for operators and a fixture for tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Ships a complete `catalog.toml` that passes validation, printed by
//! `catalog config example`.

// ============================================================================
// SECTION: Example Config
// ============================================================================

/// Returns a canonical example `catalog.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:5050"
max_body_bytes = 1048576

[server.audit]
enabled = true
# path = "catalog-audit.jsonl"

# Key-value store shared by records (backend = "kv") and the cache.
[kv]
type = "sqlite"
path = "catalog.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[records]
backend = "kv"
seed = true

[cache]
ttl_seconds = 1800

[upstream]
base_url = "https://catfact.ninja"
default_path = "fact"
timeout_ms = 5000
max_response_bytes = 1048576
allow_http = false
user_agent = "catalog/0.1"
"#,
    )
}
