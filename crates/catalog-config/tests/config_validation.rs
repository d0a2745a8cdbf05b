//! Section validation tests for catalog-config.
// crates/catalog-config/tests/config_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate server, kv, cache, and upstream constraints.
// Purpose: Ensure inconsistent configuration is rejected before startup.
// =============================================================================

use std::time::Duration;

use catalog_config::CatalogConfig;
use catalog_config::ConfigError;
use catalog_store_sqlite::SqliteStoreMode;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<CatalogConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(ConfigError::Invalid(message)) => {
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Err(other) => Err(format!("expected invalid config, got {other}")),
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn server_bind_must_be_socket_address() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[server]\nbind = \"localhost\"\n"),
        "invalid server.bind address",
    )
}

#[test]
fn server_body_limit_must_be_positive() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[server]\nmax_body_bytes = 0\n"),
        "server.max_body_bytes must be greater than zero",
    )
}

#[test]
fn audit_path_must_be_non_empty() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[server.audit]\npath = \"  \"\n"),
        "server.audit.path must be non-empty",
    )
}

#[test]
fn memory_kv_rejects_path() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[kv]\ntype = \"memory\"\npath = \"catalog.db\"\n"),
        "memory kv must not set path",
    )
}

#[test]
fn sqlite_kv_requires_path() -> TestResult {
    assert_invalid(CatalogConfig::parse("[kv]\ntype = \"sqlite\"\n"), "sqlite kv requires path")
}

#[test]
fn sqlite_kv_carries_pragmas() -> TestResult {
    let config = CatalogConfig::parse(
        "[kv]\ntype = \"sqlite\"\npath = \"data/kv.db\"\njournal_mode = \"delete\"\n\
         busy_timeout_ms = 250\n",
    )
    .map_err(|err| err.to_string())?;
    let sqlite = config.kv.sqlite_config().ok_or("expected sqlite config")?;
    if sqlite.journal_mode != SqliteStoreMode::Delete || sqlite.busy_timeout_ms != 250 {
        return Err("sqlite pragmas were not carried over".to_string());
    }
    Ok(())
}

#[test]
fn unknown_kv_type_is_parse_error() -> TestResult {
    match CatalogConfig::parse("[kv]\ntype = \"redis\"\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn cache_ttl_must_be_positive() -> TestResult {
    assert_invalid(CatalogConfig::parse("[cache]\nttl_seconds = 0\n"), "cache.ttl_seconds")
}

#[test]
fn cache_ttl_converts_to_duration() -> TestResult {
    let config =
        CatalogConfig::parse("[cache]\nttl_seconds = 60\n").map_err(|err| err.to_string())?;
    if config.cache.ttl() != Duration::from_secs(60) {
        return Err("unexpected ttl".to_string());
    }
    Ok(())
}

#[test]
fn upstream_rejects_http_without_opt_in() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\nbase_url = \"http://127.0.0.1:9000\"\n"),
        "without allow_http",
    )
}

#[test]
fn upstream_allows_http_with_opt_in() -> TestResult {
    CatalogConfig::parse("[upstream]\nbase_url = \"http://127.0.0.1:9000\"\nallow_http = true\n")
        .map(|_| ())
        .map_err(|err| err.to_string())
}

#[test]
fn upstream_rejects_unsupported_scheme() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\nbase_url = \"ftp://example.com\"\n"),
        "unsupported scheme",
    )
}

#[test]
fn upstream_rejects_unparseable_url() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\nbase_url = \"not a url\"\n"),
        "upstream.base_url is invalid",
    )
}

#[test]
fn upstream_rejects_base_url_query() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\nbase_url = \"https://example.com/?q=1\"\n"),
        "query or fragment",
    )
}

#[test]
fn upstream_default_path_must_be_relative() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\ndefault_path = \"/fact\"\n"),
        "upstream.default_path must be relative",
    )
}

#[test]
fn upstream_default_path_rejects_traversal() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\ndefault_path = \"../secrets\"\n"),
        "upstream.default_path contains an empty or dot segment",
    )
}

#[test]
fn upstream_timeout_is_bounded() -> TestResult {
    assert_invalid(CatalogConfig::parse("[upstream]\ntimeout_ms = 10\n"), "upstream.timeout_ms")?;
    assert_invalid(
        CatalogConfig::parse("[upstream]\ntimeout_ms = 120000\n"),
        "upstream.timeout_ms",
    )
}

#[test]
fn upstream_response_limit_is_bounded() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\nmax_response_bytes = 0\n"),
        "upstream.max_response_bytes",
    )
}

#[test]
fn upstream_user_agent_must_be_non_empty() -> TestResult {
    assert_invalid(
        CatalogConfig::parse("[upstream]\nuser_agent = \"\"\n"),
        "upstream.user_agent must be non-empty",
    )
}
