// crates/catalog-server/src/upstream.rs
// ============================================================================
// Module: HTTP Upstream
// Description: Blocking HTTP client for cache-aside upstream lookups.
// Purpose: Fetch JSON resources from the configured base URL with limits.
// Dependencies: catalog-config, catalog-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpUpstream`] issues bounded GET requests to `{base_url}/{resource}`.
//! Redirects are not followed and response bodies are read up to a hard size
//! limit. A 404 or an empty body means the resource does not exist; any other
//! failure surfaces as [`UpstreamError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;

use catalog_config::UpstreamConfig;
use catalog_config::validate_resource_path;
use catalog_core::CacheKey;
use catalog_core::UpstreamError;
use catalog_core::UpstreamSource;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde_json::Value;

// ============================================================================
// SECTION: Upstream
// ============================================================================

/// Upstream source backed by a blocking HTTP client.
///
/// # Invariants
/// - Only `http` and `https` base URLs are accepted; `http` requires opt-in.
/// - Redirects are not followed.
/// - Bodies larger than `max_response_bytes` fail closed.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    /// Base URL with a trailing slash so resource paths join beneath it.
    base: Url,
    /// Maximum response size in bytes.
    max_response_bytes: usize,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpUpstream {
    /// Builds an upstream client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Unavailable`] when the base URL is unusable or
    /// the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut base = Url::parse(config.base_url.trim())
            .map_err(|err| UpstreamError::Unavailable(format!("invalid base url: {err}")))?;
        match base.scheme() {
            "https" => {}
            "http" if config.allow_http => {}
            _ => return Err(UpstreamError::Unavailable("unsupported url scheme".to_string())),
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| UpstreamError::Unavailable("http client build failed".to_string()))?;
        Ok(Self {
            base,
            max_response_bytes: config.max_response_bytes,
            client,
        })
    }

    /// Returns the URL requested for `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Unavailable`] when the resource path is not a
    /// plain relative path.
    pub fn resource_url(&self, resource: &str) -> Result<Url, UpstreamError> {
        validate_resource_path(resource).map_err(|reason| {
            UpstreamError::Unavailable(format!("resource path {reason}"))
        })?;
        self.base
            .join(resource)
            .map_err(|err| UpstreamError::Unavailable(format!("invalid resource url: {err}")))
    }
}

impl UpstreamSource for HttpUpstream {
    fn fetch(&self, key: &CacheKey) -> Result<Option<Value>, UpstreamError> {
        let url = self.resource_url(&key.id)?;
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| UpstreamError::Unavailable(format!("request to {url} failed: {err}")))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_redirection() {
            return Err(UpstreamError::Unavailable("http redirect not allowed".to_string()));
        }
        if !status.is_success() {
            return Err(UpstreamError::Unavailable(format!("upstream returned status {status}")));
        }
        let body = read_response_limited(&mut response, self.max_response_bytes)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|err| UpstreamError::Malformed(format!("invalid json from {url}: {err}")))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, UpstreamError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| UpstreamError::Unavailable("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(UpstreamError::Unavailable("http response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let mut handle = response.take(max_bytes_u64.saturating_add(1));
    handle
        .read_to_end(&mut buf)
        .map_err(|_| UpstreamError::Unavailable("failed to read response".to_string()))?;
    if buf.len() > max_bytes {
        return Err(UpstreamError::Unavailable("http response exceeds size limit".to_string()));
    }
    Ok(buf)
}
