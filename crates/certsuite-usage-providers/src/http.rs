// crates/certsuite-usage-providers/src/http.rs
// ============================================================================
// Module: HTTP Transport
// Description: Shared blocking HTTP settings and JSON response handling.
// Purpose: Keep timeout, redirect, and size limits identical across clients.
// Dependencies: certsuite-usage-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! Both API clients build their `reqwest` client here and decode responses
//! through [`get_json`], which enforces the response size limit and turns
//! non-success statuses into [`ClientError::Status`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use certsuite_usage_core::ClientError;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters of an error body kept in [`ClientError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Transport settings shared by the API clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: concat!("certsuite-usage/", env!("CARGO_PKG_VERSION")).to_string(),
            max_response_bytes: 16 * 1024 * 1024,
        }
    }
}

impl HttpClientConfig {
    /// Builds a blocking client with these settings and redirects disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] when the client cannot be created.
    pub fn build_client(&self) -> Result<Client, ClientError> {
        Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .user_agent(self.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ClientError::Init(format!("http client build failed: {err}")))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an API base URL.
pub(crate) fn parse_base_url(value: &str) -> Result<Url, ClientError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ClientError::Init(format!("invalid base url {value:?}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Init(format!("unsupported base url scheme: {}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(ClientError::Init(format!("base url cannot have paths: {value:?}")));
    }
    Ok(url)
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ClientError::Init(format!("base url cannot have paths: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends `request` and decodes a JSON body of type `T`.
pub(crate) fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    max_bytes: usize,
) -> Result<T, ClientError> {
    let mut response = request.send().map_err(|err| ClientError::Request(err.to_string()))?;
    let status = response.status();
    let body = read_response_limited(&mut response, max_bytes)?;
    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }
    serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, ClientError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ClientError::Request("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(ClientError::Request(format!(
            "response exceeds size limit: {expected} bytes (max {max_bytes})"
        )));
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| ClientError::Request(format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(ClientError::Request(format!(
            "response exceeds size limit (max {max_bytes} bytes)"
        )));
    }
    Ok(buf)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
