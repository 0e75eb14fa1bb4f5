// crates/certsuite-usage-providers/src/quay.rs
// ============================================================================
// Module: Quay Registry Client
// Description: RegistryClient over the Quay aggregated-logs endpoint.
// Purpose: Fetch per-day pull counts for one repository.
// Dependencies: certsuite-usage-core, reqwest, tracing, url
// ============================================================================

//! ## Overview
//! Issues `GET {base}/repository/{namespace}/{repository}/aggregatelogs` with
//! `starttime`/`endtime` in `MM/DD/YYYY` form and a bearer token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use certsuite_usage_core::AggregatedLogs;
use certsuite_usage_core::ClientError;
use certsuite_usage_core::FetchWindow;
use certsuite_usage_core::RegistryClient;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::http::HttpClientConfig;
use crate::http::endpoint;
use crate::http::get_json;
use crate::http::parse_base_url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default Quay API base URL.
pub const DEFAULT_QUAY_BASE_URL: &str = "https://quay.io/api/v1";

/// Quay client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct QuayClientConfig {
    /// API base URL.
    pub base_url: String,
    /// OAuth bearer token.
    pub bearer_token: String,
}

impl std::fmt::Debug for QuayClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuayClientConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Registry client for Quay.
pub struct QuayClient {
    /// Parsed API base URL.
    base_url: Url,
    /// OAuth bearer token.
    bearer_token: String,
    /// Maximum response size, in bytes.
    max_response_bytes: usize,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl QuayClient {
    /// Creates a Quay client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] when the token is empty, the base URL is
    /// invalid, or the HTTP client cannot be created.
    pub fn new(config: &QuayClientConfig, http: &HttpClientConfig) -> Result<Self, ClientError> {
        if config.bearer_token.trim().is_empty() {
            return Err(ClientError::Init("quay bearer token is empty".to_string()));
        }
        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            bearer_token: config.bearer_token.clone(),
            max_response_bytes: http.max_response_bytes,
            client: http.build_client()?,
        })
    }

    /// Returns the aggregated-logs URL for a repository and window.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] when the URL cannot be built.
    pub fn aggregated_logs_url(
        &self,
        namespace: &str,
        repository: &str,
        window: &FetchWindow,
    ) -> Result<Url, ClientError> {
        let mut url =
            endpoint(&self.base_url, &["repository", namespace, repository, "aggregatelogs"])?;
        url.query_pairs_mut()
            .append_pair("starttime", &window.start_param())
            .append_pair("endtime", &window.end_param());
        Ok(url)
    }
}

impl RegistryClient for QuayClient {
    fn aggregated_logs(
        &self,
        namespace: &str,
        repository: &str,
        window: &FetchWindow,
    ) -> Result<AggregatedLogs, ClientError> {
        let url = self.aggregated_logs_url(namespace, repository, window)?;
        debug!(url = %url, "requesting quay aggregated logs");
        get_json(self.client.get(url).bearer_auth(&self.bearer_token), self.max_response_bytes)
    }
}
