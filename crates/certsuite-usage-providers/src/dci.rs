// crates/certsuite-usage-providers/src/dci.rs
// ============================================================================
// Module: DCI Client
// Description: CiClient over the DCI jobs endpoint.
// Purpose: Page through recent jobs with embedded components and results.
// Dependencies: certsuite-usage-core, reqwest, time, tracing, url
// ============================================================================

//! ## Overview
//! Jobs are requested newest first. Paging stops at the first short or empty
//! page, or at the first job created before the cutoff; jobs older than the
//! cutoff are dropped from the returned page. Jobs whose creation time cannot
//! be parsed are passed through for the aggregator to judge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use certsuite_usage_core::CiClient;
use certsuite_usage_core::ClientError;
use certsuite_usage_core::JobsPage;
use certsuite_usage_core::parse_ci_timestamp;
use reqwest::blocking::Client;
use time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use tracing::warn;
use url::Url;

use crate::http::HttpClientConfig;
use crate::http::endpoint;
use crate::http::get_json;
use crate::http::parse_base_url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default DCI API base URL.
pub const DEFAULT_DCI_BASE_URL: &str = "https://api.distributed-ci.io/api/v1";
/// Default number of jobs requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Upper bound on pages fetched in one call.
const MAX_PAGES: u32 = 1_000;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// DCI client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DciClientConfig {
    /// API base URL.
    pub base_url: String,
    /// Remote CI client identifier.
    pub client_id: String,
    /// Remote CI API secret.
    pub api_secret: String,
    /// Jobs requested per page.
    pub page_size: u32,
}

impl std::fmt::Debug for DciClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DciClientConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("api_secret", &"<redacted>")
            .field("page_size", &self.page_size)
            .finish()
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// CI client for DCI.
pub struct DciClient {
    /// Parsed API base URL.
    base_url: Url,
    /// Remote CI client identifier.
    client_id: String,
    /// Remote CI API secret.
    api_secret: String,
    /// Jobs requested per page.
    page_size: u32,
    /// Maximum response size, in bytes.
    max_response_bytes: usize,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl DciClient {
    /// Creates a DCI client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] when credentials are empty, the page size
    /// is zero, the base URL is invalid, or the HTTP client cannot be created.
    pub fn new(config: &DciClientConfig, http: &HttpClientConfig) -> Result<Self, ClientError> {
        if config.client_id.trim().is_empty() || config.api_secret.trim().is_empty() {
            return Err(ClientError::Init("dci client id and api secret are required".to_string()));
        }
        if config.page_size == 0 {
            return Err(ClientError::Init("dci page size must be at least 1".to_string()));
        }
        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            client_id: config.client_id.clone(),
            api_secret: config.api_secret.clone(),
            page_size: config.page_size,
            max_response_bytes: http.max_response_bytes,
            client: http.build_client()?,
        })
    }

    /// Returns the URL of the page starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] when the URL cannot be built.
    pub fn jobs_url(&self, offset: u64) -> Result<Url, ClientError> {
        let mut url = endpoint(&self.base_url, &["jobs"])?;
        url.query_pairs_mut()
            .append_pair("embed", "components,results")
            .append_pair("sort", "-created_at")
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    /// Fetches every job created at or after `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when a page request or decode fails.
    pub fn jobs_since(&self, cutoff: OffsetDateTime) -> Result<Vec<JobsPage>, ClientError> {
        let page_size = usize::try_from(self.page_size)
            .map_err(|_| ClientError::Init("dci page size exceeds usize".to_string()))?;
        let mut pages = Vec::new();
        let mut offset: u64 = 0;
        for _ in 0 .. MAX_PAGES {
            let url = self.jobs_url(offset)?;
            debug!(url = %url, "requesting dci jobs page");
            let mut page: JobsPage = get_json(
                self.client.get(url).basic_auth(&self.client_id, Some(&self.api_secret)),
                self.max_response_bytes,
            )?;
            let received = page.jobs.len();
            let reached_cutoff = retain_recent(&mut page, cutoff);
            if !page.jobs.is_empty() {
                pages.push(page);
            }
            if reached_cutoff || received < page_size {
                return Ok(pages);
            }
            offset = offset.saturating_add(u64::from(self.page_size));
        }
        warn!(max_pages = MAX_PAGES, "dci paging stopped at page limit");
        Ok(pages)
    }
}

impl CiClient for DciClient {
    fn jobs(&self, days_back: u32) -> Result<Vec<JobsPage>, ClientError> {
        let cutoff = OffsetDateTime::now_utc() - Duration::days(i64::from(days_back));
        self.jobs_since(cutoff)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Drops jobs from the first one created before `cutoff` onward.
///
/// Returns true when such a job was found.
fn retain_recent(page: &mut JobsPage, cutoff: OffsetDateTime) -> bool {
    let first_old = page.jobs.iter().position(|job| {
        parse_ci_timestamp(&job.created_at).is_ok_and(|created_at| created_at < cutoff)
    });
    match first_old {
        Some(index) => {
            page.jobs.truncate(index);
            true
        }
        None => false,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use certsuite_usage_core::Job;
    use time::macros::datetime;

    use super::*;

    fn job(id: &str, created_at: &str) -> Job {
        Job {
            id: id.to_string(),
            created_at: created_at.to_string(),
            components: Vec::new(),
            results: Vec::new(),
        }
    }

    #[test]
    fn retain_recent_truncates_at_first_old_job() {
        let mut page = JobsPage {
            jobs: vec![
                job("a", "2024-11-26T12:00:00"),
                job("b", "2024-11-25T13:00:00"),
                job("c", "2024-11-25T09:00:00"),
                job("d", "2024-11-26T11:00:00"),
            ],
        };
        assert!(retain_recent(&mut page, datetime!(2024-11-25 12:00:00 UTC)));
        let ids: Vec<&str> = page.jobs.iter().map(|job| job.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn retain_recent_keeps_unparsable_jobs() {
        let mut page = JobsPage {
            jobs: vec![job("a", "garbage"), job("b", "2024-11-26T12:00:00")],
        };
        assert!(!retain_recent(&mut page, datetime!(2024-11-25 12:00:00 UTC)));
        assert_eq!(page.jobs.len(), 2);
    }
}
