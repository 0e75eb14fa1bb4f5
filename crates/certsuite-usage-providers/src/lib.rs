// crates/certsuite-usage-providers/src/lib.rs
// ============================================================================
// Module: Certsuite Usage Providers
// Description: HTTP clients for the registry and CI reporting APIs.
// Purpose: Implement RegistryClient and CiClient over blocking reqwest.
// Dependencies: certsuite-usage-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! [`QuayClient`] reads aggregated pull logs with a bearer token and
//! [`DciClient`] pages through recent CI jobs with client credentials. Both
//! share the transport settings in [`HttpClientConfig`]: request timeout,
//! user agent, disabled redirects, and a bounded response size.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dci;
pub mod http;
pub mod quay;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dci::DEFAULT_DCI_BASE_URL;
pub use dci::DEFAULT_PAGE_SIZE;
pub use dci::DciClient;
pub use dci::DciClientConfig;
pub use http::HttpClientConfig;
pub use quay::DEFAULT_QUAY_BASE_URL;
pub use quay::QuayClient;
pub use quay::QuayClientConfig;
