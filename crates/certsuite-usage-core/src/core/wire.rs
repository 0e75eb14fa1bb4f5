// crates/certsuite-usage-core/src/core/wire.rs
// ============================================================================
// Module: Upstream Payloads
// Description: Response shapes returned by the registry and CI APIs.
// Purpose: Give clients and aggregators a shared, serde-decoded model.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! These types mirror the JSON returned by the registry aggregated-logs
//! endpoint and the CI jobs endpoint. Optional collections default to empty
//! so sparse payloads decode instead of failing the whole fetch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Aggregated-logs response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLogs {
    /// Aggregated entries in the requested window.
    #[serde(default)]
    pub aggregated: Vec<AggregatedLogEntry>,
}

/// One aggregated registry log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLogEntry {
    /// RFC 2822 datetime of the bucket.
    pub datetime: String,
    /// Events observed in the bucket.
    pub count: i64,
    /// Event kind label.
    pub kind: String,
}

// ============================================================================
// SECTION: CI
// ============================================================================

/// One page of CI jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsPage {
    /// Jobs on this page.
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// One CI job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque job identifier.
    pub id: String,
    /// Creation timestamp as reported by the CI API.
    pub created_at: String,
    /// Components attached to the job.
    #[serde(default)]
    pub components: Vec<Component>,
    /// Test result files attached to the job.
    #[serde(default)]
    pub results: Vec<JobResult>,
}

/// Named component attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Display name, usually `<product> <commit>`.
    pub name: String,
}

/// Test result file attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Result file name.
    pub name: String,
    /// Successful test cases.
    #[serde(default)]
    pub success: i64,
    /// Failed test cases.
    #[serde(default)]
    pub failures: i64,
    /// Errored test cases.
    #[serde(default)]
    pub errors: i64,
    /// Skipped test cases.
    #[serde(default)]
    pub skips: i64,
}
