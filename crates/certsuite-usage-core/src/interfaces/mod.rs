// crates/certsuite-usage-core/src/interfaces/mod.rs
// ============================================================================
// Module: Certsuite Usage Interfaces
// Description: Backend-agnostic interfaces for storage and upstream APIs.
// Purpose: Define the contract surfaces used by the usage aggregators.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Aggregators talk to the outside world only through these traits: a
//! [`StoreOpener`] that yields a fresh [`UsageStore`] per run, a
//! [`RegistryClient`] for pull logs, and a [`CiClient`] for job runs. Store
//! backends and HTTP clients live in their own crates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::Date;

use crate::core::AggregatedLogRow;
use crate::core::AggregatedLogs;
use crate::core::ComponentRunRow;
use crate::core::FetchWindow;
use crate::core::JobsPage;
use crate::core::ValidationError;

// ============================================================================
// SECTION: Usage Store
// ============================================================================

/// Usage store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("usage store connection failed: {0}")]
    Connection(String),
    /// Required tables could not be created.
    #[error("usage store schema creation failed: {0}")]
    Schema(String),
    /// The row was rejected before writing.
    #[error("usage store rejected row: {0}")]
    Validation(String),
    /// The store failed to apply a write.
    #[error("usage store write failed: {0}")]
    Write(String),
    /// The store failed to read back a row.
    #[error("usage store read failed: {0}")]
    Read(String),
}

impl From<ValidationError> for StoreError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Persistence for aggregated usage rows.
///
/// Conflict policy is shared by every backend: aggregated log counts
/// accumulate on a `(date, kind)` conflict, and component runs replace every
/// column on a `job_id` conflict.
pub trait UsageStore {
    /// Creates the usage tables when they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`] when table creation fails.
    fn ensure_tables(&self) -> Result<(), StoreError>;

    /// Inserts a log row or adds its count to the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for invalid rows and
    /// [`StoreError::Write`] when the store rejects the write.
    fn upsert_aggregated_log(&self, row: &AggregatedLogRow) -> Result<(), StoreError>;

    /// Inserts a component run row or replaces the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for invalid rows and
    /// [`StoreError::Write`] when the store rejects the write.
    fn upsert_component_run(&self, row: &ComponentRunRow) -> Result<(), StoreError>;

    /// Loads the stored log row for `(date, kind)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the lookup fails.
    fn load_aggregated_log(
        &self,
        date: Date,
        kind: &str,
    ) -> Result<Option<AggregatedLogRow>, StoreError>;

    /// Loads the stored component run row for `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the lookup fails.
    fn load_component_run(&self, job_id: &str) -> Result<Option<ComponentRunRow>, StoreError>;
}

/// Opens a usage store scoped to a single aggregator run.
pub trait StoreOpener {
    /// Opens the store and ensures its tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] or [`StoreError::Schema`] when the
    /// store cannot be prepared.
    fn open(&self) -> Result<Box<dyn UsageStore>, StoreError>;
}

// ============================================================================
// SECTION: Upstream Clients
// ============================================================================

/// Upstream API client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not be constructed.
    #[error("api client init failed: {0}")]
    Init(String),
    /// The request could not be sent or completed.
    #[error("api request failed: {0}")]
    Request(String),
    /// The API answered with a non-success status.
    #[error("api returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
    /// The response body could not be decoded.
    #[error("api response decode failed: {0}")]
    Decode(String),
}

/// Registry pull-log API.
pub trait RegistryClient {
    /// Fetches aggregated pull logs for a repository within `window`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request or decoding fails.
    fn aggregated_logs(
        &self,
        namespace: &str,
        repository: &str,
        window: &FetchWindow,
    ) -> Result<AggregatedLogs, ClientError>;
}

/// CI job-reporting API.
pub trait CiClient {
    /// Fetches jobs created within the trailing `days_back` days.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request or decoding fails.
    fn jobs(&self, days_back: u32) -> Result<Vec<JobsPage>, ClientError>;
}
