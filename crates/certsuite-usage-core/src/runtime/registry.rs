// crates/certsuite-usage-core/src/runtime/registry.rs
// ============================================================================
// Module: Registry Usage Aggregator
// Description: Pull-count ingestion from the registry aggregated-logs API.
// Purpose: Upsert one row per (date, kind) for the trailing day window.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! A run opens a store, fetches the [yesterday, today] aggregated logs for
//! the configured repository, normalizes each entry's datetime to a date, and
//! upserts it. The first parse or write failure aborts the remaining batch;
//! rows already written stay in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::core::AggregatedLogRow;
use crate::core::FetchWindow;
use crate::core::parse_registry_datetime;
use crate::interfaces::RegistryClient;
use crate::interfaces::StoreOpener;
use crate::runtime::error::IngestError;
use crate::runtime::error::RunSummary;

// ============================================================================
// SECTION: Target
// ============================================================================

/// Registry repository whose pulls are counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTarget {
    /// Registry namespace (organization).
    pub namespace: String,
    /// Repository name within the namespace.
    pub repository: String,
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Ingests registry pull counts into a usage store.
pub struct RegistryUsageAggregator<'a, C: ?Sized, S: ?Sized> {
    /// Registry API client.
    client: &'a C,
    /// Store opened once per run.
    stores: &'a S,
    /// Repository to query.
    target: RegistryTarget,
}

impl<'a, C, S> RegistryUsageAggregator<'a, C, S>
where
    C: RegistryClient + ?Sized,
    S: StoreOpener + ?Sized,
{
    /// Creates an aggregator for `target`.
    #[must_use]
    pub const fn new(client: &'a C, stores: &'a S, target: RegistryTarget) -> Self {
        Self {
            client,
            stores,
            target,
        }
    }

    /// Runs against the window ending at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on the first fetch, parse, or store failure.
    pub fn run(&self) -> Result<RunSummary, IngestError> {
        self.run_for(FetchWindow::ending_now())
    }

    /// Runs against the window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on the first fetch, parse, or store failure.
    pub fn run_at(&self, now: OffsetDateTime) -> Result<RunSummary, IngestError> {
        self.run_for(FetchWindow::ending_at(now))
    }

    /// Runs against an explicit window.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on the first fetch, parse, or store failure.
    pub fn run_for(&self, window: FetchWindow) -> Result<RunSummary, IngestError> {
        let store = self.stores.open()?;
        info!(
            namespace = %self.target.namespace,
            repository = %self.target.repository,
            start = %window.start_param(),
            end = %window.end_param(),
            "fetching registry aggregated logs"
        );
        let logs = self
            .client
            .aggregated_logs(&self.target.namespace, &self.target.repository, &window)
            .map_err(|err| {
                error!(error = %err, "registry fetch failed");
                IngestError::Fetch(err)
            })?;
        info!(entries = logs.aggregated.len(), "fetched registry aggregated logs");

        let mut summary = RunSummary {
            fetched: logs.aggregated.len(),
            upserts: 0,
        };
        for entry in &logs.aggregated {
            debug!(datetime = %entry.datetime, count = entry.count, kind = %entry.kind, "upserting aggregated log");
            let date = parse_registry_datetime(&entry.datetime).map_err(|err| {
                error!(datetime = %entry.datetime, error = %err, "registry datetime rejected");
                IngestError::from(err)
            })?;
            let row = AggregatedLogRow::new(date, entry.kind.clone(), entry.count)?;
            store.upsert_aggregated_log(&row).map_err(|err| {
                error!(date = %row.date_text(), kind = %row.kind, count = row.count, error = %err, "aggregated log write failed");
                err
            })?;
            summary.upserts += 1;
        }
        info!(upserts = summary.upserts, "stored registry aggregated logs");
        Ok(summary)
    }
}
