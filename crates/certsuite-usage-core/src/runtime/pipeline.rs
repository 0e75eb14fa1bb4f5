// crates/certsuite-usage-core/src/runtime/pipeline.rs
// ============================================================================
// Module: Usage Fetch Pipeline
// Description: Sequential registry-then-CI ingestion.
// Purpose: Run both aggregators and stop at the first failure.
// Dependencies: crate::{interfaces, runtime}, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`fetch_usage`] runs the registry aggregator and then the CI aggregator.
//! Each opens its own store. A registry failure prevents the CI run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::info;

use crate::interfaces::CiClient;
use crate::interfaces::RegistryClient;
use crate::interfaces::StoreOpener;
use crate::runtime::ci::CiJobAggregator;
use crate::runtime::error::IngestError;
use crate::runtime::error::RunSummary;
use crate::runtime::registry::RegistryUsageAggregator;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pipeline failure, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Registry ingestion failed.
    #[error("error fetching registry data: {0}")]
    Registry(IngestError),
    /// CI ingestion failed.
    #[error("error fetching ci data: {0}")]
    Ci(IngestError),
}

/// Summaries from a completed pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageReport {
    /// Registry aggregator summary.
    pub registry: RunSummary,
    /// CI aggregator summary.
    pub ci: RunSummary,
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Runs registry then CI ingestion.
///
/// # Errors
///
/// Returns [`FetchError`] naming the first aggregator that failed.
pub fn fetch_usage<RC, CC, RS, CS>(
    registry: &RegistryUsageAggregator<'_, RC, RS>,
    ci: &CiJobAggregator<'_, CC, CS>,
) -> Result<UsageReport, FetchError>
where
    RC: RegistryClient + ?Sized,
    CC: CiClient + ?Sized,
    RS: StoreOpener + ?Sized,
    CS: StoreOpener + ?Sized,
{
    let registry = registry.run().map_err(FetchError::Registry)?;
    let ci = ci.run().map_err(FetchError::Ci)?;
    info!(
        registry_upserts = registry.upserts,
        ci_upserts = ci.upserts,
        "usage fetch completed"
    );
    Ok(UsageReport {
        registry,
        ci,
    })
}
