// crates/certsuite-usage-core/src/runtime/error.rs
// ============================================================================
// Module: Ingest Errors
// Description: Failure taxonomy for aggregator runs.
// Purpose: Keep fetch, parse, and write failures distinguishable.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! Every aggregator failure aborts the run. [`IngestError`] keeps the stage
//! that failed visible: client construction, upstream fetch, timestamp
//! parsing, or the store (connection, schema, validation, write).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::TimestampError;
use crate::core::ValidationError;
use crate::interfaces::ClientError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Aggregator run failures.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upstream client could not be constructed.
    #[error("client init failed: {0}")]
    ClientInit(String),
    /// The upstream API call failed.
    #[error("fetch failed: {0}")]
    Fetch(ClientError),
    /// An upstream datetime could not be parsed.
    #[error("datetime parse failed: {0}")]
    DatetimeParse(TimestampError),
    /// The store failed (connection, schema, validation, or write).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for IngestError {
    fn from(error: ValidationError) -> Self {
        Self::Store(StoreError::from(error))
    }
}

impl From<TimestampError> for IngestError {
    fn from(error: TimestampError) -> Self {
        Self::DatetimeParse(error)
    }
}

/// Counts reported by a completed aggregator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Upstream records examined.
    pub fetched: usize,
    /// Upserts applied to the store.
    ///
    /// Repeated keys are counted once per upsert, so this can exceed the
    /// number of distinct stored rows.
    pub upserts: usize,
}
