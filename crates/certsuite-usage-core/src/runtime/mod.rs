// crates/certsuite-usage-core/src/runtime/mod.rs
// ============================================================================
// Module: Certsuite Usage Runtime
// Description: Aggregators, fetch pipeline, and in-memory store.
// Purpose: Reconcile upstream usage records with stored rows.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Runtime modules implement the two aggregators and the pipeline that runs
//! them in order. Runs are strictly sequential: open store, fetch, transform,
//! write, drop store.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod ci;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ci::CERTSUITE_REPORT_NAME;
pub use ci::CiJobAggregator;
pub use ci::DAYS_BACK;
pub use ci::RELEVANT_COMPONENT_MARKERS;
pub use ci::component_runs;
pub use ci::extract_commit_hash;
pub use ci::is_relevant_component;
pub use ci::sum_report_results;
pub use error::IngestError;
pub use error::RunSummary;
pub use pipeline::FetchError;
pub use pipeline::UsageReport;
pub use pipeline::fetch_usage;
pub use registry::RegistryTarget;
pub use registry::RegistryUsageAggregator;
pub use store::InMemoryUsageStore;
