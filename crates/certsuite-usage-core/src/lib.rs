// crates/certsuite-usage-core/src/lib.rs
// ============================================================================
// Module: Certsuite Usage Core Library
// Description: Public API surface for the usage ingestion core.
// Purpose: Expose row types, interfaces, and aggregators.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Certsuite usage core pulls registry pull counts and CI test results and
//! reconciles them with stored rows. It is backend-agnostic: stores and HTTP
//! clients plug in through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CiClient;
pub use interfaces::ClientError;
pub use interfaces::RegistryClient;
pub use interfaces::StoreError;
pub use interfaces::StoreOpener;
pub use interfaces::UsageStore;
pub use runtime::CiJobAggregator;
pub use runtime::FetchError;
pub use runtime::InMemoryUsageStore;
pub use runtime::IngestError;
pub use runtime::RegistryTarget;
pub use runtime::RegistryUsageAggregator;
pub use runtime::RunSummary;
pub use runtime::UsageReport;
pub use runtime::fetch_usage;
