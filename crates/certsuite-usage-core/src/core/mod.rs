// crates/certsuite-usage-core/src/core/mod.rs
// ============================================================================
// Module: Certsuite Usage Core Types
// Description: Row model, upstream payloads, and parsing helpers.
// Purpose: Provide typed values shared by stores, clients, and aggregators.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types describe what is fetched (registry log entries, CI jobs) and
//! what is persisted (aggregated log rows, component run rows), together with
//! the date and timestamp handling that connects the two.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod backend;
pub mod rows;
pub mod timestamps;
pub mod window;
pub mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::BackendResolution;
pub use backend::StoreBackend;
pub use rows::AggregatedLogRow;
pub use rows::ComponentRunRow;
pub use rows::ResultTotals;
pub use rows::STORE_DATE_FORMAT;
pub use rows::UNKNOWN_COMMIT;
pub use rows::ValidationError;
pub use rows::format_store_date;
pub use rows::parse_store_date;
pub use timestamps::TimestampError;
pub use timestamps::parse_ci_timestamp;
pub use timestamps::parse_registry_datetime;
pub use window::FetchWindow;
pub use window::REGISTRY_QUERY_DATE_FORMAT;
pub use wire::AggregatedLogEntry;
pub use wire::AggregatedLogs;
pub use wire::Component;
pub use wire::Job;
pub use wire::JobResult;
pub use wire::JobsPage;
