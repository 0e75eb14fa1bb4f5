// crates/certsuite-usage-cli/src/lib.rs
// ============================================================================
// Module: Certsuite Usage CLI Library
// Description: Store selection and logging bootstrap for the CLI binary.
// Purpose: Keep backend wiring testable outside the binary entry point.
// Dependencies: crate::{gateway, logging}
// ============================================================================

//! ## Overview
//! The `certsuite-usage` binary resolves configuration, installs logging, and
//! hands a [`gateway::DatabaseGateway`] to both aggregators.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod gateway;
pub mod logging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gateway::DatabaseGateway;
pub use logging::DEFAULT_LOG_FILTER;
pub use logging::init_logging;
