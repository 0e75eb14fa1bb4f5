// crates/certsuite-usage-cli/src/logging.rs
// ============================================================================
// Module: Logging Bootstrap
// Description: Installs the process-wide tracing subscriber.
// Purpose: Route structured logs to stderr under a RUST_LOG filter.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Logs go to stderr so stdout stays reserved for command output. The filter
//! comes from `RUST_LOG` and falls back to [`DEFAULT_LOG_FILTER`] when the
//! variable is unset or does not parse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: Subscriber
// ============================================================================

/// Builds the log filter from `RUST_LOG`, falling back to `default_filter`.
#[must_use]
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the stderr subscriber.
///
/// Returns false when a global subscriber was already installed.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_LOG_FILTER))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
