// crates/certsuite-usage-config/src/lib.rs
// ============================================================================
// Module: Certsuite Usage Config Library
// Description: Configuration model, loading, and validation.
// Purpose: Single source of truth for certsuite-usage.toml semantics.
// Dependencies: certsuite-usage-core, serde, toml, serde_json
// ============================================================================

//! ## Overview
//! `certsuite-usage-config` loads the credentials, registry target, HTTP
//! settings, and database selection from a TOML or JSON file, overlays
//! environment variables, and validates the result. Validated values are
//! turned into the client and store configs the other crates expect.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
