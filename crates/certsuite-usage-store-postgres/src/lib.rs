// crates/certsuite-usage-store-postgres/src/lib.rs
// ============================================================================
// Module: Postgres Usage Store
// Description: Networked-remote UsageStore backend using Postgres.
// Purpose: Persist usage rows in a shared database, creating it on demand.
// Dependencies: certsuite-usage-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! This crate provides a Postgres-backed [`UsageStore`] implementation.
//! Connecting bootstraps the target database through the server's
//! maintenance database before opening a pooled connection to it.
//!
//! [`UsageStore`]: certsuite_usage_core::UsageStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::PostgresStoreConfig;
pub use store::PostgresStoreError;
pub use store::PostgresUsageStore;
pub use store::quote_identifier;
