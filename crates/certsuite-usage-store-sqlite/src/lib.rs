// crates/certsuite-usage-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Usage Store
// Description: Embedded-local UsageStore backend using SQLite.
// Purpose: Persist aggregated logs and component runs in a single file.
// Dependencies: certsuite-usage-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`UsageStore`] implementation. The
//! database file and its parent directories are created on first open, and
//! the usage tables are created on demand.
//!
//! [`UsageStore`]: certsuite_usage_core::UsageStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteUsageStore;
