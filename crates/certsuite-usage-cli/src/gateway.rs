// crates/certsuite-usage-cli/src/gateway.rs
// ============================================================================
// Module: Database Gateway
// Description: StoreOpener that maps the configured backend onto a store crate.
// Purpose: Open a ready-to-write usage store for each aggregator run.
// Dependencies: certsuite-usage-config, certsuite-usage-core, store crates
// ============================================================================

//! ## Overview
//! The backend flag is resolved once when the gateway is built. Missing or
//! unrecognized flags select the embedded `SQLite` store; an unrecognized flag
//! is logged at warn level. Every [`StoreOpener::open`] call returns a fresh
//! store with both tables ensured, and the store is closed when dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use certsuite_usage_config::ConfigError;
use certsuite_usage_config::UsageConfig;
use certsuite_usage_core::BackendResolution;
use certsuite_usage_core::StoreBackend;
use certsuite_usage_core::StoreError;
use certsuite_usage_core::StoreOpener;
use certsuite_usage_core::UsageStore;
use certsuite_usage_store_postgres::PostgresStoreConfig;
use certsuite_usage_store_postgres::PostgresUsageStore;
use certsuite_usage_store_sqlite::SqliteStoreConfig;
use certsuite_usage_store_sqlite::SqliteUsageStore;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Connection settings for the selected backend.
#[derive(Debug, Clone)]
enum GatewayTarget {
    /// Embedded file-backed store.
    Sqlite(SqliteStoreConfig),
    /// Networked Postgres server.
    Postgres(PostgresStoreConfig),
}

/// Opens usage stores for the configured backend.
#[derive(Debug, Clone)]
pub struct DatabaseGateway {
    /// Selected backend and its settings.
    target: GatewayTarget,
}

impl DatabaseGateway {
    /// Builds a gateway over an embedded `SQLite` store.
    #[must_use]
    pub const fn sqlite(config: SqliteStoreConfig) -> Self {
        Self {
            target: GatewayTarget::Sqlite(config),
        }
    }

    /// Builds a gateway over a Postgres server.
    #[must_use]
    pub const fn postgres(config: PostgresStoreConfig) -> Self {
        Self {
            target: GatewayTarget::Postgres(config),
        }
    }

    /// Builds a gateway from the `[database]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the selected backend lacks a required
    /// setting.
    pub fn from_config(config: &UsageConfig) -> Result<Self, ConfigError> {
        let resolution = config.database.resolution();
        if let BackendResolution::Unrecognized(flag) = &resolution {
            warn!(
                flag = %flag,
                fallback = %StoreBackend::Sqlite,
                "unrecognized database backend, using default"
            );
        }
        match resolution.backend() {
            StoreBackend::Sqlite => Ok(Self::sqlite(config.sqlite_store_config())),
            StoreBackend::Postgres => Ok(Self::postgres(config.postgres_store_config()?)),
        }
    }

    /// Returns the selected backend.
    #[must_use]
    pub const fn backend(&self) -> StoreBackend {
        match self.target {
            GatewayTarget::Sqlite(_) => StoreBackend::Sqlite,
            GatewayTarget::Postgres(_) => StoreBackend::Postgres,
        }
    }
}

impl StoreOpener for DatabaseGateway {
    fn open(&self) -> Result<Box<dyn UsageStore>, StoreError> {
        let opened = match &self.target {
            GatewayTarget::Sqlite(config) => open_sqlite(config),
            GatewayTarget::Postgres(config) => open_postgres(config),
        };
        match opened {
            Ok(store) => {
                info!(backend = %self.backend(), "usage store ready");
                Ok(store)
            }
            Err(err) => {
                error!(backend = %self.backend(), error = %err, "usage store open failed");
                Err(err)
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens the `SQLite` store and ensures its tables.
fn open_sqlite(config: &SqliteStoreConfig) -> Result<Box<dyn UsageStore>, StoreError> {
    let store = SqliteUsageStore::open(config)?;
    store.ensure_tables()?;
    Ok(Box::new(store))
}

/// Connects the Postgres store and ensures its tables.
fn open_postgres(config: &PostgresStoreConfig) -> Result<Box<dyn UsageStore>, StoreError> {
    let store = PostgresUsageStore::connect(config)?;
    store.ensure_tables()?;
    Ok(Box::new(store))
}
