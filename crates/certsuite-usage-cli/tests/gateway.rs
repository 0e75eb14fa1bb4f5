// crates/certsuite-usage-cli/tests/gateway.rs
// ============================================================================
// Module: Database Gateway Tests
// Description: Backend selection and store opening through the gateway.
// Purpose: Ensure the configured backend is honored and stores arrive ready.
// Dependencies: certsuite-usage-cli, certsuite-usage-config, tempfile
// ============================================================================

//! ## Overview
//! Opens `SQLite` stores in temporary directories through [`DatabaseGateway`]
//! and checks backend resolution from configuration. Postgres is exercised
//! only up to configuration checks; no live server is required.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use certsuite_usage_cli::DatabaseGateway;
use certsuite_usage_config::ConfigError;
use certsuite_usage_config::UsageConfig;
use certsuite_usage_core::AggregatedLogEntry;
use certsuite_usage_core::AggregatedLogRow;
use certsuite_usage_core::AggregatedLogs;
use certsuite_usage_core::ClientError;
use certsuite_usage_core::FetchWindow;
use certsuite_usage_core::RegistryClient;
use certsuite_usage_core::RegistryTarget;
use certsuite_usage_core::RegistryUsageAggregator;
use certsuite_usage_core::StoreBackend;
use certsuite_usage_core::StoreError;
use certsuite_usage_core::StoreOpener;
use certsuite_usage_store_postgres::PostgresStoreConfig;
use certsuite_usage_store_sqlite::SqliteStoreConfig;
use tempfile::TempDir;
use time::macros::date;
use time::macros::datetime;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sqlite_config(dir: &TempDir) -> UsageConfig {
    let mut config = UsageConfig::default();
    config.database.sqlite.path = dir.path().join("nested").join("usage.db");
    config
}

struct FixedRegistry {
    entries: Vec<AggregatedLogEntry>,
}

impl RegistryClient for FixedRegistry {
    fn aggregated_logs(
        &self,
        _namespace: &str,
        _repository: &str,
        _window: &FetchWindow,
    ) -> Result<AggregatedLogs, ClientError> {
        Ok(AggregatedLogs {
            aggregated: self.entries.clone(),
        })
    }
}

// ============================================================================
// SECTION: Backend Selection
// ============================================================================

#[test]
fn missing_backend_selects_sqlite() {
    let dir = TempDir::new().unwrap();
    let gateway = DatabaseGateway::from_config(&sqlite_config(&dir)).unwrap();
    assert_eq!(gateway.backend(), StoreBackend::Sqlite);
}

#[test]
fn unrecognized_backend_falls_back_to_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut config = sqlite_config(&dir);
    config.database.backend = Some("mysql".to_string());
    let gateway = DatabaseGateway::from_config(&config).unwrap();
    assert_eq!(gateway.backend(), StoreBackend::Sqlite);
}

#[test]
fn remote_backend_requires_postgres_user() {
    let mut config = UsageConfig::default();
    config.database.backend = Some("remote".to_string());
    let err = DatabaseGateway::from_config(&config).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Missing {
            field: "database.postgres.user",
            ..
        }
    ));

    config.database.postgres.user = Some("usage".to_string());
    let gateway = DatabaseGateway::from_config(&config).unwrap();
    assert_eq!(gateway.backend(), StoreBackend::Postgres);
}

// ============================================================================
// SECTION: Opening Stores
// ============================================================================

#[test]
fn sqlite_open_creates_file_and_tables() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir);
    let gateway = DatabaseGateway::from_config(&config).unwrap();

    let store = gateway.open().unwrap();
    let row = AggregatedLogRow::new(date!(2024 - 11 - 25), "pull_repo", 4).unwrap();
    store.upsert_aggregated_log(&row).unwrap();
    drop(store);
    assert!(config.database.sqlite.path.is_file());

    let reopened = gateway.open().unwrap();
    let stored = reopened.load_aggregated_log(date!(2024 - 11 - 25), "pull_repo").unwrap();
    assert_eq!(stored, Some(row));
}

#[test]
fn sqlite_open_fails_on_directory_path() {
    let dir = TempDir::new().unwrap();
    let gateway = DatabaseGateway::sqlite(SqliteStoreConfig::new(dir.path()));
    assert!(matches!(gateway.open(), Err(StoreError::Connection(_))));
}

#[test]
fn postgres_open_reports_connection_failure() {
    let config = PostgresStoreConfig {
        user: "usage".to_string(),
        password: String::new(),
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout_ms: 200,
        ..PostgresStoreConfig::default()
    };
    let gateway = DatabaseGateway::postgres(config);
    assert_eq!(gateway.backend(), StoreBackend::Postgres);
    assert!(matches!(gateway.open(), Err(StoreError::Connection(_))));
}

#[test]
fn registry_aggregator_writes_through_gateway() {
    let dir = TempDir::new().unwrap();
    let gateway = DatabaseGateway::sqlite(SqliteStoreConfig::new(dir.path().join("usage.db")));
    let client = FixedRegistry {
        entries: vec![AggregatedLogEntry {
            datetime: "Mon, 02 Jan 2006 15:04:05 +0000".to_string(),
            count: 42,
            kind: "pulls".to_string(),
        }],
    };
    let target = RegistryTarget {
        namespace: "redhat-best-practices-for-k8s".to_string(),
        repository: "certsuite".to_string(),
    };
    let aggregator = RegistryUsageAggregator::new(&client, &gateway, target);

    let summary = aggregator.run_at(datetime!(2006-01-03 08:00:00 UTC)).unwrap();
    assert_eq!(summary.upserts, 1);

    let store = gateway.open().unwrap();
    let stored = store.load_aggregated_log(date!(2006 - 01 - 02), "pulls").unwrap().unwrap();
    assert_eq!(stored.count, 42);
}
