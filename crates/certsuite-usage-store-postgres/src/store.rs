// crates/certsuite-usage-store-postgres/src/store.rs
// ============================================================================
// Module: Postgres Usage Store
// Description: Pooled Postgres UsageStore with database bootstrap.
// Purpose: Upsert aggregated logs and component runs with the shared policy.
// Dependencies: certsuite-usage-core, postgres, r2d2, r2d2_postgres, thiserror
// ============================================================================

//! ## Overview
//! [`PostgresUsageStore::connect`] runs the bootstrap sequence:
//! 1. connect to the maintenance database and check it answers,
//! 2. create the target database when `pg_database` has no row for it,
//! 3. build a connection pool scoped to the target database and check it
//!    answers.
//!
//! Passwords never appear in log fields or error messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use certsuite_usage_core::AggregatedLogRow;
use certsuite_usage_core::ComponentRunRow;
use certsuite_usage_core::ResultTotals;
use certsuite_usage_core::StoreError;
use certsuite_usage_core::UsageStore;
use postgres::Client;
use postgres::NoTls;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use tracing::debug;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Database every Postgres server provides for administrative connections.
const MAINTENANCE_DATABASE: &str = "postgres";
/// Application name reported to the server.
const APPLICATION_NAME: &str = "certsuite-usage";

/// Usage table definitions.
const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS aggregated_logs (
        datetime DATE NOT NULL,
        kind TEXT NOT NULL,
        count BIGINT NOT NULL,
        PRIMARY KEY (datetime, kind)
    );
    CREATE TABLE IF NOT EXISTS dci_components (
        job_id TEXT PRIMARY KEY,
        commit_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        total_success BIGINT NOT NULL DEFAULT 0,
        total_failures BIGINT NOT NULL DEFAULT 0,
        total_errors BIGINT NOT NULL DEFAULT 0,
        total_skips BIGINT NOT NULL DEFAULT 0
    );";

/// Inserts a log row or adds to the stored count.
const UPSERT_AGGREGATED_LOG_SQL: &str = "INSERT INTO aggregated_logs (datetime, kind, count) \
     VALUES ($1, $2, $3) ON CONFLICT (datetime, kind) DO UPDATE SET count = \
     aggregated_logs.count + EXCLUDED.count";

/// Inserts a component run or replaces every stored column.
const UPSERT_COMPONENT_RUN_SQL: &str = "INSERT INTO dci_components (job_id, commit_hash, \
     created_at, total_success, total_failures, total_errors, total_skips) VALUES ($1, $2, $3, \
     $4, $5, $6, $7) ON CONFLICT (job_id) DO UPDATE SET commit_hash = EXCLUDED.commit_hash, \
     created_at = EXCLUDED.created_at, total_success = EXCLUDED.total_success, total_failures = \
     EXCLUDED.total_failures, total_errors = EXCLUDED.total_errors, total_skips = \
     EXCLUDED.total_skips";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Postgres store configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresStoreConfig {
    /// Role name.
    pub user: String,
    /// Role password.
    pub password: String,
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Target database, created when absent.
    pub database: String,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Maximum pool size.
    pub max_connections: u32,
}

impl Default for PostgresStoreConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 5432,
            database: "certsuite_usage".to_string(),
            connect_timeout_ms: 5_000,
            max_connections: 2,
        }
    }
}

impl PostgresStoreConfig {
    /// Returns `user@host:port/database` without the password.
    #[must_use]
    pub fn redacted_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }

    /// Builds a client config for `database`.
    fn client_config(&self, database: &str) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .dbname(database)
            .application_name(APPLICATION_NAME)
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        config
    }

    /// Checks required fields.
    fn validate(&self) -> Result<(), PostgresStoreError> {
        for (field, value) in
            [("user", &self.user), ("host", &self.host), ("database", &self.database)]
        {
            if value.trim().is_empty() {
                return Err(PostgresStoreError::Config(format!("{field} must not be empty")));
            }
        }
        if self.port == 0 {
            return Err(PostgresStoreError::Config("port must be non-zero".to_string()));
        }
        if self.max_connections == 0 {
            return Err(PostgresStoreError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for PostgresStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStoreConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Postgres store errors.
#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// The server could not be reached.
    #[error("postgres connection failed: {0}")]
    Connection(String),
    /// The target database could not be looked up or created.
    #[error("postgres database bootstrap failed: {0}")]
    Bootstrap(String),
    /// A statement failed.
    #[error("postgres query failed: {0}")]
    Query(String),
    /// The connection settings are incomplete.
    #[error("postgres store config invalid: {0}")]
    Config(String),
    /// Invalid stored data.
    #[error("postgres store invalid data: {0}")]
    Invalid(String),
}

impl From<PostgresStoreError> for StoreError {
    fn from(error: PostgresStoreError) -> Self {
        match error {
            PostgresStoreError::Connection(_)
            | PostgresStoreError::Bootstrap(_)
            | PostgresStoreError::Config(_) => {
                Self::Connection(error.to_string())
            }
            PostgresStoreError::Query(_) => Self::Write(error.to_string()),
            PostgresStoreError::Invalid(_) => Self::Validation(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Pooled Postgres connection.
type PgConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

/// Postgres-backed usage store.
pub struct PostgresUsageStore {
    /// Connection pool scoped to the target database.
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresUsageStore {
    /// Bootstraps the target database and opens a pool to it.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError`] when the configuration is invalid, the
    /// server is unreachable, or the database cannot be created.
    pub fn connect(config: &PostgresStoreConfig) -> Result<Self, PostgresStoreError> {
        config.validate()?;
        let target = config.redacted_target();

        let mut maintenance = config
            .client_config(MAINTENANCE_DATABASE)
            .connect(NoTls)
            .map_err(|err| PostgresStoreError::Connection(err.to_string()))?;
        ping(&mut maintenance)?;
        debug!(target = %target, "postgres server reachable");
        ensure_database(&mut maintenance, &config.database)?;
        drop(maintenance);

        let manager =
            PostgresConnectionManager::new(config.client_config(&config.database), NoTls);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build(manager)
            .map_err(|err| PostgresStoreError::Connection(err.to_string()))?;
        let store = Self {
            pool,
        };
        let mut conn = store.connection()?;
        ping(&mut conn)?;
        info!(target = %target, "connected to postgres usage store");
        Ok(store)
    }

    /// Checks out a pooled connection.
    fn connection(&self) -> Result<PgConnection, PostgresStoreError> {
        self.pool.get().map_err(|err| PostgresStoreError::Connection(err.to_string()))
    }

    /// Reads one aggregated log row.
    fn read_aggregated_log(
        &self,
        date: Date,
        kind: &str,
    ) -> Result<Option<AggregatedLogRow>, PostgresStoreError> {
        let mut conn = self.connection()?;
        let row = conn
            .query_opt(
                "SELECT datetime, kind, count FROM aggregated_logs WHERE datetime = $1 AND kind = \
                 $2",
                &[&date, &kind],
            )
            .map_err(|err| PostgresStoreError::Query(err.to_string()))?;
        row.map(|row| {
            Ok(AggregatedLogRow {
                date: row.try_get(0).map_err(invalid)?,
                kind: row.try_get(1).map_err(invalid)?,
                count: row.try_get(2).map_err(invalid)?,
            })
        })
        .transpose()
    }

    /// Reads one component run row.
    fn read_component_run(
        &self,
        job_id: &str,
    ) -> Result<Option<ComponentRunRow>, PostgresStoreError> {
        let mut conn = self.connection()?;
        let row = conn
            .query_opt(
                "SELECT job_id, commit_hash, created_at, total_success, total_failures, \
                 total_errors, total_skips FROM dci_components WHERE job_id = $1",
                &[&job_id],
            )
            .map_err(|err| PostgresStoreError::Query(err.to_string()))?;
        row.map(|row| {
            Ok(ComponentRunRow {
                job_id: row.try_get(0).map_err(invalid)?,
                commit_hash: row.try_get(1).map_err(invalid)?,
                created_at: row.try_get::<_, OffsetDateTime>(2).map_err(invalid)?,
                totals: ResultTotals {
                    success: row.try_get(3).map_err(invalid)?,
                    failures: row.try_get(4).map_err(invalid)?,
                    errors: row.try_get(5).map_err(invalid)?,
                    skips: row.try_get(6).map_err(invalid)?,
                },
            })
        })
        .transpose()
    }
}

impl UsageStore for PostgresUsageStore {
    fn ensure_tables(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().map_err(StoreError::from)?;
        conn.batch_execute(SCHEMA_SQL).map_err(|err| StoreError::Schema(err.to_string()))?;
        debug!("postgres usage tables ready");
        Ok(())
    }

    fn upsert_aggregated_log(&self, row: &AggregatedLogRow) -> Result<(), StoreError> {
        row.validate()?;
        let mut conn = self.connection().map_err(StoreError::from)?;
        conn.execute(UPSERT_AGGREGATED_LOG_SQL, &[&row.date, &row.kind, &row.count])
            .map_err(|err| StoreError::Write(err.to_string()))?;
        Ok(())
    }

    fn upsert_component_run(&self, row: &ComponentRunRow) -> Result<(), StoreError> {
        row.validate()?;
        let mut conn = self.connection().map_err(StoreError::from)?;
        conn.execute(
            UPSERT_COMPONENT_RUN_SQL,
            &[
                &row.job_id,
                &row.commit_hash,
                &row.created_at,
                &row.totals.success,
                &row.totals.failures,
                &row.totals.errors,
                &row.totals.skips,
            ],
        )
        .map_err(|err| StoreError::Write(err.to_string()))?;
        Ok(())
    }

    fn load_aggregated_log(
        &self,
        date: Date,
        kind: &str,
    ) -> Result<Option<AggregatedLogRow>, StoreError> {
        self.read_aggregated_log(date, kind).map_err(|err| StoreError::Read(err.to_string()))
    }

    fn load_component_run(&self, job_id: &str) -> Result<Option<ComponentRunRow>, StoreError> {
        self.read_component_run(job_id).map_err(|err| StoreError::Read(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Quotes a Postgres identifier, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Verifies the connection answers a trivial query.
fn ping(client: &mut Client) -> Result<(), PostgresStoreError> {
    client
        .query_one("SELECT 1", &[])
        .map(drop)
        .map_err(|err| PostgresStoreError::Connection(err.to_string()))
}

/// Creates `database` when the server has no such database.
fn ensure_database(client: &mut Client, database: &str) -> Result<(), PostgresStoreError> {
    let exists = client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&database])
        .map_err(|err| PostgresStoreError::Bootstrap(err.to_string()))?
        .is_some();
    if exists {
        return Ok(());
    }
    client
        .batch_execute(&format!("CREATE DATABASE {}", quote_identifier(database)))
        .map_err(|err| PostgresStoreError::Bootstrap(err.to_string()))?;
    info!(database = %database, "created postgres database");
    Ok(())
}

/// Maps a column decode failure.
fn invalid(err: postgres::Error) -> PostgresStoreError {
    PostgresStoreError::Invalid(err.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("certsuite_usage"), "\"certsuite_usage\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn redacted_forms_omit_password() {
        let config = PostgresStoreConfig {
            password: "hunter2".to_string(),
            ..PostgresStoreConfig::default()
        };
        assert_eq!(config.redacted_target(), "postgres@localhost:5432/certsuite_usage");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let config = PostgresStoreConfig {
            database: "  ".to_string(),
            ..PostgresStoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(PostgresStoreError::Config(_))));
        let config = PostgresStoreConfig {
            max_connections: 0,
            ..PostgresStoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(PostgresStoreError::Config(_))));
    }

    #[test]
    fn error_mapping_keeps_stage() {
        assert!(matches!(
            StoreError::from(PostgresStoreError::Bootstrap("denied".to_string())),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            StoreError::from(PostgresStoreError::Invalid("bad".to_string())),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            StoreError::from(PostgresStoreError::Config("port must be non-zero".to_string())),
            StoreError::Connection(_)
        ));
    }
}
