// crates/certsuite-usage-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Usage Store
// Description: Durable UsageStore backed by a SQLite file.
// Purpose: Upsert aggregated logs and component runs with the shared policy.
// Dependencies: certsuite-usage-core, rusqlite, serde, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! [`SqliteUsageStore`] owns one connection for the lifetime of an aggregator
//! run. Dates are stored as `YYYY-MM-DD` text and creation instants as
//! RFC 3339 text in UTC. Aggregated log counts accumulate on a
//! `(datetime, kind)` conflict; component runs replace the stored row on a
//! `job_id` conflict.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use certsuite_usage_core::AggregatedLogRow;
use certsuite_usage_core::ComponentRunRow;
use certsuite_usage_core::ResultTotals;
use certsuite_usage_core::StoreError;
use certsuite_usage_core::UsageStore;
use certsuite_usage_core::format_store_date;
use certsuite_usage_core::parse_store_date;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

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
        created_at TIMESTAMP NOT NULL,
        total_success BIGINT NOT NULL DEFAULT 0,
        total_failures BIGINT NOT NULL DEFAULT 0,
        total_errors BIGINT NOT NULL DEFAULT 0,
        total_skips BIGINT NOT NULL DEFAULT 0
    );";

/// Inserts a log row or adds to the stored count.
const UPSERT_AGGREGATED_LOG_SQL: &str = "INSERT INTO aggregated_logs (datetime, kind, count)
    VALUES (?1, ?2, ?3)
    ON CONFLICT (datetime, kind) DO UPDATE SET count = aggregated_logs.count + excluded.count";

/// Inserts a component run or replaces every stored column.
const UPSERT_COMPONENT_RUN_SQL: &str = "INSERT INTO dci_components (
        job_id, commit_hash, created_at,
        total_success, total_failures, total_errors, total_skips
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT (job_id) DO UPDATE SET
        commit_hash = excluded.commit_hash,
        created_at = excluded.created_at,
        total_success = excluded.total_success,
        total_failures = excluded.total_failures,
        total_errors = excluded.total_errors,
        total_skips = excluded.total_skips";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for the `SQLite` usage store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// The store path cannot be opened as a database file.
    #[error("sqlite store path invalid: {0}")]
    Path(String),
    /// Invalid stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(_) | SqliteStoreError::Db(_) | SqliteStoreError::Path(_) => {
                Self::Connection(error.to_string())
            }
            SqliteStoreError::Invalid(_) => Self::Validation(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed usage store.
pub struct SqliteUsageStore {
    /// Connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteUsageStore {
    /// Opens the database file, creating it and its parent directories when
    /// absent, and verifies the connection answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid or the database
    /// cannot be opened.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        ping(&connection)?;
        info!(path = %config.path.display(), "connected to sqlite usage store");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Creates the usage tables.
    fn create_tables(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute_batch(SCHEMA_SQL).map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    /// Writes one aggregated log row.
    fn write_aggregated_log(&self, row: &AggregatedLogRow) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                UPSERT_AGGREGATED_LOG_SQL,
                params![format_store_date(row.date), row.kind, row.count],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Writes one component run row.
    fn write_component_run(&self, row: &ComponentRunRow) -> Result<(), SqliteStoreError> {
        let created_at = format_instant(row.created_at)?;
        let guard = self.lock()?;
        guard
            .execute(
                UPSERT_COMPONENT_RUN_SQL,
                params![
                    row.job_id,
                    row.commit_hash,
                    created_at,
                    row.totals.success,
                    row.totals.failures,
                    row.totals.errors,
                    row.totals.skips,
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Reads one aggregated log row.
    fn read_aggregated_log(
        &self,
        date: Date,
        kind: &str,
    ) -> Result<Option<AggregatedLogRow>, SqliteStoreError> {
        let stored: Option<(String, String, i64)> = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT datetime, kind, count FROM aggregated_logs
                     WHERE datetime = ?1 AND kind = ?2",
                    params![format_store_date(date), kind],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?
        };
        let Some((date_text, kind, count)) = stored else {
            return Ok(None);
        };
        let date = parse_store_date(&date_text)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        Ok(Some(AggregatedLogRow {
            date,
            kind,
            count,
        }))
    }

    /// Reads one component run row.
    fn read_component_run(
        &self,
        job_id: &str,
    ) -> Result<Option<ComponentRunRow>, SqliteStoreError> {
        let stored = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT job_id, commit_hash, created_at,
                            total_success, total_failures, total_errors, total_skips
                     FROM dci_components WHERE job_id = ?1",
                    params![job_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            ResultTotals {
                                success: row.get(3)?,
                                failures: row.get(4)?,
                                errors: row.get(5)?,
                                skips: row.get(6)?,
                            },
                        ))
                    },
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?
        };
        let Some((job_id, commit_hash, created_at, totals)) = stored else {
            return Ok(None);
        };
        let created_at = OffsetDateTime::parse(&created_at, &Rfc3339)
            .map_err(|err| SqliteStoreError::Invalid(format!("created_at {created_at:?}: {err}")))?;
        Ok(Some(ComponentRunRow {
            job_id,
            commit_hash,
            created_at,
            totals,
        }))
    }
}

impl UsageStore for SqliteUsageStore {
    fn ensure_tables(&self) -> Result<(), StoreError> {
        self.create_tables().map_err(|err| StoreError::Schema(err.to_string()))?;
        debug!("sqlite usage tables ready");
        Ok(())
    }

    fn upsert_aggregated_log(&self, row: &AggregatedLogRow) -> Result<(), StoreError> {
        row.validate()?;
        self.write_aggregated_log(row).map_err(|err| StoreError::Write(err.to_string()))
    }

    fn upsert_component_run(&self, row: &ComponentRunRow) -> Result<(), StoreError> {
        row.validate()?;
        self.write_component_run(row).map_err(|err| StoreError::Write(err.to_string()))
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

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for length limits and file type.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Path("store path is empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Path("store path exceeds length limit".to_string()));
    }
    if path
        .components()
        .any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(SqliteStoreError::Path(
            "store path contains an overlong component".to_string(),
        ));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Path(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens a connection and applies pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Verifies the connection answers a trivial query.
fn ping(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))
        .map(|_| ())
        .map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Renders an instant as RFC 3339 text in UTC.
fn format_instant(value: OffsetDateTime) -> Result<String, SqliteStoreError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|err| SqliteStoreError::Invalid(format!("created_at: {err}")))
}
