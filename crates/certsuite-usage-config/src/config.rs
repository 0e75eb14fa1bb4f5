// crates/certsuite-usage-config/src/config.rs
// ============================================================================
// Module: Certsuite Usage Configuration
// Description: Config model, file loading, environment overlay, validation.
// Purpose: Provide validated settings for clients, stores, and the CLI.
// Dependencies: certsuite-usage-{core,providers,store-sqlite,store-postgres}, serde, toml
// ============================================================================

//! ## Overview
//! Resolution order for the config file: explicit path, then the
//! `CERTSUITE_USAGE_CONFIG` environment variable, then `certsuite-usage.toml`
//! in the working directory when it exists. A missing default file yields the
//! built-in defaults. Environment variables are applied on top of the file,
//! and validation reports the first missing or invalid value by field name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use certsuite_usage_core::BackendResolution;
use certsuite_usage_core::RegistryTarget;
use certsuite_usage_core::StoreBackend;
use certsuite_usage_providers::DEFAULT_DCI_BASE_URL;
use certsuite_usage_providers::DEFAULT_PAGE_SIZE;
use certsuite_usage_providers::DEFAULT_QUAY_BASE_URL;
use certsuite_usage_providers::DciClientConfig;
use certsuite_usage_providers::HttpClientConfig;
use certsuite_usage_providers::QuayClientConfig;
use certsuite_usage_store_postgres::PostgresStoreConfig;
use certsuite_usage_store_sqlite::SqliteJournalMode;
use certsuite_usage_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default config filename.
pub const DEFAULT_CONFIG_NAME: &str = "certsuite-usage.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CERTSUITE_USAGE_CONFIG";
/// Default `SQLite` database path.
pub const DEFAULT_SQLITE_PATH: &str = "certsuite-usage.db";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Registry bearer token variable.
pub const ENV_BEARER_TOKEN: &str = "BEARER_TOKEN";
/// Registry namespace variable.
pub const ENV_NAMESPACE: &str = "NAMESPACE";
/// Registry repository variable.
pub const ENV_REPOSITORY: &str = "REPOSITORY";
/// CI client id variable.
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
/// CI API secret variable.
pub const ENV_API_SECRET: &str = "API_SECRET";
/// Storage backend choice variable.
pub const ENV_DB_CHOICE: &str = "DB_CHOICE";
/// Postgres user variable.
pub const ENV_DB_USER: &str = "DB_USER";
/// Postgres password variable.
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
/// Postgres host variable.
pub const ENV_DB_URL: &str = "DB_URL";
/// Postgres port variable.
pub const ENV_DB_PORT: &str = "DB_PORT";
/// Postgres database name variable.
pub const ENV_DB_NAME: &str = "DB_NAME";
/// `SQLite` path variable.
pub const ENV_SQLITE_PATH: &str = "SQLITE_PATH";

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level usage ingestion configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsageConfig {
    /// Registry API settings.
    pub registry: RegistryConfig,
    /// CI API settings.
    pub ci: CiConfig,
    /// Shared HTTP transport settings.
    pub http: HttpClientConfig,
    /// Storage backend settings.
    pub database: DatabaseConfig,
}

/// Registry API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// OAuth bearer token.
    pub bearer_token: Option<String>,
    /// Registry namespace (organization).
    pub namespace: Option<String>,
    /// Repository name.
    pub repository: Option<String>,
    /// API base URL.
    pub base_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bearer_token: None,
            namespace: None,
            repository: None,
            base_url: DEFAULT_QUAY_BASE_URL.to_string(),
        }
    }
}

/// CI API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CiConfig {
    /// Remote CI client identifier.
    pub client_id: Option<String>,
    /// Remote CI API secret.
    pub api_secret: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Jobs requested per page.
    pub page_size: u32,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            api_secret: None,
            base_url: DEFAULT_DCI_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Backend flag (`sqlite`/`local` or `postgres`/`remote`/`aws`).
    pub backend: Option<String>,
    /// Embedded-local backend settings.
    pub sqlite: SqliteSection,
    /// Networked-remote backend settings.
    pub postgres: PostgresSection,
}

impl DatabaseConfig {
    /// Resolves the backend flag.
    #[must_use]
    pub fn resolution(&self) -> BackendResolution {
        StoreBackend::resolve(self.backend.as_deref())
    }
}

/// Embedded-local backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteSection {
    /// Database file path.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Journal mode.
    pub journal_mode: SqliteJournalMode,
}

impl Default for SqliteSection {
    fn default() -> Self {
        let defaults = SqliteStoreConfig::new(DEFAULT_SQLITE_PATH);
        Self {
            path: defaults.path,
            busy_timeout_ms: defaults.busy_timeout_ms,
            journal_mode: defaults.journal_mode,
        }
    }
}

/// Networked-remote backend settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresSection {
    /// Role name.
    pub user: Option<String>,
    /// Role password.
    pub password: Option<String>,
    /// Server host.
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

impl Default for PostgresSection {
    fn default() -> Self {
        let defaults = PostgresStoreConfig::default();
        Self {
            user: None,
            password: None,
            host: defaults.host,
            port: defaults.port,
            database: defaults.database,
            connect_timeout_ms: defaults.connect_timeout_ms,
            max_connections: defaults.max_connections,
        }
    }
}

impl std::fmt::Debug for PostgresSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSection")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Flat camelCase JSON layout carrying only the API credentials and target.
///
/// Accepted for `.json` files that do not match the sectioned layout; every
/// other setting keeps its default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FlatJsonConfig {
    /// OAuth bearer token.
    bearer_token: Option<String>,
    /// Remote CI client identifier.
    #[serde(rename = "clientID")]
    client_id: Option<String>,
    /// Remote CI API secret.
    api_secret: Option<String>,
    /// Registry namespace (organization).
    namespace: Option<String>,
    /// Repository name.
    repository: Option<String>,
}

impl FlatJsonConfig {
    /// Maps the flat fields onto their sections.
    fn into_config(self) -> UsageConfig {
        let mut config = UsageConfig::default();
        config.registry.bearer_token = self.bearer_token;
        config.registry.namespace = self.namespace;
        config.registry.repository = self.repository;
        config.ci.client_id = self.client_id;
        config.ci.api_secret = self.api_secret;
        config
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl UsageConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration using `lookup` for environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => Self::from_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML or JSON file, chosen by extension, without validating.
    ///
    /// JSON files may use either the sectioned layout or the flat camelCase
    /// credential layout (`bearerToken`, `clientID`, `apiSecret`,
    /// `namespace`, `repository`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(content).or_else(|err| {
                serde_json::from_str::<FlatJsonConfig>(content)
                    .map(FlatJsonConfig::into_config)
                    .map_err(|_| ConfigError::Parse(err.to_string()))
            })
        } else {
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
        }
    }

    /// Overlays environment variables; empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `DB_PORT` is not a port number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = get(ENV_BEARER_TOKEN) {
            self.registry.bearer_token = Some(value);
        }
        if let Some(value) = get(ENV_NAMESPACE) {
            self.registry.namespace = Some(value);
        }
        if let Some(value) = get(ENV_REPOSITORY) {
            self.registry.repository = Some(value);
        }
        if let Some(value) = get(ENV_CLIENT_ID) {
            self.ci.client_id = Some(value);
        }
        if let Some(value) = get(ENV_API_SECRET) {
            self.ci.api_secret = Some(value);
        }
        if let Some(value) = get(ENV_DB_CHOICE) {
            self.database.backend = Some(value);
        }
        if let Some(value) = get(ENV_DB_USER) {
            self.database.postgres.user = Some(value);
        }
        if let Some(value) = get(ENV_DB_PASSWORD) {
            self.database.postgres.password = Some(value);
        }
        if let Some(value) = get(ENV_DB_URL) {
            self.database.postgres.host = value;
        }
        if let Some(value) = get(ENV_DB_PORT) {
            self.database.postgres.port = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_DB_PORT} must be a port number, got {value:?}"))
            })?;
        }
        if let Some(value) = get(ENV_DB_NAME) {
            self.database.postgres.database = value;
        }
        if let Some(value) = get(ENV_SQLITE_PATH) {
            self.database.sqlite.path = PathBuf::from(value);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl UsageConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first missing or invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        self.ci.validate()?;
        validate_http(&self.http)?;
        self.database.validate()
    }
}

impl RegistryConfig {
    /// Validates registry settings.
    fn validate(&self) -> Result<(), ConfigError> {
        required(self.bearer_token.as_ref(), "registry.bearer_token", ENV_BEARER_TOKEN)?;
        required(self.namespace.as_ref(), "registry.namespace", ENV_NAMESPACE)?;
        required(self.repository.as_ref(), "registry.repository", ENV_REPOSITORY)?;
        non_empty(&self.base_url, "registry.base_url")
    }
}

impl CiConfig {
    /// Validates CI settings.
    fn validate(&self) -> Result<(), ConfigError> {
        required(self.client_id.as_ref(), "ci.client_id", ENV_CLIENT_ID)?;
        required(self.api_secret.as_ref(), "ci.api_secret", ENV_API_SECRET)?;
        non_empty(&self.base_url, "ci.base_url")?;
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("ci.page_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Validates the settings of the selected backend.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.resolution().backend() {
            StoreBackend::Sqlite => validate_path(&self.sqlite.path),
            StoreBackend::Postgres => {
                let postgres = &self.postgres;
                required(postgres.user.as_ref(), "database.postgres.user", ENV_DB_USER)?;
                non_empty(&postgres.host, "database.postgres.host")?;
                non_empty(&postgres.database, "database.postgres.database")?;
                if postgres.port == 0 {
                    return Err(ConfigError::Invalid(
                        "database.postgres.port must be non-zero".to_string(),
                    ));
                }
                if postgres.max_connections == 0 {
                    return Err(ConfigError::Invalid(
                        "database.postgres.max_connections must be at least 1".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Validates HTTP transport settings.
fn validate_http(http: &HttpClientConfig) -> Result<(), ConfigError> {
    if http.timeout_ms == 0 {
        return Err(ConfigError::Invalid("http.timeout_ms must be at least 1".to_string()));
    }
    if http.max_response_bytes == 0 {
        return Err(ConfigError::Invalid(
            "http.max_response_bytes must be at least 1".to_string(),
        ));
    }
    non_empty(&http.user_agent, "http.user_agent")
}

// ============================================================================
// SECTION: Component Configs
// ============================================================================

impl UsageConfig {
    /// Returns the registry repository to query.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when namespace or repository is unset.
    pub fn registry_target(&self) -> Result<RegistryTarget, ConfigError> {
        Ok(RegistryTarget {
            namespace: required(self.registry.namespace.as_ref(), "registry.namespace", ENV_NAMESPACE)?
                .to_string(),
            repository: required(
                self.registry.repository.as_ref(),
                "registry.repository",
                ENV_REPOSITORY,
            )?
            .to_string(),
        })
    }

    /// Returns the registry client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the bearer token is unset.
    pub fn quay_client_config(&self) -> Result<QuayClientConfig, ConfigError> {
        Ok(QuayClientConfig {
            base_url: self.registry.base_url.clone(),
            bearer_token: required(
                self.registry.bearer_token.as_ref(),
                "registry.bearer_token",
                ENV_BEARER_TOKEN,
            )?
            .to_string(),
        })
    }

    /// Returns the CI client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when a credential is unset.
    pub fn dci_client_config(&self) -> Result<DciClientConfig, ConfigError> {
        Ok(DciClientConfig {
            base_url: self.ci.base_url.clone(),
            client_id: required(self.ci.client_id.as_ref(), "ci.client_id", ENV_CLIENT_ID)?
                .to_string(),
            api_secret: required(self.ci.api_secret.as_ref(), "ci.api_secret", ENV_API_SECRET)?
                .to_string(),
            page_size: self.ci.page_size,
        })
    }

    /// Returns the embedded-local store settings.
    #[must_use]
    pub fn sqlite_store_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.database.sqlite.path.clone(),
            busy_timeout_ms: self.database.sqlite.busy_timeout_ms,
            journal_mode: self.database.sqlite.journal_mode,
        }
    }

    /// Returns the networked-remote store settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the user is unset.
    pub fn postgres_store_config(&self) -> Result<PostgresStoreConfig, ConfigError> {
        let postgres = &self.database.postgres;
        Ok(PostgresStoreConfig {
            user: required(postgres.user.as_ref(), "database.postgres.user", ENV_DB_USER)?
                .to_string(),
            password: postgres.password.clone().unwrap_or_default(),
            host: postgres.host.clone(),
            port: postgres.port,
            database: postgres.database.clone(),
            connect_timeout_ms: postgres.connect_timeout_ms,
            max_connections: postgres.max_connections,
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A required value is unset.
    #[error("missing required config value: {field} (set it in the config file or {env_var})")]
    Missing {
        /// Dotted field path.
        field: &'static str,
        /// Environment variable that can supply it.
        env_var: &'static str,
    },
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, the environment, or the
/// default name when that file exists.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}

/// Returns the value when set and non-blank.
fn required<'a>(
    value: Option<&'a String>,
    field: &'static str,
    env_var: &'static str,
) -> Result<&'a str, ConfigError> {
    value.map(String::as_str).filter(|value| !value.trim().is_empty()).ok_or(
        ConfigError::Missing {
            field,
            env_var,
        },
    )
}

/// Rejects blank strings.
fn non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        let blank = "   ".to_string();
        assert!(matches!(
            required(Some(&blank), "registry.namespace", ENV_NAMESPACE),
            Err(ConfigError::Missing {
                field: "registry.namespace",
                ..
            })
        ));
        assert!(required(None, "ci.client_id", ENV_CLIENT_ID).is_err());
        let value = "ns".to_string();
        assert_eq!(required(Some(&value), "registry.namespace", ENV_NAMESPACE).unwrap(), "ns");
    }

    #[test]
    fn validate_path_rejects_overlong_component() {
        let long_component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let path = PathBuf::from(format!("./{long_component}"));
        assert!(validate_path(&path).is_err());
        assert!(validate_path(Path::new("")).is_err());
        assert!(validate_path(Path::new("data/usage.db")).is_ok());
    }

    #[test]
    fn missing_message_names_env_var() {
        let err = ConfigError::Missing {
            field: "ci.api_secret",
            env_var: ENV_API_SECRET,
        };
        assert_eq!(
            err.to_string(),
            "missing required config value: ci.api_secret (set it in the config file or API_SECRET)"
        );
    }

    #[test]
    fn defaults_need_credentials() {
        assert!(matches!(
            UsageConfig::default().validate(),
            Err(ConfigError::Missing {
                field: "registry.bearer_token",
                ..
            })
        ));
    }
}
