//! Config loading and validation tests for certsuite-usage-config.
// crates/certsuite-usage-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading Tests
// Description: File formats, environment overlay, and required values.
// Purpose: Ensure configuration resolves and fails by field name.
// =============================================================================

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use certsuite_usage_config::ConfigError;
use certsuite_usage_config::UsageConfig;
use certsuite_usage_core::BackendResolution;
use certsuite_usage_core::StoreBackend;
use tempfile::TempDir;

type TestResult = Result<(), String>;

const FULL_TOML: &str = r#"
[registry]
bearer_token = "file-token"
namespace = "redhat-best-practices-for-k8s"
repository = "certsuite"

[ci]
client_id = "remoteci/abc"
api_secret = "file-secret"
page_size = 50

[http]
timeout_ms = 10000

[database]
backend = "sqlite"

[database.sqlite]
path = "data/usage.db"
"#;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| map.get(key).cloned()
}

fn write(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf, String> {
    let path = dir.path().join(name);
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok(path)
}

fn expect_missing(result: Result<UsageConfig, ConfigError>, expected: &str) -> TestResult {
    match result {
        Err(ConfigError::Missing {
            field, ..
        }) if field == expected => Ok(()),
        Err(other) => Err(format!("expected missing {expected}, got {other}")),
        Ok(_) => Err(format!("expected missing {expected}, got valid config")),
    }
}

#[test]
fn toml_file_loads_and_validates() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", FULL_TOML)?;
    let config =
        UsageConfig::load_with_env(Some(&path), env_of(&[])).map_err(|err| err.to_string())?;
    if config.ci.page_size != 50 || config.http.timeout_ms != 10_000 {
        return Err(format!("unexpected values: {:?} {:?}", config.ci.page_size, config.http));
    }
    if config.sqlite_store_config().path != Path::new("data/usage.db") {
        return Err("sqlite path not taken from file".to_string());
    }
    let target = config.registry_target().map_err(|err| err.to_string())?;
    if target.repository != "certsuite" {
        return Err(format!("unexpected repository {}", target.repository));
    }
    Ok(())
}

#[test]
fn json_file_is_parsed_by_extension() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let json = r#"{
        "registry": {"bearer_token": "t", "namespace": "ns", "repository": "repo"},
        "ci": {"client_id": "id", "api_secret": "secret"}
    }"#;
    let path = write(&dir, "usage.json", json)?;
    let config =
        UsageConfig::load_with_env(Some(&path), env_of(&[])).map_err(|err| err.to_string())?;
    if config.registry.namespace.as_deref() != Some("ns") {
        return Err("namespace not parsed from json".to_string());
    }
    Ok(())
}

#[test]
fn environment_overrides_file_values() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", FULL_TOML)?;
    let env = env_of(&[
        ("BEARER_TOKEN", "env-token"),
        ("DB_CHOICE", "remote"),
        ("DB_USER", "usage"),
        ("DB_PASSWORD", "pw"),
        ("DB_URL", "db.internal"),
        ("DB_PORT", "6543"),
        ("DB_NAME", "usage_db"),
    ]);
    let config = UsageConfig::load_with_env(Some(&path), env).map_err(|err| err.to_string())?;
    let quay = config.quay_client_config().map_err(|err| err.to_string())?;
    if quay.bearer_token != "env-token" {
        return Err("bearer token not overridden".to_string());
    }
    if config.database.resolution() != BackendResolution::Recognized(StoreBackend::Postgres) {
        return Err("backend not overridden".to_string());
    }
    let postgres = config.postgres_store_config().map_err(|err| err.to_string())?;
    if postgres.redacted_target() != "usage@db.internal:6543/usage_db" {
        return Err(format!("unexpected target {}", postgres.redacted_target()));
    }
    if postgres.password != "pw" {
        return Err("password not overridden".to_string());
    }
    Ok(())
}

#[test]
fn blank_environment_values_are_ignored() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", FULL_TOML)?;
    let config = UsageConfig::load_with_env(Some(&path), env_of(&[("BEARER_TOKEN", "  ")]))
        .map_err(|err| err.to_string())?;
    if config.registry.bearer_token.as_deref() != Some("file-token") {
        return Err("blank env value replaced file value".to_string());
    }
    Ok(())
}

#[test]
fn environment_alone_is_sufficient() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    let env = env_of(&[
        ("BEARER_TOKEN", "t"),
        ("NAMESPACE", "ns"),
        ("REPOSITORY", "repo"),
        ("CLIENT_ID", "id"),
        ("API_SECRET", "secret"),
    ]);
    if UsageConfig::load_with_env(Some(&missing), env_of(&[])).is_ok() {
        return Err("missing explicit file should fail".to_string());
    }
    let mut config = UsageConfig::default();
    config.apply_env(env).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.database.resolution().backend() != StoreBackend::Sqlite {
        return Err("default backend should be sqlite".to_string());
    }
    Ok(())
}

#[test]
fn config_path_comes_from_environment_variable() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "from-env.toml", FULL_TOML)?;
    let path_text = path.to_string_lossy().to_string();
    let config = UsageConfig::load_with_env(None, env_of(&[("CERTSUITE_USAGE_CONFIG", path_text.as_str())]))
        .map_err(|err| err.to_string())?;
    if config.ci.client_id.as_deref() != Some("remoteci/abc") {
        return Err("config not loaded from env path".to_string());
    }
    Ok(())
}

#[test]
fn missing_bearer_token_is_named() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", &FULL_TOML.replace("bearer_token = \"file-token\"", ""))?;
    expect_missing(UsageConfig::load_with_env(Some(&path), env_of(&[])), "registry.bearer_token")
}

#[test]
fn missing_api_secret_is_named() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", &FULL_TOML.replace("api_secret = \"file-secret\"", ""))?;
    expect_missing(UsageConfig::load_with_env(Some(&path), env_of(&[])), "ci.api_secret")
}

#[test]
fn postgres_backend_requires_user() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", FULL_TOML)?;
    expect_missing(
        UsageConfig::load_with_env(Some(&path), env_of(&[("DB_CHOICE", "postgres")])),
        "database.postgres.user",
    )
}

#[test]
fn invalid_port_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", FULL_TOML)?;
    match UsageConfig::load_with_env(Some(&path), env_of(&[("DB_PORT", "not-a-port")])) {
        Err(ConfigError::Invalid(message)) if message.contains("DB_PORT") => Ok(()),
        other => Err(format!("expected invalid port, got {other:?}")),
    }
}

#[test]
fn unknown_fields_are_parse_errors() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", &format!("{FULL_TOML}\n[extra]\nkey = 1\n"))?;
    match UsageConfig::load_with_env(Some(&path), env_of(&[])) {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn unrecognized_backend_falls_back_to_sqlite() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", FULL_TOML)?;
    let config = UsageConfig::load_with_env(Some(&path), env_of(&[("DB_CHOICE", "mysql")]))
        .map_err(|err| err.to_string())?;
    match config.database.resolution() {
        BackendResolution::Unrecognized(flag) if flag == "mysql" => Ok(()),
        other => Err(format!("unexpected resolution {other:?}")),
    }
}

#[test]
fn flat_camel_case_json_is_accepted() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let json = r#"{"bearerToken":"t","clientID":"id","apiSecret":"s","namespace":"ns","repository":"repo"}"#;
    let path = write(&dir, "config.json", json)?;
    let config =
        UsageConfig::load_with_env(Some(&path), env_of(&[])).map_err(|err| err.to_string())?;
    let dci = config.dci_client_config().map_err(|err| err.to_string())?;
    if dci.client_id != "id" || dci.api_secret != "s" {
        return Err(format!("unexpected ci credentials {dci:?}"));
    }
    let target = config.registry_target().map_err(|err| err.to_string())?;
    if target.namespace != "ns" || target.repository != "repo" {
        return Err(format!("unexpected target {target:?}"));
    }
    if config.registry.bearer_token.as_deref() != Some("t") {
        return Err("bearer token not read from flat json".to_string());
    }
    if config.database.resolution().backend() != StoreBackend::Sqlite {
        return Err("flat json should keep the default backend".to_string());
    }
    Ok(())
}

#[test]
fn flat_json_takes_environment_overrides() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let json = r#"{"clientID":"id","apiSecret":"s","namespace":"ns","repository":"repo"}"#;
    let path = write(&dir, "config.json", json)?;
    let config = UsageConfig::load_with_env(Some(&path), env_of(&[("BEARER_TOKEN", "env-token")]))
        .map_err(|err| err.to_string())?;
    if config.registry.bearer_token.as_deref() != Some("env-token") {
        return Err("bearer token not taken from environment".to_string());
    }
    Ok(())
}

#[test]
fn json_matching_neither_layout_reports_sectioned_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "config.json", r#"{"bearerToken":"t","token":"x"}"#)?;
    match UsageConfig::load_with_env(Some(&path), env_of(&[])) {
        Err(ConfigError::Parse(message)) if message.contains("bearerToken") => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn unknown_http_fields_are_parse_errors() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write(&dir, "usage.toml", &FULL_TOML.replace("timeout_ms", "timeout_msec"))?;
    match UsageConfig::load_with_env(Some(&path), env_of(&[])) {
        Err(ConfigError::Parse(message)) if message.contains("timeout_msec") => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}
