// crates/certsuite-usage-cli/src/main.rs
// ============================================================================
// Module: Certsuite Usage CLI Entry Point
// Description: Command dispatcher for usage ingestion and config checks.
// Purpose: Run both aggregators once and report the outcome via exit code.
// Dependencies: clap, certsuite-usage-{config, core, providers}, tracing
// ============================================================================

//! ## Overview
//! `certsuite-usage fetch` ingests registry pull counts and then CI component
//! runs into the configured store. `certsuite-usage config validate` checks
//! the resolved configuration without touching the network. Any failure is
//! written to stderr and the process exits non-zero.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use certsuite_usage_cli::DatabaseGateway;
use certsuite_usage_cli::init_logging;
use certsuite_usage_config::UsageConfig;
use certsuite_usage_core::CiJobAggregator;
use certsuite_usage_core::FetchError;
use certsuite_usage_core::IngestError;
use certsuite_usage_core::RegistryUsageAggregator;
use certsuite_usage_core::UsageReport;
use certsuite_usage_core::fetch_usage;
use certsuite_usage_providers::DciClient;
use certsuite_usage_providers::QuayClient;
use clap::ArgAction;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tracing::error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "certsuite-usage", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to `CERTSUITE_USAGE_CONFIG` or `certsuite-usage.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch registry and CI usage data into the configured store.
    Fetch,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the resolved configuration.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a rendered message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("certsuite-usage {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    init_logging();
    match command {
        Commands::Fetch => command_fetch(cli.config.as_deref()),
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate => command_config_validate(cli.config.as_deref()),
        },
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the fetch command.
fn command_fetch(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let gateway = DatabaseGateway::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let target = config
        .registry_target()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let quay_config = config
        .quay_client_config()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let dci_config = config
        .dci_client_config()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;

    let quay = QuayClient::new(&quay_config, &config.http).map_err(|err| {
        fetch_failed(&FetchError::Registry(IngestError::ClientInit(err.to_string())))
    })?;
    let dci = DciClient::new(&dci_config, &config.http)
        .map_err(|err| fetch_failed(&FetchError::Ci(IngestError::ClientInit(err.to_string()))))?;

    let registry = RegistryUsageAggregator::new(&quay, &gateway, target);
    let ci = CiJobAggregator::new(&dci, &gateway);
    let report = fetch_usage(&registry, &ci).map_err(|err| fetch_failed(&err))?;

    write_stdout_line(&format_report(&report))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the config validation command.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let gateway = DatabaseGateway::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line(&format!("config valid (backend: {})", gateway.backend()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<UsageConfig> {
    UsageConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Logs a pipeline failure and converts it into a [`CliError`].
fn fetch_failed(err: &FetchError) -> CliError {
    error!(error = %err, "usage fetch failed");
    CliError::new(err.to_string())
}

/// Renders the fetch summary line.
fn format_report(report: &UsageReport) -> String {
    format!(
        "registry: {} fetched, {} upserted; ci: {} fetched, {} upserted",
        report.registry.fetched, report.registry.upserts, report.ci.fetched, report.ci.upserts
    )
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(help.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
