//! # depwise-cli
//!
//! Dependency conflict advisor for JavaScript projects.
//!
//! This is the entry point for the `depwise` binary. It parses arguments,
//! sets up logging and the async runtime, and dispatches to the command
//! handlers. The JSON report goes to stdout; logs and messages go to stderr.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use depwise_core::error::{DepwiseError, DepwiseResult};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::analyze::AnalyzeArgs;
use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Classify dependency conflicts and rank the ways to fix them
#[derive(Debug, Parser)]
#[command(name = "depwise", version, about = "Dependency conflict advisor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a project snapshot and print the JSON report
    Analyze(AnalyzeArgs),
    /// Print the effective layered configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_format);
    setup_panic_handler();

    debug!("Starting depwise v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprint!("{}", ErrorFormatter::new().format_error(&error));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> DepwiseResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| DepwiseError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new()?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "depwise={level},depwise_analyzer={level},depwise_registry={level},depwise_config={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("depwise encountered an unexpected error: {}", panic_info);
        eprintln!("depwise crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
