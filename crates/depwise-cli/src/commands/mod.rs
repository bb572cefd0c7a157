//! Command implementations and dispatch logic.

use camino::Utf8PathBuf;
use depwise_config::{ConfigLayering, ConfigLoader, CliOverrides, LoadedConfig};
use depwise_core::error::{DepwiseError, DepwiseResult};
use tracing::info;

pub mod analyze;
pub mod config;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    /// Directory holding `.depwise/config.toml`
    pub home: Option<Utf8PathBuf>,
    pub output: OutputHandler,
}

impl CommandContext {
    pub fn new() -> DepwiseResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| {
            DepwiseError::io("Failed to get current directory".to_string(), e)
        })?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| DepwiseError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("working directory is not valid UTF-8: {}", e),
        })?;
        let home = dirs::home_dir().and_then(|home| Utf8PathBuf::try_from(home).ok());

        Ok(Self {
            cwd,
            home,
            output: OutputHandler::new(),
        })
    }

    /// Layered configuration as seen from the working directory
    pub async fn load_config(&self, overrides: &CliOverrides) -> DepwiseResult<LoadedConfig> {
        ConfigLoader::new(self.cwd.clone())
            .with_home(self.home.clone())
            .load(&ConfigLayering::collect_env_overrides(), overrides)
            .await
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> DepwiseResult<()> {
    match command {
        Commands::Analyze(args) => {
            info!("Analyzing snapshot: {}", args.snapshot);
            analyze::execute(args, ctx).await
        }
        Commands::Config => {
            info!("Printing effective configuration");
            config::execute(ctx).await
        }
    }
}
