//! `depwise config` command implementation.
//!
//! Prints the merged settings as TOML. The registry token is redacted.

use depwise_config::{CliOverrides, ConfigSource, LoadedConfig};
use depwise_core::error::DepwiseResult;

use super::CommandContext;

/// Execute the `depwise config` command
pub async fn execute(ctx: &CommandContext) -> DepwiseResult<()> {
    let loaded = ctx.load_config(&CliOverrides::default()).await?;

    for line in describe_sources(&loaded) {
        ctx.output.info(&line);
    }
    ctx.output.document(&render(&loaded)?);
    Ok(())
}

/// Effective settings as TOML, safe to print
pub fn render(loaded: &LoadedConfig) -> DepwiseResult<String> {
    loaded.settings.redacted().to_toml_string()
}

/// One line per layer that contributed
pub fn describe_sources(loaded: &LoadedConfig) -> Vec<String> {
    if loaded.sources.is_empty() {
        return vec!["Using built-in defaults".to_string()];
    }

    loaded
        .sources
        .iter()
        .map(|source| match source {
            ConfigSource::Global(path) => format!("Global config: {}", path),
            ConfigSource::Project(path) => format!("Project config: {}", path),
            ConfigSource::Environment(key) => format!("Environment: {}", key),
            ConfigSource::CommandLine => "Command-line flags".to_string(),
        })
        .collect()
}
