//! Configuration layering, fallback logic, and environment overrides
//!
//! Precedence, lowest first: built-in defaults, `~/.depwise/config.toml`,
//! the nearest `depwise.toml` above the working directory, `DEPWISE_*`
//! environment variables, command-line flags.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use depwise_core::error::DepwiseError;
use depwise_core::types::Strategy;
use tracing::debug;

use crate::toml::{validate_registry_url, DepwiseToml, Settings};
use crate::{ConfigResult, CONFIG_FILE};

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Home directory holding `.depwise/config.toml`
    home: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project depwise.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Settings given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub strategy: Option<Strategy>,
    /// `--allow-major`
    pub allow_major: bool,
    /// `--target name=version`, in flag order
    pub targets: Vec<(String, String)>,
    /// `--offline`
    pub offline: bool,
    /// `--registry URL`
    pub registry: Option<String>,
}

impl CliOverrides {
    fn is_empty(&self) -> bool {
        self == &CliOverrides::default()
    }
}

/// Effective settings plus the layers that contributed to them
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new configuration loader rooted at `cwd`
    pub fn new(cwd: Utf8PathBuf) -> Self {
        let home = dirs::home_dir().and_then(|home| Utf8PathBuf::try_from(home).ok());
        Self { cwd, home }
    }

    /// Use a different home directory (or none) for the global layer
    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Find a file in the working directory or its ancestors
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.is_file())
    }

    /// Location of the global configuration file
    pub fn global_config_path(&self) -> Option<Utf8PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(".depwise").join("config.toml"))
    }

    /// Load global configuration
    pub async fn load_global_config(&self) -> ConfigResult<Option<(DepwiseToml, Utf8PathBuf)>> {
        match self.global_config_path() {
            Some(path) if path.is_file() => {
                let config = crate::toml::load_from_file(&path).await?;
                Ok(Some((config, path)))
            }
            _ => Ok(None),
        }
    }

    /// Load the nearest project depwise.toml
    pub async fn load_project_config(&self) -> ConfigResult<Option<(DepwiseToml, Utf8PathBuf)>> {
        match self.resolve_config_path(CONFIG_FILE) {
            Some(path) => {
                let config = crate::toml::load_from_file(&path).await?;
                Ok(Some((config, path)))
            }
            None => Ok(None),
        }
    }

    /// Load every layer and merge them
    pub async fn load(
        &self,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &CliOverrides,
    ) -> ConfigResult<LoadedConfig> {
        let mut sources = Vec::new();

        let global = self.load_global_config().await?.map(|(config, path)| {
            sources.push(ConfigSource::Global(path));
            config
        });

        let project = self.load_project_config().await?.map(|(config, path)| {
            sources.push(ConfigSource::Project(path));
            config
        });

        let settings =
            ConfigLayering::merge_configs(global, project, env_overrides, cli_overrides)?;

        let mut env_keys: Vec<&String> = env_overrides
            .keys()
            .filter(|key| is_known_env(key))
            .collect();
        env_keys.sort();
        sources.extend(env_keys.into_iter().map(|key| ConfigSource::Environment(key.clone())));

        if !cli_overrides.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }

        debug!(layers = sources.len(), "Configuration loaded");
        Ok(LoadedConfig { settings, sources })
    }
}

const ENV_STRATEGY: &str = "DEPWISE_STRATEGY";
const ENV_ALLOW_MAJOR: &str = "DEPWISE_ALLOW_MAJOR";
const ENV_REGISTRY: &str = "DEPWISE_REGISTRY";
const ENV_OFFLINE: &str = "DEPWISE_OFFLINE";
const ENV_TOKEN: &str = "DEPWISE_TOKEN";

fn is_known_env(key: &str) -> bool {
    matches!(
        key,
        ENV_STRATEGY | ENV_ALLOW_MAJOR | ENV_REGISTRY | ENV_OFFLINE | ENV_TOKEN
    )
}

impl ConfigLayering {
    /// Merge multiple configuration layers over the defaults
    pub fn merge_configs(
        global_config: Option<DepwiseToml>,
        project_config: Option<DepwiseToml>,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &CliOverrides,
    ) -> ConfigResult<Settings> {
        let mut merged = Settings::default();

        for layer in global_config.iter().chain(project_config.iter()) {
            merged.apply(layer);
        }

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, env_overrides)?;

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, cli_overrides)?;

        merged.validate()?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut Settings,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                ENV_STRATEGY => {
                    config.advisor.strategy = value.parse::<Strategy>().map_err(|_| {
                        DepwiseError::ConfigValidation {
                            field: ENV_STRATEGY.to_string(),
                            reason: format!(
                                "'{}' is not one of conservative, balanced, aggressive",
                                value
                            ),
                        }
                    })?;
                }
                ENV_ALLOW_MAJOR => {
                    config.advisor.allow_major = parse_bool(value, ENV_ALLOW_MAJOR)?;
                }
                ENV_REGISTRY => {
                    validate_registry_url(value, ENV_REGISTRY)?;
                    config.registry.url = value.clone();
                }
                ENV_OFFLINE => {
                    config.registry.offline = parse_bool(value, ENV_OFFLINE)?;
                }
                ENV_TOKEN => {
                    config.registry.token = Some(value.clone());
                }
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut Settings, overrides: &CliOverrides) -> ConfigResult<()> {
        if let Some(strategy) = overrides.strategy {
            config.advisor.strategy = strategy;
        }
        if overrides.allow_major {
            config.advisor.allow_major = true;
        }
        for (name, version) in &overrides.targets {
            config.advisor.targets.insert(name.clone(), version.clone());
        }
        if overrides.offline {
            config.registry.offline = true;
        }
        if let Some(url) = &overrides.registry {
            validate_registry_url(url, "--registry")?;
            config.registry.url = url.clone();
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("DEPWISE_"))
            .collect()
    }
}

fn parse_bool(value: &str, field: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DepwiseError::ConfigValidation {
            field: field.to_string(),
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}
