//! Configuration parsing for depwise
//!
//! This crate handles the two configuration boundaries of the advisor:
//! `package.json` (dependency sections, workspaces and the three override
//! field shapes, normalized into one flat map) and `depwise.toml` (advisor and
//! registry settings), layered with global config, environment and CLI flags.

pub mod json;
pub mod merge;
pub mod toml;

// Re-export main types
pub use json::{normalize_npm_overrides, normalize_yarn_resolutions, PackageJson, WorkspacesConfig};
pub use merge::{CliOverrides, ConfigLayering, ConfigLoader, ConfigSource, LoadedConfig};
pub use crate::toml::{AdvisorSection, AdvisorSettings, DepwiseToml, RegistrySection, RegistrySettings, Settings};

use depwise_core::error::DepwiseError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, DepwiseError>;

/// Project configuration file name
pub const CONFIG_FILE: &str = "depwise.toml";
