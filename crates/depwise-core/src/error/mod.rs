//! Error types and result aliases for depwise operations.
//!
//! Only the I/O boundaries (configuration, registry access, the CLI) return
//! these errors. The analysis itself never fails; it degrades instead.

use thiserror::Error;

use crate::types::VersionError;

/// Unified error type for all depwise operations
#[derive(Error, Debug)]
pub enum DepwiseError {
    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    TomlParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Failed to parse {file}: {message}")]
    JsonParse { file: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Registry request for '{name}' was rejected: {reason}")]
    Unauthorized { name: String, reason: String },

    // Version errors
    #[error("Invalid version '{input}'")]
    InvalidVersion {
        input: String,
        #[source]
        source: VersionError,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for depwise operations
pub type DepwiseResult<T> = Result<T, DepwiseError>;

impl DepwiseError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DepwiseError::Network { .. } | DepwiseError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            DepwiseError::PackageNotFound { .. } => {
                Some("Check the package name spelling or the configured registry URL")
            },
            DepwiseError::Network { .. } => {
                Some("Check your connection, or rerun with --offline to skip registry lookups")
            },
            DepwiseError::Unauthorized { .. } => {
                Some("Set DEPWISE_TOKEN or [registry].token for private registries")
            },
            DepwiseError::TomlParse { .. } => Some("Fix the syntax error in depwise.toml"),
            DepwiseError::JsonParse { .. } => {
                Some("Make sure the snapshot was produced by a supported package manager")
            },
            DepwiseError::ConfigValidation { .. } => {
                Some("Run 'depwise config' to inspect the effective configuration")
            },
            _ => None,
        }
    }
}
