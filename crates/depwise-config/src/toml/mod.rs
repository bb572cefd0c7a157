//! depwise.toml parsing and validation

use std::collections::BTreeMap;
use std::time::Duration;

use camino::Utf8Path;
use depwise_core::error::DepwiseError;
use depwise_core::types::{Strategy, Version};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigResult;

/// Public npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Default metadata cache lifetime in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default number of registry lookups in flight
pub const DEFAULT_CONCURRENCY: usize = 8;

/// One configuration layer as written in a depwise.toml file
///
/// Every field is optional so that a layer only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepwiseToml {
    /// Advisor behaviour
    #[serde(default)]
    pub advisor: AdvisorSection,

    /// Registry access
    #[serde(default)]
    pub registry: RegistrySection,
}

/// `[advisor]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisorSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    /// Permit major-version upgrades outside the aggressive strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_major: Option<bool>,

    /// Explicit upgrade targets, package name to version
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

/// `[registry]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Skip registry lookups entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Effective configuration after layering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settings {
    pub advisor: AdvisorSettings,
    pub registry: RegistrySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdvisorSettings {
    pub strategy: Strategy,
    pub allow_major: bool,
    pub targets: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrySettings {
    pub url: String,
    pub cache_ttl_secs: u64,
    pub concurrency: usize,
    pub offline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            offline: false,
            token: None,
        }
    }
}

impl Settings {
    /// Overlay a file layer; fields the layer leaves out keep their value
    pub fn apply(&mut self, layer: &DepwiseToml) {
        let advisor = &layer.advisor;
        if let Some(strategy) = advisor.strategy {
            self.advisor.strategy = strategy;
        }
        if let Some(allow_major) = advisor.allow_major {
            self.advisor.allow_major = allow_major;
        }
        for (name, version) in &advisor.targets {
            self.advisor.targets.insert(name.clone(), version.clone());
        }

        let registry = &layer.registry;
        if let Some(url) = &registry.url {
            self.registry.url = url.clone();
        }
        if let Some(ttl) = registry.cache_ttl_secs {
            self.registry.cache_ttl_secs = ttl;
        }
        if let Some(concurrency) = registry.concurrency {
            self.registry.concurrency = concurrency;
        }
        if let Some(offline) = registry.offline {
            self.registry.offline = offline;
        }
        if let Some(token) = &registry.token {
            self.registry.token = Some(token.clone());
        }
    }

    /// Check the merged values
    pub fn validate(&self) -> ConfigResult<()> {
        validate_registry_url(&self.registry.url, "registry.url")?;

        if self.registry.concurrency == 0 {
            return Err(DepwiseError::ConfigValidation {
                field: "registry.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        for (name, version) in &self.advisor.targets {
            validate_target(name, version)?;
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.registry.cache_ttl_secs)
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Settings {
        let mut settings = self.clone();
        if settings.registry.token.is_some() {
            settings.registry.token = Some("<redacted>".to_string());
        }
        settings
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        ::toml::to_string_pretty(self).map_err(|e| DepwiseError::ConfigValidation {
            field: "settings".to_string(),
            reason: format!("TOML serialization error: {}", e),
        })
    }
}

/// Parse a depwise.toml document
pub fn parse_depwise_toml(content: &str, file: &str) -> ConfigResult<DepwiseToml> {
    let config: DepwiseToml = ::toml::from_str(content).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        DepwiseError::TomlParse {
            file: file.to_string(),
            message: e.message().to_string(),
            line,
            column,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate the fields a single layer sets
pub fn validate_config(config: &DepwiseToml) -> ConfigResult<()> {
    if let Some(url) = &config.registry.url {
        validate_registry_url(url, "registry.url")?;
    }

    if config.registry.concurrency == Some(0) {
        return Err(DepwiseError::ConfigValidation {
            field: "registry.concurrency".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    for (name, version) in &config.advisor.targets {
        validate_target(name, version)?;
    }

    Ok(())
}

/// Load and parse depwise.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<DepwiseToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DepwiseError::io(format!("Failed to read {}", path), e))?;

    parse_depwise_toml(&content, path.as_str())
}

/// Check a registry URL; `field` names where it came from
pub fn validate_registry_url(url: &str, field: &str) -> ConfigResult<()> {
    let parsed = Url::parse(url).map_err(|e| DepwiseError::ConfigValidation {
        field: field.to_string(),
        reason: format!("'{}' is not a valid URL: {}", url, e),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DepwiseError::ConfigValidation {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(())
}

fn validate_target(name: &str, version: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(DepwiseError::ConfigValidation {
            field: "advisor.targets".to_string(),
            reason: "package name must not be empty".to_string(),
        });
    }

    version
        .parse::<Version>()
        .map(|_| ())
        .map_err(|e| DepwiseError::ConfigValidation {
            field: format!("advisor.targets.{}", name),
            reason: format!("'{}' is not a version: {}", version, e),
        })
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|newline| before.len() - newline)
        .unwrap_or(before.len() + 1);
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_depwise_toml("", "depwise.toml").unwrap();
        assert_eq!(config, DepwiseToml::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[advisor]
strategy = "aggressive"
allow_major = true

[advisor.targets]
react = "18.2.0"

[registry]
url = "https://npm.example.com/"
cache_ttl_secs = 60
concurrency = 4
offline = false
"#;

        let config = parse_depwise_toml(toml, "depwise.toml").unwrap();
        assert_eq!(config.advisor.strategy, Some(Strategy::Aggressive));
        assert_eq!(config.advisor.allow_major, Some(true));
        assert_eq!(config.advisor.targets.get("react").unwrap(), "18.2.0");
        assert_eq!(config.registry.concurrency, Some(4));
        assert_eq!(config.registry.token, None);
    }

    #[test]
    fn test_syntax_error_has_location() {
        let toml = "[advisor]\nstrategy = \n";

        match parse_depwise_toml(toml, "depwise.toml").unwrap_err() {
            DepwiseError::TomlParse { file, line, .. } => {
                assert_eq!(file, "depwise.toml");
                assert_eq!(line, 2);
            }
            other => panic!("Expected TomlParse, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let toml = "[advisor]\nstrategy = \"reckless\"\n";
        assert!(matches!(
            parse_depwise_toml(toml, "depwise.toml"),
            Err(DepwiseError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_invalid_registry_url() {
        let toml = "[registry]\nurl = \"registry.npmjs.org\"\n";
        match parse_depwise_toml(toml, "depwise.toml").unwrap_err() {
            DepwiseError::ConfigValidation { field, .. } => assert_eq!(field, "registry.url"),
            other => panic!("Expected ConfigValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let toml = "[registry]\nconcurrency = 0\n";
        assert!(parse_depwise_toml(toml, "depwise.toml").is_err());
    }

    #[test]
    fn test_invalid_target_version() {
        let toml = "[advisor.targets]\nreact = \"latest\"\n";
        match parse_depwise_toml(toml, "depwise.toml").unwrap_err() {
            DepwiseError::ConfigValidation { field, .. } => {
                assert_eq!(field, "advisor.targets.react")
            }
            other => panic!("Expected ConfigValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.advisor.strategy, Strategy::Balanced);
        assert!(!settings.advisor.allow_major);
        assert_eq!(settings.registry.url, DEFAULT_REGISTRY_URL);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(300));
        assert_eq!(settings.registry.concurrency, 8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_apply_only_overrides_named_fields() {
        let mut settings = Settings::default();
        let layer = parse_depwise_toml("[registry]\noffline = true\n", "depwise.toml").unwrap();

        settings.apply(&layer);

        assert!(settings.registry.offline);
        assert_eq!(settings.registry.url, DEFAULT_REGISTRY_URL);
        assert_eq!(settings.advisor.strategy, Strategy::Balanced);
    }

    #[test]
    fn test_redacted_output() {
        let mut settings = Settings::default();
        settings.registry.token = Some("s3cret".to_string());

        let rendered = settings.redacted().to_toml_string().unwrap();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("strategy = \"balanced\""));
    }

    #[test]
    fn test_line_column() {
        let content = "a = 1\nbb = \n";
        assert_eq!(line_column(content, 0), (1, 1));
        assert_eq!(line_column(content, 6), (2, 1));
        assert_eq!(line_column(content, 9), (2, 4));
    }
}
