//! npm registry API response types

use std::collections::HashMap;

use depwise_core::types::{PeerMeta, Version};
use serde::{Deserialize, Serialize};

/// Package metadata response from npm registry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackageMetadataResponse {
    /// Package name
    pub name: String,
    /// Package description (absent from abbreviated documents)
    #[serde(default)]
    pub description: Option<String>,
    /// Tag name to version (`latest`, `next`, ...)
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    /// All versions metadata
    #[serde(default)]
    pub versions: HashMap<String, VersionMetadata>,
    /// Publish times
    #[serde(default)]
    pub time: HashMap<String, String>,
}

/// Metadata for a specific package version
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    /// Version string
    pub version: String,
    /// Dependencies
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    /// Peer dependencies
    #[serde(default)]
    pub peer_dependencies: HashMap<String, String>,
    /// Peer dependency flags
    #[serde(default)]
    pub peer_dependencies_meta: HashMap<String, PeerMeta>,
    /// Engine ranges; old packages publish an array here
    #[serde(default)]
    pub engines: Option<serde_json::Value>,
    /// Deprecation notice; a string, or `false` on some mirrors
    #[serde(default)]
    pub deprecated: Option<serde_json::Value>,
}

impl PackageMetadataResponse {
    /// Version the `latest` tag points at
    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get("latest").map(String::as_str)
    }

    /// Published versions that parse, in ascending precedence
    pub fn sorted_versions(&self) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .versions
            .keys()
            .filter_map(|v| v.parse().ok())
            .collect();
        versions.sort();
        versions
    }

    /// Deprecation message of one version, if it has a non-empty one
    pub fn deprecation(&self, version: &str) -> Option<&str> {
        self.versions.get(version)?.deprecation_message()
    }
}

impl VersionMetadata {
    /// Non-empty deprecation message
    pub fn deprecation_message(&self) -> Option<&str> {
        match &self.deprecated {
            Some(serde_json::Value::String(message)) if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Engine range for a runtime (`node`)
    pub fn engine(&self, runtime: &str) -> Option<&str> {
        self.engines.as_ref()?.get(runtime)?.as_str()
    }
}

/// Registry facts gathered for one analysis request
///
/// Absence of a package means its metadata is unknown.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    packages: HashMap<String, PackageMetadataResponse>,
    misses: Vec<String>,
}

impl RegistryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add metadata for a package
    pub fn insert(&mut self, metadata: PackageMetadataResponse) {
        self.packages.insert(metadata.name.clone(), metadata);
    }

    /// Record a package whose metadata could not be fetched
    pub fn record_miss(&mut self, name: impl Into<String>) {
        self.misses.push(name.into());
    }

    pub fn get(&self, name: &str) -> Option<&PackageMetadataResponse> {
        self.packages.get(name)
    }

    /// `latest` dist-tag of a package
    pub fn latest(&self, name: &str) -> Option<&str> {
        self.get(name)?.latest()
    }

    /// Published versions of a package in ascending order (empty when unknown)
    pub fn versions(&self, name: &str) -> Vec<Version> {
        self.get(name)
            .map(PackageMetadataResponse::sorted_versions)
            .unwrap_or_default()
    }

    /// Deprecation message of `name@version`
    pub fn deprecation(&self, name: &str, version: &str) -> Option<&str> {
        self.get(name)?.deprecation(version)
    }

    /// Packages whose lookup failed
    pub fn misses(&self) -> &[String] {
        &self.misses
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl FromIterator<PackageMetadataResponse> for RegistryIndex {
    fn from_iter<T: IntoIterator<Item = PackageMetadataResponse>>(iter: T) -> Self {
        let mut index = RegistryIndex::new();
        for metadata in iter {
            index.insert(metadata);
        }
        index
    }
}
