//! package.json parsing and override normalization
//!
//! The three override shapes are flattened here, at the boundary, into one
//! `>`-joined `OverrideMap`:
//!
//! - npm `overrides`: nested objects; the `"."` key forces the parent itself
//!   and `$name` values refer to the root's own requirement on `name`
//! - pnpm `pnpm.overrides`: keys are already `>`-joined
//! - yarn `resolutions`: `/`-joined paths with `**` globs and scoped names

use camino::Utf8Path;
use depwise_core::error::DepwiseError;
use depwise_core::types::{OverrideMap, PackageManager, PeerMeta, ProjectManifest};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ConfigResult;

/// The parts of a package.json the advisor reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Development dependencies
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,

    /// Peer dependencies
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,

    #[serde(default)]
    pub peer_dependencies_meta: IndexMap<String, PeerMeta>,

    /// Optional dependencies
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, String>,

    /// Engine requirements
    #[serde(default)]
    pub engines: IndexMap<String, String>,

    /// Workspace configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<WorkspacesConfig>,

    /// `name@version` of the package manager (corepack)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    /// npm overrides (nested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<serde_json::Value>,

    /// pnpm settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnpm: Option<PnpmSection>,

    /// yarn resolutions
    #[serde(default)]
    pub resolutions: IndexMap<String, String>,
}

/// Workspace configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesConfig {
    /// Simple array of workspace paths
    Simple(Vec<String>),
    /// Detailed workspace configuration
    Detailed {
        packages: Vec<String>,
        #[serde(default)]
        nohoist: Vec<String>,
    },
}

/// `pnpm` section of package.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnpmSection {
    #[serde(default)]
    pub overrides: IndexMap<String, String>,
}

impl PackageJson {
    /// Dependency sections as a manifest
    pub fn to_manifest(&self) -> ProjectManifest {
        ProjectManifest {
            name: self.name.clone(),
            version: self.version.clone(),
            dependencies: self.dependencies.clone(),
            dev_dependencies: self.dev_dependencies.clone(),
            peer_dependencies: self.peer_dependencies.clone(),
            peer_dependencies_meta: self.peer_dependencies_meta.clone(),
            optional_dependencies: self.optional_dependencies.clone(),
            engines: self.engines.clone(),
        }
    }

    /// Package manager named by the `packageManager` field
    pub fn package_manager(&self) -> Option<PackageManager> {
        self.package_manager
            .as_deref()
            .and_then(PackageManager::from_spec)
    }

    /// Workspace member globs
    pub fn workspace_patterns(&self) -> &[String] {
        match &self.workspaces {
            Some(WorkspacesConfig::Simple(packages)) => packages.as_slice(),
            Some(WorkspacesConfig::Detailed { packages, .. }) => packages.as_slice(),
            None => &[],
        }
    }

    /// Every override field flattened into one map
    ///
    /// Fields are read in the order npm, pnpm, yarn; a later field wins when
    /// two name the same path.
    pub fn normalize_overrides(&self) -> OverrideMap {
        let mut overrides = OverrideMap::new();

        if let Some(npm) = &self.overrides {
            normalize_npm_overrides(npm, &self.root_requirement_lookup(), &mut overrides);
        }

        if let Some(pnpm) = &self.pnpm {
            for (path, forced) in &pnpm.overrides {
                let path = path.split('>').map(str::trim).collect::<Vec<_>>().join(">");
                overrides.insert(path, forced.trim());
            }
        }

        for (path, forced) in normalize_yarn_resolutions(&self.resolutions) {
            overrides.insert(path, forced);
        }

        overrides
    }

    /// Root ranges by name; `dependencies` wins over the other sections
    fn root_requirement_lookup(&self) -> IndexMap<String, String> {
        self.peer_dependencies
            .iter()
            .chain(self.optional_dependencies.iter())
            .chain(self.dev_dependencies.iter())
            .chain(self.dependencies.iter())
            .map(|(name, range)| (name.clone(), range.clone()))
            .collect()
    }
}

/// Flatten npm's nested `overrides` object
///
/// `root_ranges` resolves `$name` references against the root manifest.
pub fn normalize_npm_overrides(
    value: &serde_json::Value,
    root_ranges: &IndexMap<String, String>,
    out: &mut OverrideMap,
) {
    match value {
        serde_json::Value::Object(entries) => {
            for (key, nested) in entries {
                flatten_npm_entry(key, nested, root_ranges, out);
            }
        }
        other => warn!("Ignoring non-object npm overrides field: {}", other),
    }
}

fn flatten_npm_entry(
    path: &str,
    value: &serde_json::Value,
    root_ranges: &IndexMap<String, String>,
    out: &mut OverrideMap,
) {
    match value {
        serde_json::Value::String(forced) => {
            out.insert(path, resolve_reference(forced, root_ranges));
        }
        serde_json::Value::Object(entries) => {
            for (key, nested) in entries {
                if key == "." {
                    if let serde_json::Value::String(forced) = nested {
                        out.insert(path, resolve_reference(forced, root_ranges));
                    }
                } else {
                    flatten_npm_entry(&format!("{}>{}", path, key), nested, root_ranges, out);
                }
            }
        }
        other => warn!(path, "Ignoring override with unsupported value: {}", other),
    }
}

/// `$react` means "whatever the root requires for react"
fn resolve_reference(forced: &str, root_ranges: &IndexMap<String, String>) -> String {
    match forced.strip_prefix('$') {
        Some(name) => root_ranges
            .get(name)
            .cloned()
            .unwrap_or_else(|| forced.to_string()),
        None => forced.to_string(),
    }
}

/// Flatten yarn `resolutions` keys into `>`-joined paths
///
/// `a/b` becomes `a>b`, glob segments (`**`, `*`) are dropped and scoped names
/// (`@scope/name`) stay together.
pub fn normalize_yarn_resolutions(resolutions: &IndexMap<String, String>) -> Vec<(String, String)> {
    resolutions
        .iter()
        .filter_map(|(key, forced)| {
            let segments = yarn_path_segments(key);
            if segments.is_empty() {
                warn!(key = %key, "Ignoring resolution without a package name");
                return None;
            }
            Some((segments.join(">"), forced.trim().to_string()))
        })
        .collect()
}

fn yarn_path_segments(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut parts = key.trim().split('/').filter(|part| !part.is_empty());

    while let Some(part) = parts.next() {
        if part == "**" || part == "*" {
            continue;
        }
        if part.starts_with('@') {
            match parts.next() {
                Some(name) => segments.push(format!("{}/{}", part, name)),
                None => segments.push(part.to_string()),
            }
        } else {
            segments.push(part.to_string());
        }
    }

    segments
}

/// Parse JSON string to PackageJson
pub fn parse_package_json(content: &str, file: &str) -> ConfigResult<PackageJson> {
    serde_json::from_str(content).map_err(|e| DepwiseError::JsonParse {
        file: file.to_string(),
        message: e.to_string(),
    })
}

/// Load and parse package.json from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<PackageJson> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DepwiseError::io(format!("Failed to read {}", path), e))?;

    parse_package_json(&content, path.as_str())
}
