//! Snapshot types describing a project and its installed dependency tree.
//!
//! These are the facts collaborators hand to the analyzer: the root manifest,
//! workspace members, the installed tree, the flattened override map and the
//! runtime version. Wire names follow package.json conventions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{DependencyKind, VersionRequirement};

/// Package manager that produced the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    /// Lock artifact written by this package manager
    pub fn lock_file(&self) -> &'static str {
        match self {
            PackageManager::Npm => "package-lock.json",
            PackageManager::Pnpm => "pnpm-lock.yaml",
            PackageManager::Yarn => "yarn.lock",
        }
    }

    /// Manifest field holding forced versions
    pub fn override_field(&self) -> &'static str {
        match self {
            PackageManager::Npm => "overrides",
            PackageManager::Pnpm => "pnpm.overrides",
            PackageManager::Yarn => "resolutions",
        }
    }

    /// Parse a `packageManager` field value such as `pnpm@8.15.1`
    pub fn from_spec(spec: &str) -> Option<Self> {
        let name = spec.split('@').next().unwrap_or(spec).trim();
        match name {
            "npm" => Some(PackageManager::Npm),
            "pnpm" => Some(PackageManager::Pnpm),
            "yarn" => Some(PackageManager::Yarn),
            _ => None,
        }
    }
}

/// `peerDependenciesMeta` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMeta {
    #[serde(default)]
    pub optional: bool,
}

/// Dependency sections of a manifest (root project or workspace member)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies_meta: IndexMap<String, PeerMeta>,
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub engines: IndexMap<String, String>,
}

impl ProjectManifest {
    /// Name used when reporting this manifest as a consumer
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<root>")
    }

    /// All declared requirements in section order
    pub fn requirements(&self) -> Vec<VersionRequirement> {
        let sections = [
            (&self.dependencies, DependencyKind::Prod),
            (&self.dev_dependencies, DependencyKind::Dev),
            (&self.optional_dependencies, DependencyKind::Optional),
        ];

        let mut requirements: Vec<VersionRequirement> = sections
            .iter()
            .flat_map(|(section, kind)| {
                section
                    .iter()
                    .map(move |(name, range)| VersionRequirement::with_kind(name, range, *kind))
            })
            .collect();

        requirements.extend(peer_requirements(
            &self.peer_dependencies,
            &self.peer_dependencies_meta,
        ));
        requirements
    }

    /// Check if any section declares the package
    pub fn declares(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
            || self.dev_dependencies.contains_key(name)
            || self.peer_dependencies.contains_key(name)
            || self.optional_dependencies.contains_key(name)
    }
}

fn peer_requirements(
    peers: &IndexMap<String, String>,
    meta: &IndexMap<String, PeerMeta>,
) -> Vec<VersionRequirement> {
    peers
        .iter()
        .map(|(name, range)| {
            let optional = meta.get(name).map(|m| m.optional).unwrap_or(false);
            VersionRequirement::peer(name, range, optional)
        })
        .collect()
}

/// Node of the installed-tree snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledNode {
    pub name: String,
    pub version: String,
    /// Position in the installed tree (e.g. `node_modules/a/node_modules/b`)
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies_meta: IndexMap<String, PeerMeta>,
    #[serde(default)]
    pub children: Vec<InstalledNode>,
}

impl InstalledNode {
    /// Create a leaf node
    pub fn new(name: impl Into<String>, version: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            location: location.into(),
            dependencies: IndexMap::new(),
            optional_dependencies: IndexMap::new(),
            peer_dependencies: IndexMap::new(),
            peer_dependencies_meta: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Add a nested child
    pub fn with_child(mut self, child: InstalledNode) -> Self {
        self.children.push(child);
        self
    }

    /// Declare a production dependency
    pub fn with_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), range.into());
        self
    }

    /// Declare a peer dependency
    pub fn with_peer(mut self, name: impl Into<String>, range: impl Into<String>, optional: bool) -> Self {
        let name = name.into();
        if optional {
            self.peer_dependencies_meta
                .insert(name.clone(), PeerMeta { optional: true });
        }
        self.peer_dependencies.insert(name, range.into());
        self
    }

    /// `name@version`
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Requirements this installed package declares
    pub fn requirements(&self) -> Vec<VersionRequirement> {
        let mut requirements: Vec<VersionRequirement> = self
            .dependencies
            .iter()
            .map(|(name, range)| VersionRequirement::new(name, range))
            .collect();
        requirements.extend(self.optional_dependencies.iter().map(|(name, range)| {
            VersionRequirement::with_kind(name, range, DependencyKind::Optional)
        }));
        requirements.extend(peer_requirements(
            &self.peer_dependencies,
            &self.peer_dependencies_meta,
        ));
        requirements
    }
}

/// Workspace member of a monorepo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub relative_path: String,
    /// `None` when the member's manifest could not be read or parsed
    #[serde(default)]
    pub manifest: Option<ProjectManifest>,
}

/// Flattened override directives (`a>b` path -> forced version)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideMap(IndexMap<String, String>);

/// Single forced version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDirective {
    /// Full `>`-joined ancestor path as declared
    pub path: String,
    /// Package the directive forces (last path segment, selector stripped)
    pub package: String,
    pub forced_version: String,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a directive
    pub fn insert(&mut self, path: impl Into<String>, forced_version: impl Into<String>) {
        self.0.insert(path.into(), forced_version.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Directives in declaration order
    pub fn directives(&self) -> Vec<OverrideDirective> {
        self.0
            .iter()
            .map(|(path, forced)| OverrideDirective {
                path: path.clone(),
                package: overridden_package(path).to_string(),
                forced_version: forced.clone(),
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for OverrideMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        OverrideMap(iter.into_iter().collect())
    }
}

/// Package named by the last segment of an override path (`a@1>@s/b@^2` -> `@s/b`)
pub fn overridden_package(path: &str) -> &str {
    let segment = path.rsplit('>').next().unwrap_or(path).trim();
    strip_selector(segment)
}

/// Drop a trailing `@range` selector, keeping scoped names intact
pub fn strip_selector(segment: &str) -> &str {
    match segment.get(1..).and_then(|rest| rest.find('@')) {
        Some(idx) => &segment[..idx + 1],
        None => segment,
    }
}

fn default_runtime() -> String {
    "node".to_string()
}

/// Runtime engine facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFacts {
    #[serde(default = "default_runtime")]
    pub name: String,
    pub current_version: String,
    /// Explicit engine range; falls back to the root manifest's `engines`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_range: Option<String>,
}

impl RuntimeFacts {
    pub fn node(current_version: impl Into<String>) -> Self {
        Self {
            name: default_runtime(),
            current_version: current_version.into(),
            declared_range: None,
        }
    }
}

/// Everything one analysis request knows about a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub package_manager: PackageManager,
    #[serde(default)]
    pub root: ProjectManifest,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceMember>,
    /// Top-level nodes of the installed tree
    #[serde(default)]
    pub installed: Vec<InstalledNode>,
    #[serde(default)]
    pub overrides: OverrideMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeFacts>,
}

impl ProjectSnapshot {
    /// Engine range that applies to the current runtime
    pub fn engine_range(&self) -> Option<&str> {
        let runtime = self.runtime.as_ref()?;
        runtime
            .declared_range
            .as_deref()
            .or_else(|| self.root.engines.get(&runtime.name).map(String::as_str))
    }

    /// Whether the root or any workspace member declares the package
    pub fn is_direct(&self, name: &str) -> bool {
        self.root.declares(name)
            || self
                .workspaces
                .iter()
                .filter_map(|member| member.manifest.as_ref())
                .any(|manifest| manifest.declares(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_manager_artifacts() {
        assert_eq!(PackageManager::Pnpm.lock_file(), "pnpm-lock.yaml");
        assert_eq!(PackageManager::Yarn.override_field(), "resolutions");
        assert_eq!(PackageManager::from_spec("pnpm@8.15.1"), Some(PackageManager::Pnpm));
        assert_eq!(PackageManager::from_spec("bun@1.0.0"), None);
    }

    #[test]
    fn test_manifest_requirements_order() {
        let mut manifest = ProjectManifest::default();
        manifest.dependencies.insert("react".to_string(), "^18.0.0".to_string());
        manifest.dev_dependencies.insert("jest".to_string(), "^29.0.0".to_string());
        manifest.peer_dependencies.insert("react-dom".to_string(), "^18.0.0".to_string());
        manifest
            .peer_dependencies_meta
            .insert("react-dom".to_string(), PeerMeta { optional: true });

        let reqs = manifest.requirements();
        let names: Vec<&str> = reqs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["react", "jest", "react-dom"]);
        assert!(reqs[2].optional);
        assert!(manifest.declares("jest"));
        assert!(!manifest.declares("lodash"));
    }

    #[test]
    fn test_overridden_package() {
        assert_eq!(overridden_package("lodash"), "lodash");
        assert_eq!(overridden_package("foo>bar"), "bar");
        assert_eq!(overridden_package("foo@1>@types/node@^18"), "@types/node");
        assert_eq!(overridden_package("@scope/pkg"), "@scope/pkg");
    }

    #[test]
    fn test_override_directives() {
        let overrides: OverrideMap = vec![
            ("a>b".to_string(), "1.0.0".to_string()),
            ("c".to_string(), "2.0.0".to_string()),
        ]
        .into_iter()
        .collect();

        let directives = overrides.directives();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].package, "b");
        assert_eq!(directives[0].path, "a>b");
        assert_eq!(directives[1].forced_version, "2.0.0");
    }

    #[test]
    fn test_snapshot_deserialization() {
        let json = serde_json::json!({
            "packageManager": "pnpm",
            "root": {
                "name": "app",
                "dependencies": { "react": "^18.2.0" },
                "engines": { "node": ">=18" }
            },
            "installed": [
                {
                    "name": "react",
                    "version": "18.2.0",
                    "location": "node_modules/react",
                    "children": [
                        { "name": "loose-envify", "version": "1.4.0" }
                    ]
                }
            ],
            "overrides": { "a>b": "1.0.0" },
            "runtime": { "currentVersion": "v16.20.0" }
        });

        let snapshot: ProjectSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.package_manager, PackageManager::Pnpm);
        assert_eq!(snapshot.installed[0].children[0].location, "");
        assert_eq!(snapshot.overrides.get("a>b"), Some("1.0.0"));
        assert_eq!(snapshot.engine_range(), Some(">=18"));
        assert!(snapshot.is_direct("react"));
        assert!(!snapshot.is_direct("loose-envify"));
    }

    #[test]
    fn test_installed_node_builders() {
        let node = InstalledNode::new("react-dom", "18.2.0", "node_modules/react-dom")
            .with_dependency("scheduler", "^0.23.0")
            .with_peer("react", "^18.2.0", false);

        assert_eq!(node.id(), "react-dom@18.2.0");
        let reqs = node.requirements();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1].kind, DependencyKind::Peer);
    }
}
