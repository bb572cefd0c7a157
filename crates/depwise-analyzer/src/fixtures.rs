//! Snapshot and registry builders shared by unit tests

use depwise_core::types::{InstalledNode, ProjectManifest, ProjectSnapshot, WorkspaceMember};
use depwise_registry::{PackageMetadataResponse, RegistryIndex};

pub fn manifest(name: &str, dependencies: &[(&str, &str)]) -> ProjectManifest {
    let mut manifest = ProjectManifest {
        name: Some(name.to_string()),
        ..ProjectManifest::default()
    };
    for (dep, range) in dependencies {
        manifest.dependencies.insert(dep.to_string(), range.to_string());
    }
    manifest
}

pub fn member(name: &str, relative_path: &str, dependencies: &[(&str, &str)]) -> WorkspaceMember {
    WorkspaceMember {
        name: name.to_string(),
        version: Some("1.0.0".to_string()),
        relative_path: relative_path.to_string(),
        manifest: Some(manifest(name, dependencies)),
    }
}

pub fn snapshot(root: ProjectManifest, installed: Vec<InstalledNode>) -> ProjectSnapshot {
    ProjectSnapshot {
        root,
        installed,
        ..ProjectSnapshot::default()
    }
}

/// Registry document publishing `versions` with `latest` as the dist-tag
pub fn metadata(name: &str, latest: &str, versions: &[&str]) -> PackageMetadataResponse {
    let mut published = serde_json::Map::new();
    for version in versions {
        published.insert(version.to_string(), serde_json::json!({ "version": version }));
    }
    serde_json::from_value(serde_json::json!({
        "name": name,
        "dist-tags": { "latest": latest },
        "versions": published
    }))
    .unwrap()
}

pub fn registry(documents: Vec<PackageMetadataResponse>) -> RegistryIndex {
    documents.into_iter().collect()
}

/// `app` depends on `a` and `b`, which pull `lodash` at two versions
pub fn duplicated_lodash() -> ProjectSnapshot {
    snapshot(
        manifest("app", &[("a", "^1.0.0"), ("b", "^2.0.0")]),
        vec![
            InstalledNode::new("a", "1.0.0", "node_modules/a")
                .with_dependency("lodash", "^3.0.0")
                .with_child(InstalledNode::new(
                    "lodash",
                    "3.10.1",
                    "node_modules/a/node_modules/lodash",
                )),
            InstalledNode::new("b", "2.0.0", "node_modules/b").with_dependency("lodash", "^4.0.0"),
            InstalledNode::new("lodash", "4.17.20", "node_modules/lodash"),
        ],
    )
}

/// Like [`duplicated_lodash`], but both copies share major 4
pub fn duplicated_lodash_minor() -> ProjectSnapshot {
    snapshot(
        manifest("app", &[("a", "^1.0.0"), ("b", "^2.0.0")]),
        vec![
            InstalledNode::new("a", "1.0.0", "node_modules/a")
                .with_dependency("lodash", "^4.16.0")
                .with_child(InstalledNode::new(
                    "lodash",
                    "4.16.6",
                    "node_modules/a/node_modules/lodash",
                )),
            InstalledNode::new("b", "2.0.0", "node_modules/b").with_dependency("lodash", "^4.0.0"),
            InstalledNode::new("lodash", "4.17.20", "node_modules/lodash"),
        ],
    )
}
