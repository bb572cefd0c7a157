//! Unit tests for the graph normalizer

use super::*;
use depwise_core::types::{ProjectManifest, WorkspaceMember};
use depwise_registry::PackageMetadataResponse;

fn snapshot(installed: Vec<InstalledNode>) -> ProjectSnapshot {
    let mut root = ProjectManifest {
        name: Some("app".to_string()),
        ..ProjectManifest::default()
    };
    root.dependencies.insert("a".to_string(), "^1.0.0".to_string());
    root.dependencies.insert("lodash".to_string(), "^4.17.0".to_string());

    ProjectSnapshot {
        root,
        installed,
        ..ProjectSnapshot::default()
    }
}

fn tree() -> Vec<InstalledNode> {
    vec![
        InstalledNode::new("a", "1.0.0", "node_modules/a")
            .with_dependency("lodash", "^3.0.0")
            .with_dependency("b", "^2.0.0")
            .with_child(InstalledNode::new("lodash", "3.10.1", "node_modules/a/node_modules/lodash")),
        InstalledNode::new("b", "2.1.0", "node_modules/b").with_dependency("lodash", "^4.0.0"),
        InstalledNode::new("lodash", "4.17.21", "node_modules/lodash"),
    ]
}

#[test]
fn test_flat_records_keep_discovery_order() {
    let graph = RequirementGraph::build(&snapshot(tree()), &RegistryIndex::new());

    let names: Vec<&str> = graph.flat().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["a", "lodash", "b"]);

    let lodash = graph.record("lodash").unwrap();
    assert_eq!(lodash.multiplicity(), 2);
    assert_eq!(lodash.version_strings(), vec!["3.10.1", "4.17.21"]);
    assert_eq!(lodash.highest(), Some("4.17.21"));
    assert_eq!(lodash.versions["3.10.1"].depth, 2);
    assert_eq!(lodash.versions["4.17.21"].depth, 1);
    assert_eq!(graph.package_count(), 4);
}

#[test]
fn test_nested_copy_shadows_top_level() {
    let graph = RequirementGraph::build(&snapshot(tree()), &RegistryIndex::new());

    let edges = graph.requirements_on("lodash");
    assert_eq!(edges.len(), 3);

    let from_a = edges.iter().find(|e| e.consumer == "a@1.0.0").unwrap();
    assert_eq!(from_a.resolved.as_ref().unwrap().version, "3.10.1");

    let from_b = edges.iter().find(|e| e.consumer == "b@2.1.0").unwrap();
    assert_eq!(from_b.resolved.as_ref().unwrap().version, "4.17.21");

    let from_root = edges.iter().find(|e| e.from_root).unwrap();
    assert_eq!(from_root.consumer, "app");
    assert_eq!(from_root.resolved.as_ref().unwrap().location, "node_modules/lodash");
}

#[test]
fn test_dependency_resolves_through_ancestors() {
    let installed = vec![InstalledNode::new("a", "1.0.0", "node_modules/a")
        .with_child(
            InstalledNode::new("c", "1.0.0", "node_modules/a/node_modules/c")
                .with_dependency("d", "^1.0.0"),
        )
        .with_child(InstalledNode::new("d", "1.5.0", "node_modules/a/node_modules/d"))];

    let graph = RequirementGraph::build(&snapshot(installed), &RegistryIndex::new());

    let edges = graph.requirements_on("d");
    assert_eq!(edges.len(), 1);
    assert_eq!(
        edges[0].resolved.as_ref().unwrap().location,
        "node_modules/a/node_modules/d"
    );
}

#[test]
fn test_requested_by_tracks_consumers() {
    let graph = RequirementGraph::build(&snapshot(tree()), &RegistryIndex::new());

    let lodash = graph.record("lodash").unwrap();
    assert_eq!(lodash.versions["3.10.1"].requested_by, vec!["a@1.0.0"]);
    assert_eq!(lodash.versions["4.17.21"].requested_by, vec!["app", "b@2.1.0"]);
    assert_eq!(graph.consumers_of("lodash"), vec!["app", "a@1.0.0", "b@2.1.0"]);
}

#[test]
fn test_missing_requirements_have_no_resolution() {
    let installed = vec![InstalledNode::new("a", "1.0.0", "node_modules/a").with_dependency("ghost", "^1.0.0")];
    let graph = RequirementGraph::build(&snapshot(installed), &RegistryIndex::new());

    let ghost = graph.requirements_on("ghost");
    assert_eq!(ghost.len(), 1);
    assert!(ghost[0].resolved.is_none());
    assert!(!graph.is_installed("ghost"));

    // Root requirement on lodash also resolves to nothing here
    assert!(graph.requirements_on("lodash")[0].resolved.is_none());
}

#[test]
fn test_locations_are_derived_when_absent() {
    let installed = vec![InstalledNode::new("a", "1.0.0", "").with_child(InstalledNode::new("b", "2.0.0", ""))];
    let graph = RequirementGraph::build(&snapshot(installed), &RegistryIndex::new());

    assert_eq!(graph.record("a").unwrap().locations(), vec!["node_modules/a"]);
    assert_eq!(
        graph.record("b").unwrap().locations(),
        vec!["node_modules/a/node_modules/b"]
    );
}

#[test]
fn test_inconsistent_nodes_are_skipped() {
    let installed = vec![
        InstalledNode::new("", "1.0.0", "node_modules/broken")
            .with_child(InstalledNode::new("hidden", "1.0.0", "")),
        InstalledNode::new("ok", "1.0.0", "node_modules/ok"),
    ];
    let mut snap = snapshot(installed);
    snap.workspaces.push(WorkspaceMember {
        name: "web".to_string(),
        version: None,
        relative_path: "packages/web".to_string(),
        manifest: None,
    });

    let graph = RequirementGraph::build(&snap, &RegistryIndex::new());

    assert!(graph.is_installed("ok"));
    assert!(!graph.is_installed("hidden"));
    assert!(graph.workspace().is_empty());
    assert_eq!(graph.skipped().len(), 2);
}

#[test]
fn test_workspace_view() {
    let mut manifest = ProjectManifest::default();
    manifest.dev_dependencies.insert("lodash".to_string(), "^4.0.0".to_string());
    manifest.peer_dependencies.insert("react".to_string(), "^18.0.0".to_string());

    let mut snap = snapshot(Vec::new());
    snap.workspaces.push(WorkspaceMember {
        name: "web".to_string(),
        version: Some("1.0.0".to_string()),
        relative_path: "packages/web".to_string(),
        manifest: Some(manifest),
    });

    let graph = RequirementGraph::build(&snap, &RegistryIndex::new());
    let member = &graph.workspace()[0];
    assert_eq!(member.relative_path, "packages/web");
    assert_eq!(member.requirement_on("lodash").unwrap().range, "^4.0.0");
    assert!(member.requirement_on("react").is_none());
}

#[test]
fn test_registry_peers_fill_undeclared_peers() {
    let metadata: PackageMetadataResponse = serde_json::from_value(serde_json::json!({
        "name": "react-dom",
        "versions": {
            "18.2.0": {
                "version": "18.2.0",
                "peerDependencies": { "react": "^18.2.0", "scheduler": "*" },
                "peerDependenciesMeta": { "scheduler": { "optional": true } }
            }
        }
    }))
    .unwrap();
    let registry: RegistryIndex = vec![metadata].into_iter().collect();

    let installed = vec![InstalledNode::new("react-dom", "18.2.0", "node_modules/react-dom")];
    let graph = RequirementGraph::build(&snapshot(installed), &registry);

    let react = graph.requirements_on("react");
    assert_eq!(react.len(), 1);
    assert_eq!(react[0].requirement.kind, DependencyKind::Peer);
    assert!(!react[0].requirement.optional);
    assert!(graph.requirements_on("scheduler")[0].requirement.optional);
}

#[test]
fn test_package_names() {
    let mut snap = snapshot(tree());
    snap.overrides.insert("a>semver", "7.5.4");

    let names: Vec<String> = package_names(&snap).into_iter().collect();
    assert_eq!(names, vec!["a", "b", "lodash", "semver"]);
}
