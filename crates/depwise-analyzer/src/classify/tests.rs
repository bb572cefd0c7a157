//! Unit tests for the conflict classifier

use super::*;
use crate::fixtures::{duplicated_lodash, manifest, member, metadata, registry, snapshot};
use depwise_core::types::{InstalledNode, RuntimeFacts};
use proptest::prelude::*;

fn classify(snapshot: &ProjectSnapshot, registry: &RegistryIndex) -> Vec<ConflictRecord> {
    let graph = RequirementGraph::build(snapshot, registry);
    Classifier::new(snapshot, &graph, registry).classify()
}

fn of_type(records: &[ConflictRecord], conflict_type: ConflictType) -> Vec<&ConflictRecord> {
    records
        .iter()
        .filter(|r| r.conflict_type == conflict_type)
        .collect()
}

#[test]
fn test_two_versions_is_info() {
    let records = classify(&duplicated_lodash(), &RegistryIndex::new());

    let multiple = of_type(&records, ConflictType::MultipleVersions);
    assert_eq!(multiple.len(), 1);
    assert_eq!(multiple[0].package, "lodash");
    assert_eq!(multiple[0].severity, Severity::Info);
    assert_eq!(multiple[0].message, "lodash resolves to 2 versions: 3.10.1, 4.17.20");
    assert_eq!(multiple[0].affected_locations.len(), 2);
}

#[test]
fn test_three_versions_is_warning() {
    let mut snap = duplicated_lodash();
    snap.installed[1] = InstalledNode::new("b", "2.0.0", "node_modules/b").with_child(
        InstalledNode::new("lodash", "2.4.2", "node_modules/b/node_modules/lodash"),
    );

    let records = classify(&snap, &RegistryIndex::new());
    let multiple = of_type(&records, ConflictType::MultipleVersions);
    assert_eq!(multiple.len(), 1);
    assert_eq!(multiple[0].severity, Severity::Warning);
    match &multiple[0].evidence[0] {
        Evidence::ResolvedVersions { versions } => {
            let listed: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
            assert_eq!(listed, vec!["3.10.1", "2.4.2", "4.17.20"]);
        }
        other => panic!("unexpected evidence {:?}", other),
    }
}

#[test]
fn test_mismatched_peer_is_warning() {
    let snap = snapshot(
        manifest("app", &[("react", "^17.0.0"), ("react-dom", "^18.0.0")]),
        vec![
            InstalledNode::new("react", "17.0.2", "node_modules/react"),
            InstalledNode::new("react-dom", "18.2.0", "node_modules/react-dom")
                .with_peer("react", "^18.2.0", false),
        ],
    );

    let records = classify(&snap, &RegistryIndex::new());
    let peers = of_type(&records, ConflictType::PeerDependency);
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].severity, Severity::Warning);
    assert_eq!(peers[0].package, "react");
    assert!(peers[0].message.contains("react-dom@18.2.0 expects peer react@^18.2.0"));
    assert!(of_type(&records, ConflictType::MissingDependency).is_empty());
}

#[test]
fn test_absent_peer_is_missing_dependency() {
    let snap = snapshot(
        manifest("app", &[("react-dom", "^18.0.0")]),
        vec![InstalledNode::new("react-dom", "18.2.0", "node_modules/react-dom")
            .with_peer("react", "^18.2.0", false)],
    );

    let records = classify(&snap, &RegistryIndex::new());
    assert!(of_type(&records, ConflictType::PeerDependency).is_empty());

    let missing = of_type(&records, ConflictType::MissingDependency);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].package, "react");
    assert_eq!(missing[0].severity, Severity::Error);
    assert_eq!(missing[0].affected_locations, vec!["node_modules/react-dom"]);
}

#[test]
fn test_optional_peers_are_never_reported() {
    let snap = snapshot(
        manifest("app", &[("react-dom", "^18.0.0")]),
        vec![
            InstalledNode::new("react-dom", "18.2.0", "node_modules/react-dom")
                .with_peer("react", "^18.2.0", true)
                .with_peer("scheduler", "^0.23.0", true),
            InstalledNode::new("react", "16.0.0", "node_modules/react"),
        ],
    );

    let records = classify(&snap, &RegistryIndex::new());
    assert!(records.is_empty(), "unexpected records: {:?}", records);
}

#[test]
fn test_workspace_mismatch_lists_both_members() {
    let mut snap = snapshot(manifest("monorepo", &[]), Vec::new());
    snap.workspaces = vec![
        member("a", "packages/a", &[("lodash", "^4.0.0")]),
        member("b", "packages/b", &[("lodash", "^3.0.0")]),
        member("c", "packages/c", &[("react", "^18.0.0")]),
    ];

    let records = classify(&snap, &RegistryIndex::new());
    let mismatches = of_type(&records, ConflictType::WorkspaceMismatch);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].package, "lodash");
    assert_eq!(mismatches[0].evidence.len(), 2);
    assert_eq!(
        mismatches[0].affected_locations,
        vec!["packages/a/package.json", "packages/b/package.json"]
    );
    match &mismatches[0].evidence[1] {
        Evidence::MemberRequirement { member, range, .. } => {
            assert_eq!(member, "b");
            assert_eq!(range, "^3.0.0");
        }
        other => panic!("unexpected evidence {:?}", other),
    }
}

#[test]
fn test_workspace_comparison_is_textual() {
    let mut snap = snapshot(manifest("monorepo", &[]), Vec::new());
    snap.workspaces = vec![
        member("a", "packages/a", &[("lodash", "^4.17.0")]),
        member("b", "packages/b", &[("lodash", "^4.17.0")]),
        member("c", "packages/c", &[("react", "^18.0.0")]),
        member("d", "packages/d", &[("react", "18.x")]),
    ];

    let records = classify(&snap, &RegistryIndex::new());
    let mismatches = of_type(&records, ConflictType::WorkspaceMismatch);
    // `^18.0.0` and `18.x` admit the same versions but differ as text
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].package, "react");
}

#[test]
fn test_engine_mismatch() {
    let mut root = manifest("app", &[]);
    root.engines.insert("node".to_string(), ">=18".to_string());
    let mut snap = snapshot(root, Vec::new());
    snap.runtime = Some(RuntimeFacts::node("v16.20.0"));

    let records = classify(&snap, &RegistryIndex::new());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].conflict_type, ConflictType::EngineMismatch);
    assert_eq!(records[0].severity, Severity::Error);
    assert_eq!(records[0].package, "node");
}

#[test]
fn test_engine_upper_bounds_are_ignored() {
    let mut snap = snapshot(manifest("app", &[]), Vec::new());
    snap.runtime = Some(RuntimeFacts {
        name: "node".to_string(),
        current_version: "22.0.0".to_string(),
        declared_range: Some(">=18 <20".to_string()),
    });

    assert!(classify(&snap, &RegistryIndex::new()).is_empty());
}

#[test]
fn test_package_engines_from_registry() {
    let mut vite = metadata("vite", "5.0.0", &["5.0.0"]);
    if let Some(version) = vite.versions.get_mut("5.0.0") {
        version.engines = Some(serde_json::json!({ "node": ">=18.0.0" }));
    }
    let mut snap = snapshot(
        manifest("app", &[("vite", "^5.0.0")]),
        vec![InstalledNode::new("vite", "5.0.0", "node_modules/vite")],
    );
    snap.runtime = Some(RuntimeFacts::node("16.20.0"));

    let records = classify(&snap, &registry(vec![vite]));
    let engines = of_type(&records, ConflictType::EngineMismatch);
    assert_eq!(engines.len(), 1);
    assert_eq!(engines[0].package, "vite");
    assert_eq!(engines[0].affected_locations, vec!["node_modules/vite"]);
}

#[test]
fn test_version_conflict_severity() {
    let snap = snapshot(
        manifest("app", &[("a", "^1.0.0"), ("lodash", "^4.17.0")]),
        vec![
            InstalledNode::new("a", "1.0.0", "node_modules/a").with_dependency("semver", "^7.0.0"),
            InstalledNode::new("lodash", "3.10.1", "node_modules/lodash"),
            InstalledNode::new("semver", "6.3.1", "node_modules/semver"),
        ],
    );

    let records = classify(&snap, &RegistryIndex::new());
    let conflicts = of_type(&records, ConflictType::VersionConflict);
    assert_eq!(conflicts.len(), 2);

    assert_eq!(conflicts[0].package, "lodash");
    assert_eq!(conflicts[0].severity, Severity::Error);
    assert_eq!(conflicts[0].message, "lodash is installed at 3.10.1 but app requires ^4.17.0");

    assert_eq!(conflicts[1].package, "semver");
    assert_eq!(conflicts[1].severity, Severity::Warning);
}

#[test]
fn test_missing_root_dependencies() {
    let mut root = manifest("app", &[("lodash", "^4.17.0"), ("ui", "workspace:*")]);
    root.dev_dependencies.insert("jest".to_string(), "^29.0.0".to_string());
    root.optional_dependencies.insert("fsevents".to_string(), "^2.3.0".to_string());
    let mut snap = snapshot(root, vec![InstalledNode::new("lodash", "4.17.21", "node_modules/lodash")]);
    snap.workspaces = vec![member("ui", "packages/ui", &[])];

    let records = classify(&snap, &RegistryIndex::new());
    let missing = of_type(&records, ConflictType::MissingDependency);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].package, "jest");
    assert_eq!(missing[0].affected_locations, vec!["package.json"]);
}

#[test]
fn test_override_risk_threads_requirements() {
    let mut snap = duplicated_lodash();
    snap.overrides.insert("a>lodash", "4.17.21");

    let records = classify(&snap, &RegistryIndex::new());
    let overrides = of_type(&records, ConflictType::OverrideRisk);
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].severity, Severity::Info);
    assert!(overrides[0].message.contains("forced to 4.17.21 via overrides"));

    match &overrides[0].evidence[0] {
        Evidence::Override { path, overridden, .. } => {
            assert_eq!(path, "a>lodash");
            assert_eq!(overridden.len(), 2);
            assert_eq!(overridden[0].consumer, "a@1.0.0");
            assert!(!overridden[0].satisfied);
            assert_eq!(overridden[1].consumer, "b@2.0.0");
            assert!(overridden[1].satisfied);
        }
        other => panic!("unexpected evidence {:?}", other),
    }
}

#[test]
fn test_deprecated_versions() {
    let mut request = metadata("request", "2.88.2", &["2.88.0", "2.88.2"]);
    for version in request.versions.values_mut() {
        version.deprecated = Some(serde_json::json!("request has been deprecated"));
    }
    let snap = snapshot(
        manifest("app", &[("request", "^2.88.0")]),
        vec![InstalledNode::new("request", "2.88.2", "node_modules/request")],
    );

    let records = classify(&snap, &registry(vec![request]));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].conflict_type, ConflictType::Deprecated);
    assert_eq!(records[0].severity, Severity::Warning);
    assert_eq!(records[0].message, "request@2.88.2 is deprecated: request has been deprecated");
    assert_eq!(records[0].suggested_action, "Replace request with a maintained alternative");
}

#[test]
fn test_classification_is_idempotent() {
    let mut snap = duplicated_lodash();
    snap.overrides.insert("lodash", "4.17.21");
    snap.runtime = Some(RuntimeFacts {
        name: "node".to_string(),
        current_version: "16.0.0".to_string(),
        declared_range: Some(">=18".to_string()),
    });

    let first = classify(&snap, &RegistryIndex::new());
    let second = classify(&snap, &RegistryIndex::new());
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_dedupe_keeps_first() {
    let records = vec![
        ConflictRecord::new(ConflictType::Deprecated, "a", Severity::Warning, "first"),
        ConflictRecord::new(ConflictType::Deprecated, "a", Severity::Info, "second"),
        ConflictRecord::new(ConflictType::MultipleVersions, "a", Severity::Info, "other"),
    ];

    let kept = dedupe(records);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].message, "first");
}

fn conflict_type() -> impl Strategy<Value = ConflictType> {
    prop_oneof![
        Just(ConflictType::VersionConflict),
        Just(ConflictType::PeerDependency),
        Just(ConflictType::MultipleVersions),
        Just(ConflictType::OverrideRisk),
        Just(ConflictType::Deprecated),
    ]
}

proptest! {
    #[test]
    fn dedupe_leaves_one_record_per_type_and_package(
        raw in prop::collection::vec((conflict_type(), 0usize..4), 0..30)
    ) {
        let records: Vec<ConflictRecord> = raw
            .iter()
            .map(|(ty, pkg)| ConflictRecord::new(*ty, format!("pkg{}", pkg), Severity::Info, ""))
            .collect();

        let kept = dedupe(records);
        let keys: HashSet<(ConflictType, String)> = kept
            .iter()
            .map(|r| (r.conflict_type, r.package.clone()))
            .collect();
        let expected: HashSet<(ConflictType, String)> = raw
            .iter()
            .map(|(ty, pkg)| (*ty, format!("pkg{}", pkg)))
            .collect();

        prop_assert_eq!(keys.len(), kept.len());
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn multiple_versions_severity_rule(count in 2usize..8) {
        let installed: Vec<InstalledNode> = (0..count)
            .map(|i| {
                InstalledNode::new(
                    "dup",
                    format!("1.{}.0", i),
                    format!("node_modules/host{}/node_modules/dup", i),
                )
            })
            .collect();

        let snap = snapshot(manifest("app", &[]), installed);
        let records = classify(&snap, &RegistryIndex::new());
        let multiple = of_type(&records, ConflictType::MultipleVersions);

        prop_assert_eq!(multiple.len(), 1);
        let expected = if count > 2 { Severity::Warning } else { Severity::Info };
        prop_assert_eq!(multiple[0].severity, expected);
    }
}
