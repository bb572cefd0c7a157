//! Common utilities for benchmarks

use std::collections::HashMap;

use criterion::Criterion;
use depwise_core::types::{InstalledNode, ProjectManifest, ProjectSnapshot};
use depwise_registry::{PackageMetadataResponse, RegistryIndex, VersionMetadata};
use pprof::criterion::{Output, PProfProfiler};

/// Shared libraries every synthetic package pulls in
pub const SHARED_LIBRARIES: usize = 10;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

fn shared_name(index: usize) -> String {
    format!("shared-{}", index % SHARED_LIBRARIES)
}

/// Project with `packages` direct dependencies
///
/// Each package requires one shared library at major 1, 2 or 3. Major 1 is
/// hoisted; the others are nested, so every shared library ends up
/// installed at several versions.
pub fn synthetic_snapshot(packages: usize) -> ProjectSnapshot {
    let mut root = ProjectManifest {
        name: Some("bench-app".to_string()),
        ..ProjectManifest::default()
    };
    let mut installed = Vec::with_capacity(packages + SHARED_LIBRARIES);

    for i in 0..packages {
        let name = format!("pkg-{}", i);
        let shared = shared_name(i);
        let major = i % 3 + 1;
        root.dependencies.insert(name.clone(), "^1.0.0".to_string());

        let location = format!("node_modules/{}", name);
        let mut node = InstalledNode::new(&name, format!("1.0.{}", i), &location)
            .with_dependency(&shared, format!("^{}.0.0", major));
        if major > 1 {
            node = node.with_child(InstalledNode::new(
                &shared,
                format!("{}.0.0", major),
                format!("{}/node_modules/{}", location, shared),
            ));
        }
        installed.push(node);
    }

    for i in 0..SHARED_LIBRARIES.min(packages) {
        let shared = shared_name(i);
        installed.push(InstalledNode::new(
            &shared,
            "1.0.0",
            format!("node_modules/{}", shared),
        ));
    }

    ProjectSnapshot {
        root,
        installed,
        ..ProjectSnapshot::default()
    }
}

fn document(name: &str, versions: &[String]) -> PackageMetadataResponse {
    let published = versions
        .iter()
        .map(|version| {
            (
                version.clone(),
                VersionMetadata {
                    version: version.clone(),
                    dependencies: HashMap::new(),
                    peer_dependencies: HashMap::new(),
                    peer_dependencies_meta: HashMap::new(),
                    engines: None,
                    deprecated: None,
                },
            )
        })
        .collect();
    let latest = versions.last().cloned().unwrap_or_default();

    PackageMetadataResponse {
        name: name.to_string(),
        description: None,
        dist_tags: HashMap::from([("latest".to_string(), latest)]),
        versions: published,
        time: HashMap::new(),
    }
}

/// Registry facts matching [`synthetic_snapshot`]
pub fn synthetic_registry(packages: usize) -> RegistryIndex {
    let mut documents = Vec::with_capacity(packages + SHARED_LIBRARIES);
    for i in 0..packages {
        documents.push(document(
            &format!("pkg-{}", i),
            &[format!("1.0.{}", i), format!("1.1.{}", i)],
        ));
    }
    for i in 0..SHARED_LIBRARIES.min(packages) {
        documents.push(document(&shared_name(i), &version_strings(3, 4)));
    }
    documents.into_iter().collect()
}

/// `majors * minors` ascending version strings
pub fn version_strings(majors: usize, minors: usize) -> Vec<String> {
    let mut versions = Vec::with_capacity(majors * minors);
    for major in 1..=majors {
        for minor in 0..minors {
            versions.push(format!("{}.{}.0", major, minor));
        }
    }
    versions
}

/// Ranges covering every grammar form
pub fn range_strings() -> Vec<&'static str> {
    vec![
        "^1.2.3",
        "~2.1.0",
        ">=1.0.0 <3.0.0",
        "1.x",
        "1.2.3 - 2.3.4",
        "^1.0.0 || ^3.0.0",
        "*",
        "=2.0.0",
        "^0.0.3",
        ">1.5.0-beta.1",
    ]
}
