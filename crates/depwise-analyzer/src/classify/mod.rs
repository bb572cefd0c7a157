//! Conflict classifier
//!
//! Independent checks over the normalized graph. Each check groups its
//! findings by package and emits at most one record per package; a final
//! pass keeps the first record for every `(type, package)` pair.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use depwise_core::types::{
    ConflictRecord, ConflictType, DependencyKind, Evidence, OverrideDirective,
    OverriddenRequirement, ProjectSnapshot, Severity, Version,
};
use depwise_core::utils::manifest_path;
use depwise_registry::RegistryIndex;

use crate::graph::{MemberRequirements, RequirementEdge, RequirementGraph};
use crate::semver::{engine_allows, extract_version, satisfies};

type Check<'a> = (&'static str, fn(&Classifier<'a>) -> Vec<ConflictRecord>);

/// Runs every check over one snapshot
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    snapshot: &'a ProjectSnapshot,
    graph: &'a RequirementGraph,
    registry: &'a RegistryIndex,
}

impl<'a> Classifier<'a> {
    pub fn new(
        snapshot: &'a ProjectSnapshot,
        graph: &'a RequirementGraph,
        registry: &'a RegistryIndex,
    ) -> Self {
        Self {
            snapshot,
            graph,
            registry,
        }
    }

    /// All conflicts, deduplicated by `(type, package)`
    pub fn classify(&self) -> Vec<ConflictRecord> {
        let checks: [Check<'a>; 8] = [
            ("version_conflict", Self::version_conflicts),
            ("missing_dependency", Self::missing_dependencies),
            ("peer_dependency", Self::peer_dependencies),
            ("multiple_versions", Self::multiple_versions),
            ("workspace_mismatch", Self::workspace_mismatches),
            ("override_risk", Self::override_risks),
            ("engine_mismatch", Self::engine_mismatches),
            ("deprecated", Self::deprecations),
        ];

        let mut records = Vec::new();
        for (name, check) in checks {
            let found = check(self);
            debug!(check = name, found = found.len(), "Classifier check finished");
            records.extend(found);
        }
        dedupe(records)
    }

    /// Installed versions that fall outside a declared non-peer range
    pub fn version_conflicts(&self) -> Vec<ConflictRecord> {
        let mut violations: IndexMap<&str, Vec<&RequirementEdge>> = IndexMap::new();

        for edge in self.graph.requirements() {
            if edge.requirement.kind == DependencyKind::Peer {
                continue;
            }
            let resolved = match &edge.resolved {
                Some(resolved) => resolved,
                None => continue,
            };
            // Non-semver ranges and versions are not judged
            let (req, version) = match (edge.requirement.parsed(), resolved.version.parse::<Version>()) {
                (Some(req), Ok(version)) => (req, version),
                _ => continue,
            };
            if !req.matches(&version) {
                violations
                    .entry(edge.requirement.name.as_str())
                    .or_default()
                    .push(edge);
            }
        }

        violations
            .into_iter()
            .map(|(package, edges)| {
                let severity = if edges.iter().any(|edge| edge.from_root) {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                let first = edges[0];
                let found = first
                    .resolved
                    .as_ref()
                    .map(|r| r.version.as_str())
                    .unwrap_or_default();
                let message = format!(
                    "{} is installed at {} but {} requires {}{}",
                    package,
                    found,
                    first.consumer,
                    first.requirement.range,
                    and_more(edges.len())
                );

                let evidence = edges
                    .iter()
                    .map(|edge| {
                        let found = edge.resolved.iter().map(|r| r.version.clone()).collect();
                        requirement_evidence(edge, found)
                    })
                    .collect();
                let locations = unique(
                    edges
                        .iter()
                        .filter_map(|edge| edge.resolved.as_ref().map(|r| r.location.clone())),
                );

                ConflictRecord::new(ConflictType::VersionConflict, package, severity, message)
                    .with_evidence(evidence)
                    .with_locations(locations)
                    .with_action(format!(
                        "Update {} to a version that satisfies every declared range",
                        package
                    ))
            })
            .collect()
    }

    /// Required packages that resolve to nothing, including absent peers
    pub fn missing_dependencies(&self) -> Vec<ConflictRecord> {
        let mut missing: IndexMap<&str, Vec<&RequirementEdge>> = IndexMap::new();

        for edge in self.graph.requirements() {
            if !edge.requirement.is_required() || self.is_workspace_link(edge) {
                continue;
            }
            let absent = match edge.requirement.kind {
                DependencyKind::Peer => !self.graph.is_installed(&edge.requirement.name),
                _ => edge.resolved.is_none(),
            };
            if absent {
                missing
                    .entry(edge.requirement.name.as_str())
                    .or_default()
                    .push(edge);
            }
        }

        missing
            .into_iter()
            .map(|(package, edges)| {
                let first = edges[0];
                let message = format!(
                    "{} is required by {}{} but is not installed",
                    package,
                    first.consumer,
                    and_more(edges.len())
                );
                let evidence = edges
                    .iter()
                    .map(|edge| requirement_evidence(edge, Vec::new()))
                    .collect();
                let locations = unique(edges.iter().map(|edge| consumer_location(edge)));

                ConflictRecord::new(ConflictType::MissingDependency, package, Severity::Error, message)
                    .with_evidence(evidence)
                    .with_locations(locations)
                    .with_action(format!("Install {} ({})", package, first.requirement.range))
            })
            .collect()
    }

    /// Non-optional peers installed only at versions outside the peer range
    pub fn peer_dependencies(&self) -> Vec<ConflictRecord> {
        let mut unmet: IndexMap<&str, Vec<&RequirementEdge>> = IndexMap::new();

        for edge in self.graph.requirements() {
            if edge.requirement.kind != DependencyKind::Peer || edge.requirement.optional {
                continue;
            }
            // Absent peers are missing dependencies
            let record = match self.graph.record(&edge.requirement.name) {
                Some(record) => record,
                None => continue,
            };
            let req = match edge.requirement.parsed() {
                Some(req) => req,
                None => continue,
            };
            let versions: Vec<Version> = record
                .versions
                .keys()
                .filter_map(|v| v.parse().ok())
                .collect();
            if versions.is_empty() {
                continue;
            }
            if !versions.iter().any(|v| req.matches(v)) {
                unmet
                    .entry(edge.requirement.name.as_str())
                    .or_default()
                    .push(edge);
            }
        }

        unmet
            .into_iter()
            .filter_map(|(package, edges)| {
                let record = self.graph.record(package)?;
                let found: Vec<String> = record.versions.keys().cloned().collect();
                let first = edges[0];
                let message = format!(
                    "{} expects peer {}@{}{} but only {} is installed",
                    first.consumer,
                    package,
                    first.requirement.range,
                    and_more(edges.len()),
                    found.join(", ")
                );
                let evidence = edges
                    .iter()
                    .map(|edge| requirement_evidence(edge, found.clone()))
                    .collect();

                Some(
                    ConflictRecord::new(ConflictType::PeerDependency, package, Severity::Warning, message)
                        .with_evidence(evidence)
                        .with_locations(record.locations())
                        .with_action(format!(
                            "Install a version of {} that matches {}, or upgrade {}",
                            package, first.requirement.range, first.consumer
                        )),
                )
            })
            .collect()
    }

    /// Packages resolved at more than one version
    pub fn multiple_versions(&self) -> Vec<ConflictRecord> {
        self.graph
            .flat()
            .values()
            .filter(|record| record.multiplicity() > 1)
            .map(|record| {
                let count = record.multiplicity();
                let message = format!(
                    "{} resolves to {} versions: {}",
                    record.name,
                    count,
                    record.version_strings().join(", ")
                );
                ConflictRecord::new(
                    ConflictType::MultipleVersions,
                    record.name.clone(),
                    multiple_versions_severity(count),
                    message,
                )
                .with_evidence(vec![Evidence::ResolvedVersions {
                    versions: record.evidence(),
                }])
                .with_locations(record.locations())
                .with_action(format!(
                    "Deduplicate {} so one version serves every consumer",
                    record.name
                ))
            })
            .collect()
    }

    /// Workspace members declaring one package with different range strings
    pub fn workspace_mismatches(&self) -> Vec<ConflictRecord> {
        let mut declared: IndexMap<&str, Vec<(&MemberRequirements, &str)>> = IndexMap::new();

        for member in self.graph.workspace() {
            let mut seen = HashSet::new();
            for req in &member.requirements {
                if req.kind == DependencyKind::Peer || !seen.insert(req.name.as_str()) {
                    continue;
                }
                declared
                    .entry(req.name.as_str())
                    .or_default()
                    .push((member, req.range.as_str()));
            }
        }

        declared
            .into_iter()
            .filter_map(|(package, entries)| {
                let distinct: HashSet<&str> = entries.iter().map(|(_, range)| *range).collect();
                if distinct.len() < 2 {
                    return None;
                }

                let message = format!(
                    "{} is declared with {} different ranges across {} workspace members",
                    package,
                    distinct.len(),
                    entries.len()
                );
                let evidence = entries
                    .iter()
                    .map(|(member, range)| Evidence::MemberRequirement {
                        member: member.member.clone(),
                        relative_path: member.relative_path.clone(),
                        range: range.to_string(),
                    })
                    .collect();
                let locations = entries
                    .iter()
                    .map(|(member, _)| manifest_path(&member.relative_path))
                    .collect();

                Some(
                    ConflictRecord::new(ConflictType::WorkspaceMismatch, package, Severity::Warning, message)
                        .with_evidence(evidence)
                        .with_locations(locations)
                        .with_action(format!(
                            "Declare the same range for {} in every workspace member",
                            package
                        )),
                )
            })
            .collect()
    }

    /// One informational record per overridden package
    pub fn override_risks(&self) -> Vec<ConflictRecord> {
        let mut by_package: IndexMap<String, Vec<OverrideDirective>> = IndexMap::new();
        for directive in self.snapshot.overrides.directives() {
            by_package
                .entry(directive.package.clone())
                .or_default()
                .push(directive);
        }

        let field = self.snapshot.package_manager.override_field();
        by_package
            .into_iter()
            .map(|(package, directives)| {
                let edges = self.graph.requirements_on(&package);
                let mut unsatisfied = 0;
                let evidence: Vec<Evidence> = directives
                    .iter()
                    .map(|directive| {
                        let overridden: Vec<OverriddenRequirement> = edges
                            .iter()
                            .map(|edge| OverriddenRequirement {
                                consumer: edge.consumer.clone(),
                                range: edge.requirement.range.clone(),
                                satisfied: forced_satisfies(&directive.forced_version, &edge.requirement.range),
                            })
                            .collect();
                        unsatisfied += overridden.iter().filter(|o| !o.satisfied).count();
                        Evidence::Override {
                            path: directive.path.clone(),
                            forced_version: directive.forced_version.clone(),
                            overridden,
                        }
                    })
                    .collect();

                let mut message = format!(
                    "{} is forced to {} via {}",
                    package, directives[0].forced_version, field
                );
                if unsatisfied > 0 {
                    message.push_str(&format!(
                        "; {} declared range(s) do not admit the forced version",
                        unsatisfied
                    ));
                }
                let locations = self
                    .graph
                    .record(&package)
                    .map(|record| record.locations())
                    .unwrap_or_default();

                ConflictRecord::new(ConflictType::OverrideRisk, package.as_str(), Severity::Info, message)
                    .with_evidence(evidence)
                    .with_locations(locations)
                    .with_action(format!(
                        "Revisit the {} entry for {} when its consumers are upgraded",
                        field, package
                    ))
            })
            .collect()
    }

    /// Runtime older than a `>=N` engine requirement
    pub fn engine_mismatches(&self) -> Vec<ConflictRecord> {
        let runtime = match &self.snapshot.runtime {
            Some(runtime) => runtime,
            None => return Vec::new(),
        };
        let mut records = Vec::new();

        if let Some(range) = self.snapshot.engine_range() {
            if !engine_allows(range, &runtime.current_version) {
                let message = format!(
                    "{} {} does not satisfy the project's engine range {}",
                    runtime.name, runtime.current_version, range
                );
                records.push(
                    ConflictRecord::new(ConflictType::EngineMismatch, runtime.name.as_str(), Severity::Error, message)
                        .with_evidence(vec![engine_evidence(runtime.name.as_str(), &runtime.current_version, range)])
                        .with_locations(vec![manifest_path("")])
                        .with_action(format!("Switch to a {} release matching {}", runtime.name, range)),
                );
            }
        }

        // Installed packages whose published engines exclude the runtime
        let mut packages: IndexMap<&str, Vec<(&str, String)>> = IndexMap::new();
        for package in self.graph.packages() {
            let required = self
                .registry
                .get(&package.name)
                .and_then(|metadata| metadata.versions.get(&package.version))
                .and_then(|version| version.engine(&runtime.name));
            if let Some(required) = required {
                if !engine_allows(required, &runtime.current_version) {
                    packages
                        .entry(package.name.as_str())
                        .or_default()
                        .push((required, package.location.clone()));
                }
            }
        }

        records.extend(packages.into_iter().map(|(package, found)| {
            let message = format!(
                "{} requires {} {} but the runtime is {}",
                package, runtime.name, found[0].0, runtime.current_version
            );
            let evidence = found
                .iter()
                .map(|(required, _)| engine_evidence(runtime.name.as_str(), &runtime.current_version, required))
                .collect();
            ConflictRecord::new(ConflictType::EngineMismatch, package, Severity::Error, message)
                .with_evidence(evidence)
                .with_locations(found.into_iter().map(|(_, location)| location).collect())
                .with_action(format!(
                    "Upgrade {} or pick a {} release supported by the runtime",
                    runtime.name, package
                ))
        }));

        records
    }

    /// Resolved versions the registry marks as deprecated
    pub fn deprecations(&self) -> Vec<ConflictRecord> {
        self.graph
            .flat()
            .values()
            .filter_map(|record| {
                let deprecated: Vec<(&str, &str, &[String])> = record
                    .versions
                    .values()
                    .filter_map(|resolved| {
                        self.registry
                            .deprecation(&record.name, &resolved.version)
                            .map(|message| (resolved.version.as_str(), message, resolved.locations.as_slice()))
                    })
                    .collect();
                if deprecated.is_empty() {
                    return None;
                }

                let versions: Vec<&str> = deprecated.iter().map(|(version, _, _)| *version).collect();
                let message = format!(
                    "{}@{} is deprecated: {}",
                    record.name,
                    versions.join(", "),
                    deprecated[0].1
                );
                let evidence = deprecated
                    .iter()
                    .map(|(version, message, _)| Evidence::Deprecation {
                        version: version.to_string(),
                        message: message.to_string(),
                    })
                    .collect();
                let locations = deprecated
                    .iter()
                    .flat_map(|(_, _, locations)| locations.iter().cloned())
                    .collect();
                let action = match self.registry.latest(&record.name) {
                    Some(latest) if !versions.contains(&latest) => {
                        format!("Upgrade {} to {}", record.name, latest)
                    }
                    _ => format!("Replace {} with a maintained alternative", record.name),
                };

                Some(
                    ConflictRecord::new(ConflictType::Deprecated, record.name.as_str(), Severity::Warning, message)
                        .with_evidence(evidence)
                        .with_locations(locations)
                        .with_action(action),
                )
            })
            .collect()
    }

    /// Requirements satisfied by a workspace member rather than the tree
    fn is_workspace_link(&self, edge: &RequirementEdge) -> bool {
        edge.requirement.range.trim_start().starts_with("workspace:")
            || self
                .snapshot
                .workspaces
                .iter()
                .any(|member| member.name == edge.requirement.name)
    }
}

/// `warning` once a package has more than two versions
pub fn multiple_versions_severity(count: usize) -> Severity {
    if count > 2 {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Keep the first record for every `(type, package)`
pub fn dedupe(records: Vec<ConflictRecord>) -> Vec<ConflictRecord> {
    let mut seen: HashSet<(ConflictType, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.conflict_type, record.package.clone())))
        .collect()
}

/// Whether a forced version (possibly written as a range) satisfies a range
fn forced_satisfies(forced: &str, range: &str) -> bool {
    match extract_version(forced) {
        Some(version) => satisfies(&version.to_string(), range),
        None => false,
    }
}

fn requirement_evidence(edge: &RequirementEdge, found: Vec<String>) -> Evidence {
    Evidence::Requirement {
        consumer: edge.consumer.clone(),
        range: edge.requirement.range.clone(),
        dependency_kind: edge.requirement.kind,
        found,
    }
}

fn engine_evidence(runtime: &str, current_version: &str, required_range: &str) -> Evidence {
    Evidence::Engine {
        runtime: runtime.to_string(),
        current_version: current_version.to_string(),
        required_range: required_range.to_string(),
    }
}

fn consumer_location(edge: &RequirementEdge) -> String {
    if edge.from_root {
        manifest_path("")
    } else {
        edge.consumer_location.clone()
    }
}

fn and_more(count: usize) -> String {
    if count > 1 {
        format!(" (and {} more)", count - 1)
    } else {
        String::new()
    }
}

fn unique(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests;
