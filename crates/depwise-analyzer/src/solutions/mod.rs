//! Solution generator
//!
//! Proposes remediation candidates for each actionable conflict (up to four:
//! upgrade to latest, upgrade to an explicit target, force-pin override and
//! workspace unification) and graph-wide candidates for the report as a
//! whole. Candidates leave here unscored; see [`crate::score`].

use std::collections::BTreeMap;

use depwise_core::types::{
    CandidateKind, ConflictRecord, ConflictType, ProjectSnapshot, SolutionCandidate, SolutionStep,
    StepAction, Strategy, Version, VersionReq,
};
use depwise_core::utils::{manifest_path, stable_id};
use depwise_registry::RegistryIndex;

use crate::graph::RequirementGraph;
use crate::semver::{extract_version, is_major_bump, VersionSelector};

/// Caller preferences for candidate generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisorOptions {
    pub strategy: Strategy,
    /// Permit major upgrades without the aggressive strategy
    pub allow_major: bool,
    /// Explicit target versions by package name
    pub targets: BTreeMap<String, String>,
}

impl AdvisorOptions {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_target(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.targets.insert(name.into(), version.into());
        self
    }

    fn permits_major(&self) -> bool {
        self.allow_major || self.strategy == Strategy::Aggressive
    }
}

/// A manifest that declares a package, and the range it declares
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    owner: String,
    artifact: String,
    range: String,
}

/// Builds candidates from one snapshot's facts
#[derive(Debug, Clone, Copy)]
pub struct SolutionGenerator<'a> {
    snapshot: &'a ProjectSnapshot,
    graph: &'a RequirementGraph,
    registry: &'a RegistryIndex,
    options: &'a AdvisorOptions,
}

impl<'a> SolutionGenerator<'a> {
    pub fn new(
        snapshot: &'a ProjectSnapshot,
        graph: &'a RequirementGraph,
        registry: &'a RegistryIndex,
        options: &'a AdvisorOptions,
    ) -> Self {
        Self {
            snapshot,
            graph,
            registry,
            options,
        }
    }

    /// Package-level candidates for one conflict, in generation order
    pub fn for_conflict(&self, conflict: &ConflictRecord) -> Vec<SolutionCandidate> {
        if !conflict.conflict_type.is_actionable() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        candidates.extend(self.upgrade_to_latest(conflict));
        candidates.extend(self.upgrade_to_target(conflict));
        candidates.extend(self.force_pin(conflict));
        candidates.extend(self.workspace_unify(conflict));
        candidates
    }

    /// Graph-wide candidates: dedupe, lock regeneration and update-all
    pub fn global(&self, conflicts: &[ConflictRecord]) -> Vec<SolutionCandidate> {
        if conflicts.is_empty() {
            return Vec::new();
        }
        let lock_file = self.snapshot.package_manager.lock_file();
        let mut candidates = Vec::new();

        let duplicated: Vec<String> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::MultipleVersions)
            .map(|c| c.package.clone())
            .collect();
        if !duplicated.is_empty() {
            let mut candidate = SolutionCandidate::draft(
                stable_id(CandidateKind::Dedupe.as_str(), &["global"]),
                CandidateKind::Dedupe,
                None,
                "Deduplicate the dependency tree",
                format!(
                    "Collapse duplicate installs of {} onto shared versions",
                    duplicated.join(", ")
                ),
            );
            candidate.steps.push(
                SolutionStep::new(StepAction::Dedupe, "*", lock_file)
                    .describe("Run the package manager's dedupe command"),
            );
            candidate.compatibility.affected_packages = duplicated;
            candidate.compatibility.testing_required = testing_required(false, true, false);
            candidates.push(candidate);
        }

        let affected = distinct_packages(conflicts);
        let mut regenerate = SolutionCandidate::draft(
            stable_id(CandidateKind::RegenerateLock.as_str(), &["global"]),
            CandidateKind::RegenerateLock,
            None,
            format!("Regenerate {}", lock_file),
            "Delete the lock artifact and reinstall so every range is resolved afresh",
        );
        regenerate.steps.push(
            SolutionStep::new(StepAction::RegenerateLock, "*", lock_file)
                .describe(format!("Remove {} and reinstall", lock_file)),
        );
        regenerate.compatibility.affected_packages = affected.clone();
        regenerate.compatibility.testing_required = testing_required(false, true, false);
        candidates.push(regenerate);

        if self.options.strategy == Strategy::Aggressive {
            candidates.push(self.update_all(affected));
        }

        candidates
    }

    fn update_all(&self, affected: Vec<String>) -> SolutionCandidate {
        let mut candidate = SolutionCandidate::draft(
            stable_id(CandidateKind::UpdateAll.as_str(), &["global"]),
            CandidateKind::UpdateAll,
            None,
            "Update every direct dependency to latest",
            "Move all root dependencies to their latest published versions",
        );

        let mut breaking = false;
        for (name, range) in self
            .snapshot
            .root
            .dependencies
            .iter()
            .chain(self.snapshot.root.dev_dependencies.iter())
        {
            let latest = match self.registry.latest(name) {
                Some(latest) => latest,
                None => continue,
            };
            if extract_version(range).map(|v| v.to_string()).as_deref() == Some(latest) {
                continue;
            }
            let major = is_major_bump(Some(range.as_str()), latest);
            breaking |= major;
            candidate.steps.push(
                SolutionStep::new(StepAction::Upgrade, name.as_str(), manifest_path(""))
                    .from_to(Some(range.clone()), Some(latest.to_string()))
                    .manual(major)
                    .describe(format!("Set {} to {}", name, latest)),
            );
        }

        if candidate.steps.is_empty() {
            candidate.steps.push(
                SolutionStep::new(StepAction::Upgrade, "*", manifest_path(""))
                    .manual(true)
                    .describe("Run the package manager's update to latest"),
            );
            breaking = true;
        }
        candidate.steps.push(
            SolutionStep::new(
                StepAction::RegenerateLock,
                "*",
                self.snapshot.package_manager.lock_file(),
            )
            .describe("Reinstall to refresh the lock artifact"),
        );

        candidate.compatibility.breaking_changes = breaking;
        candidate.compatibility.affected_packages = affected;
        candidate.compatibility.testing_required = testing_required(breaking, true, false);
        candidate
    }

    fn upgrade_to_latest(&self, conflict: &ConflictRecord) -> Option<SolutionCandidate> {
        let package = conflict.package.as_str();
        let latest = self.registry.latest(package)?;
        let span = self.current_span(package);

        // Offered while any installed copy still differs from latest
        if let Some((lowest, highest)) = &span {
            if same_version(lowest, latest) && same_version(highest, latest) {
                return None;
            }
        }
        let lowest = span.map(|(lowest, _)| lowest);
        let breaking = is_major_bump(lowest.as_deref(), latest);
        if breaking && !self.options.permits_major() {
            return None;
        }

        let mut candidate = self.upgrade_candidate(
            conflict,
            CandidateKind::UpgradeToLatest,
            lowest,
            latest,
            breaking,
        );
        candidate.title = format!("Upgrade {} to latest ({})", package, latest);
        Some(candidate)
    }

    fn upgrade_to_target(&self, conflict: &ConflictRecord) -> Option<SolutionCandidate> {
        let package = conflict.package.as_str();
        let target = self.options.targets.get(package)?;
        if self.registry.latest(package) == Some(target.as_str()) {
            return None;
        }

        let lowest = self.current_span(package).map(|(lowest, _)| lowest);
        let breaking = is_major_bump(lowest.as_deref(), target);
        let mut candidate = self.upgrade_candidate(
            conflict,
            CandidateKind::UpgradeToTarget,
            lowest,
            target,
            breaking,
        );
        candidate.title = format!("Move {} to requested version {}", package, target);
        Some(candidate)
    }

    fn upgrade_candidate(
        &self,
        conflict: &ConflictRecord,
        kind: CandidateKind,
        current: Option<String>,
        to: &str,
        breaking: bool,
    ) -> SolutionCandidate {
        let package = conflict.package.as_str();
        let action = match current.as_deref() {
            _ if !self.graph.is_installed(package) => StepAction::Add,
            Some(current) if is_downgrade(current, to) => StepAction::Downgrade,
            _ => StepAction::Upgrade,
        };

        let mut candidate = SolutionCandidate::draft(
            stable_id(kind.as_str(), &[conflict.id.as_str()]),
            kind,
            Some(conflict.id.clone()),
            String::new(),
            format!(
                "{} {} from {} to {}",
                verb(action),
                package,
                current.as_deref().unwrap_or("nothing"),
                to
            ),
        );

        let declarations = self.declarations(package);
        if declarations.is_empty() && action == StepAction::Add {
            candidate.steps.push(
                SolutionStep::new(action, package, manifest_path(""))
                    .from_to(None, Some(format!("^{}", to)))
                    .describe(format!("Add {}@^{} to the root manifest", package, to)),
            );
        } else if declarations.is_empty() {
            // Transitive only: the lock artifact decides the version
            candidate.steps.push(
                SolutionStep::new(action, package, self.snapshot.package_manager.lock_file())
                    .from_to(current.clone(), Some(to.to_string()))
                    .describe(format!("Update {} in the lock artifact", package)),
            );
        } else {
            for declaration in &declarations {
                candidate.steps.push(
                    SolutionStep::new(action, package, declaration.artifact.as_str())
                        .from_to(Some(declaration.range.clone()), Some(format!("^{}", to)))
                        .manual(breaking)
                        .describe(format!(
                            "Change {} in {} from {} to ^{}",
                            package, declaration.owner, declaration.range, to
                        )),
                );
            }
        }

        candidate.compatibility.breaking_changes = breaking;
        candidate.compatibility.affected_packages = self.affected_packages(package);
        candidate.compatibility.testing_required =
            testing_required(breaking, false, declarations.len() > 1);
        candidate
    }

    fn force_pin(&self, conflict: &ConflictRecord) -> Option<SolutionCandidate> {
        let package = conflict.package.as_str();
        if self.snapshot.is_direct(package) {
            return None;
        }

        let pin = self.pin_version(package)?;
        let lowest = self.current_span(package).map(|(lowest, _)| lowest);
        let breaking = !self.accepted_by_all(package, &pin) && is_major_bump(lowest.as_deref(), &pin);
        let field = self.snapshot.package_manager.override_field();

        let mut candidate = SolutionCandidate::draft(
            stable_id(CandidateKind::ForcePin.as_str(), &[conflict.id.as_str()]),
            CandidateKind::ForcePin,
            Some(conflict.id.clone()),
            format!("Force {} to {} with {}", package, pin, field),
            format!(
                "Add a {} entry so every consumer of {} receives {}",
                field, package, pin
            ),
        );
        candidate.steps.push(
            SolutionStep::new(StepAction::Override, package, manifest_path(""))
                .from_to(lowest, Some(pin.clone()))
                .describe(format!("Set {}[\"{}\"] to {}", field, package, pin)),
        );
        candidate.steps.push(
            SolutionStep::new(
                StepAction::RegenerateLock,
                package,
                self.snapshot.package_manager.lock_file(),
            )
            .describe("Reinstall so the override takes effect"),
        );

        candidate.compatibility.breaking_changes = breaking;
        candidate.compatibility.affected_packages = self.affected_packages(package);
        candidate.compatibility.testing_required = testing_required(breaking, false, false);
        Some(candidate)
    }

    /// Version a force-pin should use
    ///
    /// Explicit target, else the newest published version every consumer
    /// accepts, else latest, else the newest installed, else whatever the
    /// first requirement names.
    fn pin_version(&self, package: &str) -> Option<String> {
        if let Some(target) = self.options.targets.get(package) {
            return Some(target.clone());
        }

        let edges = self.graph.requirements_on(package);
        let constraints: Vec<VersionReq> = edges
            .iter()
            .filter_map(|edge| edge.requirement.parsed())
            .collect();
        let selector = VersionSelector::new(self.registry.versions(package));
        if !constraints.is_empty() {
            if let Some(best) = selector.select_preferred(&constraints) {
                return Some(best.to_string());
            }
        }

        self.registry
            .latest(package)
            .map(str::to_string)
            .or_else(|| {
                self.graph
                    .record(package)
                    .and_then(|record| record.highest())
                    .map(str::to_string)
            })
            .or_else(|| {
                edges
                    .iter()
                    .find_map(|edge| extract_version(&edge.requirement.range))
                    .map(|v| v.to_string())
            })
    }

    fn workspace_unify(&self, conflict: &ConflictRecord) -> Option<SolutionCandidate> {
        let package = conflict.package.as_str();
        let declared: Vec<(&str, &str, &str)> = self
            .graph
            .workspace()
            .iter()
            .filter_map(|member| {
                member.requirement_on(package).map(|req| {
                    (
                        member.member.as_str(),
                        member.relative_path.as_str(),
                        req.range.as_str(),
                    )
                })
            })
            .collect();
        if declared.len() < 2 {
            return None;
        }

        let unified = match self.options.targets.get(package) {
            Some(target) => format!("^{}", target),
            None => highest_range(declared.iter().map(|(_, _, range)| *range))?,
        };

        let mut candidate = SolutionCandidate::draft(
            stable_id(CandidateKind::WorkspaceUnify.as_str(), &[conflict.id.as_str()]),
            CandidateKind::WorkspaceUnify,
            Some(conflict.id.clone()),
            format!("Align {} on {} across workspace members", package, unified),
            format!(
                "Declare {} for {} in every workspace member that depends on it",
                unified, package
            ),
        );

        let mut breaking = false;
        for (member, relative_path, range) in &declared {
            if *range == unified {
                continue;
            }
            let major = is_major_bump(Some(*range), &unified);
            breaking |= major;
            let action = if is_downgrade(range, &unified) {
                StepAction::Downgrade
            } else {
                StepAction::Upgrade
            };
            candidate.steps.push(
                SolutionStep::new(action, package, manifest_path(relative_path))
                    .from_to(Some(range.to_string()), Some(unified.clone()))
                    .manual(major)
                    .describe(format!("Change {} in {} to {}", package, member, unified)),
            );
        }
        if candidate.steps.is_empty() {
            return None;
        }

        let members = candidate.steps.len();
        candidate.compatibility.breaking_changes = breaking;
        candidate.compatibility.affected_packages = declared
            .iter()
            .map(|(member, _, _)| member.to_string())
            .collect();
        candidate.compatibility.testing_required = testing_required(breaking, false, members > 1);
        Some(candidate)
    }

    /// Lowest and highest installed versions, else the first version written
    /// in a declaration for both ends
    fn current_span(&self, package: &str) -> Option<(String, String)> {
        if let Some(record) = self.graph.record(package) {
            let installed: Vec<Version> = record
                .version_strings()
                .iter()
                .filter_map(|v| v.parse().ok())
                .collect();
            if let (Some(lowest), Some(highest)) = (installed.iter().min(), installed.iter().max()) {
                return Some((lowest.to_string(), highest.to_string()));
            }
            if let Some(highest) = record.highest() {
                return Some((highest.to_string(), highest.to_string()));
            }
        }
        self.declarations(package)
            .iter()
            .find_map(|declaration| extract_version(&declaration.range))
            .map(|v| (v.to_string(), v.to_string()))
    }

    /// Whether every readable requirement on the package admits `version`
    fn accepted_by_all(&self, package: &str, version: &str) -> bool {
        let version = match version.parse::<Version>() {
            Ok(version) => version,
            Err(_) => return false,
        };
        let constraints: Vec<VersionReq> = self
            .graph
            .requirements_on(package)
            .iter()
            .filter_map(|edge| edge.requirement.parsed())
            .collect();
        !constraints.is_empty() && constraints.iter().all(|req| req.matches(&version))
    }

    /// Root and member manifests declaring the package
    fn declarations(&self, package: &str) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        if let Some(req) = self
            .snapshot
            .root
            .requirements()
            .into_iter()
            .find(|req| req.name == package)
        {
            declarations.push(Declaration {
                owner: self.snapshot.root.display_name().to_string(),
                artifact: manifest_path(""),
                range: req.range,
            });
        }
        for member in self.graph.workspace() {
            if let Some(req) = member.requirement_on(package) {
                declarations.push(Declaration {
                    owner: member.member.clone(),
                    artifact: manifest_path(&member.relative_path),
                    range: req.range.clone(),
                });
            }
        }
        declarations
    }

    fn affected_packages(&self, package: &str) -> Vec<String> {
        let mut affected = vec![package.to_string()];
        for consumer in self.graph.consumers_of(package) {
            if !affected.contains(&consumer) {
                affected.push(consumer);
            }
        }
        affected
    }
}

/// Fixed test checklist, widened with the blast radius
pub fn testing_required(breaking: bool, graph_wide: bool, multi_member: bool) -> Vec<String> {
    let mut checks = vec!["Run the unit test suite".to_string()];
    if breaking {
        checks.push("Review the changelog for breaking changes".to_string());
        checks.push("Run integration tests for affected consumers".to_string());
    }
    if multi_member {
        checks.push("Build and test every affected workspace member".to_string());
    }
    if graph_wide {
        checks.push("Run the full regression suite".to_string());
        checks.push("Smoke-test the production build".to_string());
    }
    checks
}

fn same_version(a: &str, b: &str) -> bool {
    match (a.parse::<Version>(), b.parse::<Version>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

fn is_downgrade(from: &str, to: &str) -> bool {
    match (extract_version(from), extract_version(to)) {
        (Some(from), Some(to)) => to < from,
        _ => false,
    }
}

/// Range whose first written version is highest (first wins on ties)
fn highest_range<'r>(ranges: impl Iterator<Item = &'r str>) -> Option<String> {
    let mut best: Option<(Version, &str)> = None;
    for range in ranges {
        if let Some(version) = extract_version(range) {
            if best.as_ref().map(|(v, _)| version > *v).unwrap_or(true) {
                best = Some((version, range));
            }
        }
    }
    best.map(|(_, range)| range.to_string())
}

fn verb(action: StepAction) -> &'static str {
    match action {
        StepAction::Add => "Add",
        StepAction::Downgrade => "Downgrade",
        _ => "Upgrade",
    }
}

fn distinct_packages(conflicts: &[ConflictRecord]) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();
    for conflict in conflicts {
        if !packages.contains(&conflict.package) {
            packages.push(conflict.package.clone());
        }
    }
    packages
}
