//! Analysis orchestrator
//!
//! Normalizer, classifier, generator and scorer run in that order over one
//! snapshot. [`analyze`] is synchronous and never fails; [`Advisor`] adds the
//! registry prefetch in front of it.

use chrono::Utc;
use tracing::{debug, info};

use depwise_core::types::{AnalysisReport, DecisionContext, ProjectSnapshot, Summary};
use depwise_registry::{CachedRegistry, MetadataSource, RegistryIndex};

use crate::classify::Classifier;
use crate::graph::{package_names, RequirementGraph};
use crate::score::decide;
use crate::solutions::{AdvisorOptions, SolutionGenerator};

/// Run one analysis pass with the registry facts already gathered
pub fn analyze(
    snapshot: &ProjectSnapshot,
    registry: &RegistryIndex,
    options: &AdvisorOptions,
) -> AnalysisReport {
    let graph = RequirementGraph::build(snapshot, registry);
    let conflicts = Classifier::new(snapshot, &graph, registry).classify();

    let generator = SolutionGenerator::new(snapshot, &graph, registry, options);
    let mut decisions = Vec::new();
    for conflict in &conflicts {
        let candidates = generator.for_conflict(conflict);
        if candidates.is_empty() {
            continue;
        }
        debug!(conflict = %conflict.id, candidates = candidates.len(), "Ranking candidates");
        decisions.push(decide(
            DecisionContext::Conflict {
                conflict_id: conflict.id.clone(),
                conflict_type: conflict.conflict_type,
                package: conflict.package.clone(),
            },
            candidates,
        ));
    }

    let global = generator.global(&conflicts);
    if !global.is_empty() {
        decisions.push(decide(DecisionContext::Global, global));
    }

    let mut warnings: Vec<String> = graph.skipped().to_vec();
    if has_no_signal(snapshot, &graph) {
        warnings.push(
            "The snapshot lists no installed packages and no declared dependencies; nothing was analyzed"
                .to_string(),
        );
    }
    if !registry.misses().is_empty() {
        warnings.push(format!(
            "Registry metadata was unavailable for {}; their candidates rely on declared ranges only",
            registry.misses().join(", ")
        ));
    }

    let mut summary = Summary::tally(&conflicts);
    summary.packages_scanned = graph.package_count();
    summary.registry_misses = registry.misses().len();

    info!(
        conflicts = conflicts.len(),
        errors = summary.errors,
        warnings = summary.warnings,
        decisions = decisions.len(),
        "Analysis finished"
    );

    AnalysisReport {
        generated_at: Utc::now(),
        conflicts,
        decisions,
        warnings,
        summary,
    }
}

fn has_no_signal(snapshot: &ProjectSnapshot, graph: &RequirementGraph) -> bool {
    graph.package_count() == 0
        && graph.requirement_count() == 0
        && graph.workspace().iter().all(|member| member.requirements.is_empty())
        && snapshot.overrides.is_empty()
        && snapshot.runtime.is_none()
}

/// Registry-backed advisor
#[derive(Debug)]
pub struct Advisor<S> {
    registry: CachedRegistry<S>,
    options: AdvisorOptions,
}

impl<S: MetadataSource> Advisor<S> {
    pub fn new(registry: CachedRegistry<S>, options: AdvisorOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &AdvisorOptions {
        &self.options
    }

    pub fn registry(&self) -> &CachedRegistry<S> {
        &self.registry
    }

    /// Look up every relevant package, then analyze
    pub async fn analyze(&self, snapshot: &ProjectSnapshot) -> AnalysisReport {
        let names = package_names(snapshot);
        info!(packages = names.len(), "Fetching registry metadata");

        let index = self.registry.lookup_all(names).await;
        analyze(snapshot, &index, &self.options)
    }
}
