//! Risk/effort scorer and ranker
//!
//! Scores are fixed per candidate kind. Ranking is a stable sort on score
//! (descending), then effort, then risk (both ascending), so candidates that
//! tie on all three keep their generation order.

use std::cmp::Ordering;

use depwise_core::types::{
    CandidateKind, Comparison, ComparisonRow, Decision, DecisionContext, Effort, Recommendation,
    Risk, RiskLevel, SolutionCandidate,
};

/// Base score for a candidate kind
pub fn base_score(kind: CandidateKind, breaking: bool) -> u8 {
    match kind {
        CandidateKind::UpgradeToLatest if breaking => 60,
        CandidateKind::UpgradeToLatest => 90,
        CandidateKind::UpgradeToTarget => 75,
        CandidateKind::ForcePin => 65,
        CandidateKind::WorkspaceUnify => 85,
        CandidateKind::Dedupe => 95,
        CandidateKind::RegenerateLock => 70,
        CandidateKind::UpdateAll => 40,
    }
}

pub fn risk_level(kind: CandidateKind, breaking: bool) -> RiskLevel {
    match kind {
        CandidateKind::UpdateAll => RiskLevel::High,
        _ if breaking => RiskLevel::High,
        CandidateKind::Dedupe | CandidateKind::RegenerateLock | CandidateKind::ForcePin => {
            RiskLevel::Medium
        }
        _ => RiskLevel::Low,
    }
}

pub fn effort(kind: CandidateKind, breaking: bool) -> Effort {
    match kind {
        CandidateKind::UpgradeToLatest | CandidateKind::UpgradeToTarget if breaking => Effort::Minor,
        CandidateKind::UpgradeToLatest | CandidateKind::UpgradeToTarget => Effort::Trivial,
        CandidateKind::ForcePin => Effort::Minor,
        CandidateKind::WorkspaceUnify | CandidateKind::Dedupe | CandidateKind::RegenerateLock => {
            Effort::Moderate
        }
        CandidateKind::UpdateAll => Effort::Major,
    }
}

/// Fill in risk, effort and recommendation
pub fn score(mut candidate: SolutionCandidate) -> SolutionCandidate {
    let kind = candidate.kind;
    let breaking = candidate.is_breaking();
    let level = risk_level(kind, breaking);

    let mut factors = Vec::new();
    let mut mitigations = Vec::new();
    if breaking {
        factors.push("Crosses a major version".to_string());
        mitigations.push("Read the migration guide before applying".to_string());
    }
    if kind.is_graph_wide() {
        factors.push("Touches the whole dependency graph".to_string());
        mitigations.push("Commit the current lock artifact so the change can be reverted".to_string());
    }
    if kind == CandidateKind::ForcePin {
        factors.push("Overrides the ranges consumers declared".to_string());
        mitigations.push("Remove the override once consumers catch up".to_string());
    }
    if candidate.steps.iter().any(|step| step.requires_manual) {
        factors.push("Includes steps that need manual review".to_string());
    }
    if factors.is_empty() {
        factors.push("Single non-breaking change".to_string());
    }

    candidate.risk = Risk {
        level,
        factors,
        mitigations,
    };
    candidate.estimated_effort = effort(kind, breaking);
    candidate.recommendation = Recommendation {
        score: base_score(kind, breaking),
        reasons: reasons(kind, breaking),
    };
    candidate
}

fn reasons(kind: CandidateKind, breaking: bool) -> Vec<String> {
    let reason = match kind {
        CandidateKind::UpgradeToLatest if breaking => "Reaches latest, at the cost of a major bump",
        CandidateKind::UpgradeToLatest => "Reaches latest without crossing a major version",
        CandidateKind::UpgradeToTarget => "Uses the version you asked for",
        CandidateKind::ForcePin => "Fixes a transitive package without waiting for its consumers",
        CandidateKind::WorkspaceUnify => "Leaves one range for the package across the workspace",
        CandidateKind::Dedupe => "Removes duplicate installs without changing declared ranges",
        CandidateKind::RegenerateLock => "Re-resolves every range from scratch",
        CandidateKind::UpdateAll => "Moves every direct dependency forward at once",
    };
    vec![reason.to_string()]
}

/// Ranking order: score desc, effort asc, risk asc
fn rank_order(a: &SolutionCandidate, b: &SolutionCandidate) -> Ordering {
    b.recommendation
        .score
        .cmp(&a.recommendation.score)
        .then_with(|| a.estimated_effort.cmp(&b.estimated_effort))
        .then_with(|| a.risk.level.cmp(&b.risk.level))
}

/// Stable ranking of scored candidates
pub fn rank(mut candidates: Vec<SolutionCandidate>) -> Vec<SolutionCandidate> {
    candidates.sort_by(rank_order);
    candidates
}

/// Comparison summary of ranked candidates
pub fn compare(ranked: &[SolutionCandidate]) -> Comparison {
    let matrix = ranked
        .iter()
        .map(|candidate| ComparisonRow {
            id: candidate.id.clone(),
            title: candidate.title.clone(),
            risk_ordinal: candidate.risk.level.ordinal(),
            effort_ordinal: candidate.estimated_effort.ordinal(),
            score: candidate.recommendation.score,
        })
        .collect();

    let reason = match ranked {
        [] => "No candidates were proposed".to_string(),
        [only] => format!("{} is the only candidate", only.title),
        [top, runner_up, ..] => {
            let mut reason = format!(
                "{} has the highest score ({})",
                top.title, top.recommendation.score
            );
            if top.recommendation.score == runner_up.recommendation.score {
                let tie = match rank_order(top, runner_up) {
                    Ordering::Less if top.estimated_effort != runner_up.estimated_effort => {
                        "lower effort"
                    }
                    Ordering::Less => "lower risk",
                    _ => "earlier proposal",
                };
                reason.push_str(&format!(
                    "; tied with {} and preferred for {}",
                    runner_up.title, tie
                ));
            }
            reason
        }
    };

    Comparison {
        matrix,
        recommended_id: ranked.first().map(|candidate| candidate.id.clone()),
        reason,
    }
}

/// Score, rank and compare the candidates of one context
pub fn decide(context: DecisionContext, candidates: Vec<SolutionCandidate>) -> Decision {
    let ranked = rank(candidates.into_iter().map(score).collect());
    let comparison = compare(&ranked);
    Decision {
        context,
        candidates: ranked,
        comparison,
    }
}
