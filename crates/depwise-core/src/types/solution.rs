//! Remediation candidates, ranked decisions and the analysis report.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConflictRecord, ConflictType, Severity};
use crate::error::DepwiseError;

/// How far the advisor may go when proposing changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Conservative,
    #[default]
    Balanced,
    /// Allows major upgrades and graph-wide update-all
    Aggressive,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Conservative => "conservative",
            Strategy::Balanced => "balanced",
            Strategy::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = DepwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Strategy::Conservative),
            "balanced" => Ok(Strategy::Balanced),
            "aggressive" => Ok(Strategy::Aggressive),
            other => Err(DepwiseError::ConfigValidation {
                field: "strategy".to_string(),
                reason: format!(
                    "'{}' is not one of conservative, balanced, aggressive",
                    other
                ),
            }),
        }
    }
}

/// Risk of applying a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// 1 (low) to 3 (high)
    pub fn ordinal(&self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
        }
    }
}

/// Work needed to apply a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Trivial,
    Minor,
    Moderate,
    Major,
}

impl Effort {
    /// 1 (trivial) to 4 (major)
    pub fn ordinal(&self) -> u8 {
        match self {
            Effort::Trivial => 1,
            Effort::Minor => 2,
            Effort::Moderate => 3,
            Effort::Major => 4,
        }
    }
}

/// What a single step does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Upgrade,
    Downgrade,
    Add,
    Remove,
    Override,
    Dedupe,
    RegenerateLock,
}

/// Which remediation a candidate represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    UpgradeToLatest,
    UpgradeToTarget,
    ForcePin,
    WorkspaceUnify,
    Dedupe,
    RegenerateLock,
    UpdateAll,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::UpgradeToLatest => "upgrade_to_latest",
            CandidateKind::UpgradeToTarget => "upgrade_to_target",
            CandidateKind::ForcePin => "force_pin",
            CandidateKind::WorkspaceUnify => "workspace_unify",
            CandidateKind::Dedupe => "dedupe",
            CandidateKind::RegenerateLock => "regenerate_lock",
            CandidateKind::UpdateAll => "update_all",
        }
    }

    /// Whether the candidate mutates the whole graph rather than one package
    pub fn is_graph_wide(&self) -> bool {
        matches!(
            self,
            CandidateKind::Dedupe | CandidateKind::RegenerateLock | CandidateKind::UpdateAll
        )
    }
}

/// Atomic proposed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionStep {
    pub action: StepAction,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Artifact the step edits (manifest path or lock file)
    pub artifact: String,
    pub requires_manual: bool,
    pub description: String,
}

impl SolutionStep {
    pub fn new(action: StepAction, target: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            from: None,
            to: None,
            artifact: artifact.into(),
            requires_manual: false,
            description: String::new(),
        }
    }

    pub fn from_to(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn manual(mut self, requires_manual: bool) -> Self {
        self.requires_manual = requires_manual;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub mitigations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    pub breaking_changes: bool,
    pub affected_packages: Vec<String>,
    pub testing_required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// 0-100
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Remediation candidate
///
/// The generator fills the identity, steps and compatibility; risk, effort and
/// recommendation stay at their neutral values until the scorer runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionCandidate {
    pub id: String,
    pub kind: CandidateKind,
    /// Conflict id, or `None` for graph-wide candidates
    pub for_issue: Option<String>,
    pub title: String,
    pub description: String,
    pub steps: Vec<SolutionStep>,
    pub risk: Risk,
    pub compatibility: Compatibility,
    pub recommendation: Recommendation,
    pub estimated_effort: Effort,
}

impl SolutionCandidate {
    /// Unscored candidate
    pub fn draft(
        id: String,
        kind: CandidateKind,
        for_issue: Option<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            for_issue,
            title: title.into(),
            description: description.into(),
            steps: Vec::new(),
            risk: Risk {
                level: RiskLevel::Low,
                factors: Vec::new(),
                mitigations: Vec::new(),
            },
            compatibility: Compatibility {
                breaking_changes: false,
                affected_packages: Vec::new(),
                testing_required: Vec::new(),
            },
            recommendation: Recommendation {
                score: 0,
                reasons: Vec::new(),
            },
            estimated_effort: Effort::Trivial,
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.compatibility.breaking_changes
    }
}

/// Scope that a set of candidates competes in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DecisionContext {
    Conflict {
        conflict_id: String,
        conflict_type: ConflictType,
        package: String,
    },
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub id: String,
    pub title: String,
    pub risk_ordinal: u8,
    pub effort_ordinal: u8,
    pub score: u8,
}

/// Side-by-side view of ranked candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub matrix: Vec<ComparisonRow>,
    pub recommended_id: Option<String>,
    pub reason: String,
}

/// Ranked candidates for one context; the first candidate is recommended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub context: DecisionContext,
    pub candidates: Vec<SolutionCandidate>,
    pub comparison: Comparison,
}

impl Decision {
    pub fn recommended(&self) -> Option<&SolutionCandidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub packages_scanned: usize,
    /// Packages whose registry metadata was unavailable
    pub registry_misses: usize,
}

impl Summary {
    pub fn tally(conflicts: &[ConflictRecord]) -> Self {
        let count = |severity: Severity| conflicts.iter().filter(|c| c.severity == severity).count();
        Self {
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            ..Self::default()
        }
    }
}

/// Full result of one analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub conflicts: Vec<ConflictRecord>,
    pub decisions: Vec<Decision>,
    pub warnings: Vec<String>,
    pub summary: Summary,
}

impl AnalysisReport {
    /// Every candidate across all decisions
    pub fn candidates(&self) -> impl Iterator<Item = &SolutionCandidate> {
        self.decisions.iter().flat_map(|d| d.candidates.iter())
    }

    /// Conflicts of one type
    pub fn conflicts_of(&self, conflict_type: ConflictType) -> impl Iterator<Item = &ConflictRecord> {
        self.conflicts
            .iter()
            .filter(move |c| c.conflict_type == conflict_type)
    }

    /// Decision for a conflict id
    pub fn decision_for(&self, conflict_id: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| match &d.context {
            DecisionContext::Conflict { conflict_id: id, .. } => id == conflict_id,
            DecisionContext::Global => false,
        })
    }

    /// Graph-wide decision, if any candidates were proposed
    pub fn global_decision(&self) -> Option<&Decision> {
        self.decisions
            .iter()
            .find(|d| d.context == DecisionContext::Global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals() {
        assert_eq!(RiskLevel::Low.ordinal(), 1);
        assert_eq!(RiskLevel::High.ordinal(), 3);
        assert_eq!(Effort::Trivial.ordinal(), 1);
        assert_eq!(Effort::Major.ordinal(), 4);
        assert!(Effort::Minor < Effort::Moderate);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Aggressive".parse::<Strategy>().unwrap(), Strategy::Aggressive);
        assert_eq!(Strategy::default(), Strategy::Balanced);
        assert!("reckless".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_step_wire_format() {
        let step = SolutionStep::new(StepAction::RegenerateLock, "*", "package-lock.json")
            .describe("Regenerate the lock file");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "regenerate_lock");
        assert_eq!(json["requiresManual"], false);
        assert!(json.get("from").is_none());
    }

    #[test]
    fn test_summary_tally() {
        let conflicts = vec![
            ConflictRecord::new(ConflictType::EngineMismatch, "node", Severity::Error, ""),
            ConflictRecord::new(ConflictType::MultipleVersions, "a", Severity::Info, ""),
            ConflictRecord::new(ConflictType::MultipleVersions, "b", Severity::Warning, ""),
            ConflictRecord::new(ConflictType::OverrideRisk, "c", Severity::Info, ""),
        ];
        let summary = Summary::tally(&conflicts);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.infos, 2);
    }

    #[test]
    fn test_decision_context_wire_format() {
        let ctx = DecisionContext::Conflict {
            conflict_id: "multiple_versions-abc".to_string(),
            conflict_type: ConflictType::MultipleVersions,
            package: "lodash".to_string(),
        };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["scope"], "conflict");
        assert_eq!(json["conflictId"], "multiple_versions-abc");

        let json = serde_json::to_value(DecisionContext::Global).unwrap();
        assert_eq!(json["scope"], "global");
    }
}
