//! Core data types used throughout depwise.

mod conflict;
mod dependency;
mod package;
mod solution;
mod version;

pub use conflict::{
    ConflictRecord, ConflictType, Evidence, OverriddenRequirement, ResolvedVersionEvidence,
    Severity,
};
pub use dependency::{DependencyKind, VersionRequirement};
pub use package::{
    overridden_package, strip_selector, InstalledNode, OverrideDirective, OverrideMap,
    PackageManager, PeerMeta, ProjectManifest, ProjectSnapshot, RuntimeFacts, WorkspaceMember,
};
pub use solution::{
    AnalysisReport, CandidateKind, Comparison, ComparisonRow, Compatibility, Decision,
    DecisionContext, Effort, Recommendation, Risk, RiskLevel, SolutionCandidate, SolutionStep,
    StepAction, Strategy, Summary,
};
pub use version::{
    Comparator, ComparatorSet, Op, PartialVersion, Version, VersionError, VersionReq, MAX_COMPONENT,
};
