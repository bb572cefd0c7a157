//! Conflict records emitted by a classification pass.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DependencyKind;
use crate::utils::stable_id;

/// Kind of dependency problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    VersionConflict,
    PeerDependency,
    MultipleVersions,
    WorkspaceMismatch,
    OverrideRisk,
    EngineMismatch,
    Deprecated,
    MissingDependency,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::VersionConflict => "version_conflict",
            ConflictType::PeerDependency => "peer_dependency",
            ConflictType::MultipleVersions => "multiple_versions",
            ConflictType::WorkspaceMismatch => "workspace_mismatch",
            ConflictType::OverrideRisk => "override_risk",
            ConflictType::EngineMismatch => "engine_mismatch",
            ConflictType::Deprecated => "deprecated",
            ConflictType::MissingDependency => "missing_dependency",
        }
    }

    /// Purely informational types get no package-level remediation
    pub fn is_actionable(&self) -> bool {
        !matches!(self, ConflictType::OverrideRisk | ConflictType::EngineMismatch)
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a conflict, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A resolved version and every place it was installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVersionEvidence {
    pub version: String,
    pub locations: Vec<String>,
}

/// Requirement that an override replaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverriddenRequirement {
    pub consumer: String,
    pub range: String,
    /// Whether the forced version still satisfies this range
    pub satisfied: bool,
}

/// Facts backing a conflict record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Evidence {
    ResolvedVersions {
        versions: Vec<ResolvedVersionEvidence>,
    },
    Requirement {
        consumer: String,
        range: String,
        dependency_kind: DependencyKind,
        /// Versions found for the package (empty when absent)
        found: Vec<String>,
    },
    MemberRequirement {
        member: String,
        relative_path: String,
        range: String,
    },
    Override {
        path: String,
        forced_version: String,
        overridden: Vec<OverriddenRequirement>,
    },
    Engine {
        runtime: String,
        current_version: String,
        required_range: String,
    },
    Deprecation {
        version: String,
        message: String,
    },
}

/// One typed problem for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub package: String,
    pub message: String,
    pub evidence: Vec<Evidence>,
    pub affected_locations: Vec<String>,
    pub suggested_action: String,
}

impl ConflictRecord {
    /// Create a record; the id is derived from type and package
    pub fn new(
        conflict_type: ConflictType,
        package: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let package = package.into();
        Self {
            id: stable_id(conflict_type.as_str(), &[&package]),
            conflict_type,
            severity,
            package,
            message: message.into(),
            evidence: Vec::new(),
            affected_locations: Vec::new(),
            suggested_action: String::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.affected_locations = locations;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = action.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(
            [Severity::Info, Severity::Error, Severity::Warning].iter().max(),
            Some(&Severity::Error)
        );
    }

    #[test]
    fn test_record_ids_are_stable() {
        let a = ConflictRecord::new(ConflictType::MultipleVersions, "lodash", Severity::Info, "x");
        let b = ConflictRecord::new(ConflictType::MultipleVersions, "lodash", Severity::Warning, "y");
        let c = ConflictRecord::new(ConflictType::PeerDependency, "lodash", Severity::Info, "x");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert!(a.id.starts_with("multiple_versions-"));
    }

    #[test]
    fn test_record_wire_format() {
        let record = ConflictRecord::new(ConflictType::EngineMismatch, "node", Severity::Error, "too old")
            .with_evidence(vec![Evidence::Engine {
                runtime: "node".to_string(),
                current_version: "16.20.0".to_string(),
                required_range: ">=18".to_string(),
            }])
            .with_action("Upgrade node");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "engine_mismatch");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["suggestedAction"], "Upgrade node");
        assert_eq!(json["evidence"][0]["kind"], "engine");
        assert_eq!(json["evidence"][0]["requiredRange"], ">=18");
    }

    #[test]
    fn test_actionable_types() {
        assert!(ConflictType::MultipleVersions.is_actionable());
        assert!(!ConflictType::OverrideRisk.is_actionable());
        assert!(!ConflictType::EngineMismatch.is_actionable());
    }
}
