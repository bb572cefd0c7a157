//! Dependency requirement types.
//!
//! A requirement is the raw range string a consumer declares for a package,
//! tagged with the manifest section it came from.

use serde::{Deserialize, Serialize};

use super::VersionReq;

/// Type of dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Normal runtime dependency
    Prod,
    /// Development-only dependency
    Dev,
    /// Peer dependency (must be provided by consumer)
    Peer,
    /// Optional dependency (can be missing)
    Optional,
}

/// Declared requirement on a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRequirement {
    pub name: String,
    pub range: String,
    pub kind: DependencyKind,
    /// Only meaningful for peers (`peerDependenciesMeta.<name>.optional`)
    #[serde(default)]
    pub optional: bool,
}

impl VersionRequirement {
    /// Create a new production requirement
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self::with_kind(name, range, DependencyKind::Prod)
    }

    /// Create a requirement of the given kind
    pub fn with_kind(name: impl Into<String>, range: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
            kind,
            optional: false,
        }
    }

    /// Create a peer requirement
    pub fn peer(name: impl Into<String>, range: impl Into<String>, optional: bool) -> Self {
        Self {
            optional,
            ..Self::with_kind(name, range, DependencyKind::Peer)
        }
    }

    /// Parsed range, or `None` when the range is not a semver range
    pub fn parsed(&self) -> Option<VersionReq> {
        VersionReq::parse(&self.range).ok()
    }

    /// Whether an absent package leaves this requirement unmet
    pub fn is_required(&self) -> bool {
        match self.kind {
            DependencyKind::Optional => false,
            DependencyKind::Peer => !self.optional,
            DependencyKind::Prod | DependencyKind::Dev => true,
        }
    }
}

impl DependencyKind {
    /// Check if this dependency is needed at runtime
    pub fn is_runtime(&self) -> bool {
        matches!(self, DependencyKind::Prod | DependencyKind::Optional)
    }

    /// Check if this dependency is only for development
    pub fn is_dev_only(&self) -> bool {
        matches!(self, DependencyKind::Dev)
    }

    /// Check if this dependency must be provided by the consumer
    pub fn is_peer(&self) -> bool {
        matches!(self, DependencyKind::Peer)
    }

    /// Manifest section this kind is declared in
    pub fn section(&self) -> &'static str {
        match self {
            DependencyKind::Prod => "dependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Peer => "peerDependencies",
            DependencyKind::Optional => "optionalDependencies",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_creation() {
        let req = VersionRequirement::new("lodash", "^4.17.0");

        assert_eq!(req.name, "lodash");
        assert_eq!(req.kind, DependencyKind::Prod);
        assert!(!req.optional);
        assert!(req.parsed().is_some());
    }

    #[test]
    fn test_non_semver_requirement() {
        let req = VersionRequirement::new("my-fork", "github:me/my-fork");
        assert!(req.parsed().is_none());
    }

    #[test]
    fn test_required_flag() {
        assert!(VersionRequirement::new("a", "1").is_required());
        assert!(VersionRequirement::with_kind("a", "1", DependencyKind::Dev).is_required());
        assert!(!VersionRequirement::with_kind("a", "1", DependencyKind::Optional).is_required());
        assert!(VersionRequirement::peer("react", "^18", false).is_required());
        assert!(!VersionRequirement::peer("react", "^18", true).is_required());
    }

    #[test]
    fn test_dependency_kinds() {
        assert!(DependencyKind::Prod.is_runtime());
        assert!(!DependencyKind::Prod.is_dev_only());
        assert!(!DependencyKind::Prod.is_peer());

        assert!(!DependencyKind::Dev.is_runtime());
        assert!(DependencyKind::Dev.is_dev_only());

        assert!(!DependencyKind::Peer.is_runtime());
        assert!(DependencyKind::Peer.is_peer());

        assert!(DependencyKind::Optional.is_runtime());
        assert_eq!(DependencyKind::Optional.section(), "optionalDependencies");
    }

    #[test]
    fn test_kind_wire_format() {
        let json = serde_json::to_string(&DependencyKind::Optional).unwrap();
        assert_eq!(json, "\"optional\"");
    }
}
