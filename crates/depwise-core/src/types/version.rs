//! Semantic version types and the npm range grammar.
//!
//! Provides Version and VersionReq types that follow the semantic versioning
//! specification. Ranges support the syntax found in package manifests:
//! `*`, x-ranges, partial versions, comparison operators, tilde and caret
//! ranges, hyphen ranges, whitespace intersections and `||` unions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Semantic version (major.minor.patch-prerelease+build)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// Version requirement: a union (`||`) of comparator sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    pub sets: Vec<ComparatorSet>,
}

/// Comparators that must all match (`>=1.2.0 <2.0.0`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparatorSet {
    pub comparators: Vec<Comparator>,
}

/// Individual version comparator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: PartialVersion,
}

/// Comparison operator for version requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exact,     // =1.0.0
    Greater,   // >1.0.0
    GreaterEq, // >=1.0.0
    Less,      // <1.0.0
    LessEq,    // <=1.0.0
    Tilde,     // ~1.0.0
    Caret,     // ^1.0.0
    Wildcard,  // *
}

/// Partial version for comparisons (may have missing components)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialVersion {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub prerelease: Option<String>,
}

/// Version parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },

    #[error("Invalid prerelease identifier: {prerelease}")]
    InvalidPrerelease { prerelease: String },

    #[error("Invalid build metadata: {build}")]
    InvalidBuild { build: String },

    #[error("Invalid version range: {input}")]
    InvalidRange { input: String },
}

/// One end of the interval a comparator admits
#[derive(Debug, Clone)]
struct Bound {
    version: Version,
    inclusive: bool,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Check if this version satisfies a version requirement
    pub fn satisfies(&self, req: &VersionReq) -> bool {
        req.matches(self)
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// Get the precedence for comparison (ignores build metadata)
    fn precedence_cmp(&self, other: &Self) -> Ordering {
        match self.triple().cmp(&other.triple()) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less, // prerelease < normal
                (None, Some(_)) => Ordering::Greater, // normal > prerelease
                (Some(a), Some(b)) => compare_prerelease(a, b),
            },
            other => other,
        }
    }
}

/// Compare dot-separated prerelease identifiers; numeric identifiers sort
/// numerically and below alphanumeric ones.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            },
        }
    }
}

/// Largest component npm accepts (`Number.MAX_SAFE_INTEGER`)
pub const MAX_COMPONENT: u64 = (1 << 53) - 1;

fn parse_number(component: &str) -> Result<u64, VersionError> {
    let invalid = || VersionError::InvalidNumber {
        component: component.to_string(),
    };
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match component.parse::<u64>() {
        Ok(number) if number <= MAX_COMPONENT => Ok(number),
        _ => Err(invalid()),
    }
}

fn valid_identifiers(input: &str) -> bool {
    input
        .split('.')
        .all(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

fn split_metadata(input: &str) -> Result<(&str, Option<String>, Option<String>), VersionError> {
    // Split on '+' for build metadata
    let (version_part, build) = match input.split_once('+') {
        Some((v, b)) => {
            if !valid_identifiers(b) {
                return Err(VersionError::InvalidBuild {
                    build: b.to_string(),
                });
            }
            (v, Some(b.to_string()))
        },
        None => (input, None),
    };

    // Split on '-' for prerelease
    let (core_part, prerelease) = match version_part.split_once('-') {
        Some((c, p)) => {
            if !valid_identifiers(p) {
                return Err(VersionError::InvalidPrerelease {
                    prerelease: p.to_string(),
                });
            }
            (c, Some(p.to_string()))
        },
        None => (version_part, None),
    };

    Ok((core_part, prerelease, build))
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let stripped = input.strip_prefix('v').unwrap_or(input);
        let (core_part, prerelease, build) = split_metadata(stripped)?;

        // Parse major.minor.patch
        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        }

        Ok(Version {
            major: parse_number(parts[0])?,
            minor: parse_number(parts[1])?,
            patch: parse_number(parts[2])?,
            prerelease,
            build,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

// Equality follows precedence, so build metadata never distinguishes versions.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.precedence_cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
        self.prerelease.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
    }
}

impl VersionReq {
    /// Requirement that matches every release
    pub fn any() -> Self {
        Self {
            sets: vec![ComparatorSet {
                comparators: vec![Comparator::wildcard()],
            }],
        }
    }

    /// Parse a version requirement string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix("workspace:").unwrap_or(trimmed).trim();

        let sets = trimmed
            .split("||")
            .map(|set| ComparatorSet::parse(set, input))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VersionReq { sets })
    }

    /// Check if a version matches this requirement
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set.matches(version))
    }

    /// Lowest version this requirement admits, if it has a lower bound.
    ///
    /// Exclusive bounds report the bound itself, so the answer is a floor for
    /// reporting, not a guaranteed member of the range.
    pub fn lower_bound(&self) -> Option<Version> {
        self.sets.iter().filter_map(ComparatorSet::lower_bound).min()
    }
}

impl FromStr for VersionReq {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionReq::parse(s)
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.sets.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(" || "))
    }
}

impl ComparatorSet {
    fn parse(input: &str, raw: &str) -> Result<Self, VersionError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();

        if tokens.is_empty() {
            return Ok(ComparatorSet {
                comparators: vec![Comparator::wildcard()],
            });
        }

        // Hyphen range: "1.2.3 - 2.3.4"
        if tokens.len() == 3 && tokens[1] == "-" {
            return Self::parse_hyphen(tokens[0], tokens[2], raw);
        }

        // Operators may be separated from their version: ">= 1.2.3"
        let mut merged: Vec<String> = Vec::new();
        let mut pending: Option<&str> = None;
        for token in tokens {
            if is_bare_operator(token) {
                if pending.is_some() {
                    return Err(VersionError::InvalidRange {
                        input: raw.to_string(),
                    });
                }
                pending = Some(token);
                continue;
            }
            match pending.take() {
                Some(op) => merged.push(format!("{}{}", op, token)),
                None => merged.push(token.to_string()),
            }
        }
        if pending.is_some() {
            return Err(VersionError::InvalidRange {
                input: raw.to_string(),
            });
        }

        let comparators = merged
            .iter()
            .map(|token| Comparator::parse(token, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ComparatorSet { comparators })
    }

    fn parse_hyphen(from: &str, to: &str, raw: &str) -> Result<Self, VersionError> {
        let mut comparators = Vec::new();

        if let Some(lower) = parse_partial(from, raw)? {
            comparators.push(Comparator {
                op: Op::GreaterEq,
                version: lower,
            });
        }

        if let Some(upper) = parse_partial(to, raw)? {
            // A partial upper end admits the whole of its last given component
            comparators.push(Comparator {
                op: Op::LessEq,
                version: upper,
            });
        }

        if comparators.is_empty() {
            comparators.push(Comparator::wildcard());
        }

        Ok(ComparatorSet { comparators })
    }

    /// Check if a version matches every comparator in the set
    pub fn matches(&self, version: &Version) -> bool {
        if !self.comparators.iter().all(|comp| comp.matches(version)) {
            return false;
        }

        // Prereleases only match when a comparator opts into the same release line
        if version.is_prerelease() {
            return self.comparators.iter().any(|comp| {
                comp.version.prerelease.is_some()
                    && comp.version.major == version.major
                    && comp.version.minor == Some(version.minor)
                    && comp.version.patch == Some(version.patch)
            });
        }

        true
    }

    fn lower_bound(&self) -> Option<Version> {
        self.comparators
            .iter()
            .filter_map(|comp| comp.bounds().0.map(|b| b.version))
            .max()
            .or_else(|| Some(Version::new(0, 0, 0)))
    }
}

impl fmt::Display for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.comparators.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

fn is_bare_operator(token: &str) -> bool {
    matches!(token, ">=" | "<=" | ">" | "<" | "=" | "^" | "~" | "~>")
}

fn is_wildcard(component: &str) -> bool {
    matches!(component, "*" | "x" | "X")
}

/// Parse a possibly partial version; `None` means a full wildcard.
fn parse_partial(input: &str, raw: &str) -> Result<Option<PartialVersion>, VersionError> {
    let input = input.trim();
    let input = input.strip_prefix('v').unwrap_or(input);
    if input.is_empty() {
        return Err(VersionError::InvalidRange {
            input: raw.to_string(),
        });
    }

    let (core_part, prerelease, _build) = split_metadata(input)?;

    let mut components: Vec<Option<u64>> = Vec::new();
    for part in core_part.split('.') {
        if is_wildcard(part) {
            components.push(None);
        } else {
            components.push(Some(parse_number(part)?));
        }
    }
    if components.len() > 3 {
        return Err(VersionError::InvalidFormat {
            input: input.to_string(),
        });
    }

    let major = match components[0] {
        Some(major) => major,
        None => return Ok(None),
    };
    let minor = components.get(1).copied().flatten();
    let patch = match minor {
        Some(_) => components.get(2).copied().flatten(),
        None => None,
    };

    if prerelease.is_some() && patch.is_none() {
        return Err(VersionError::InvalidPrerelease {
            prerelease: input.to_string(),
        });
    }

    Ok(Some(PartialVersion {
        major,
        minor,
        patch,
        prerelease,
    }))
}

impl Comparator {
    fn wildcard() -> Self {
        Comparator {
            op: Op::Wildcard,
            version: PartialVersion {
                major: 0,
                minor: None,
                patch: None,
                prerelease: None,
            },
        }
    }

    fn parse(token: &str, raw: &str) -> Result<Self, VersionError> {
        // Parse operator prefix
        let (op, version_str) = if let Some(stripped) = token.strip_prefix(">=") {
            (Op::GreaterEq, stripped)
        } else if let Some(stripped) = token.strip_prefix("<=") {
            (Op::LessEq, stripped)
        } else if let Some(stripped) = token.strip_prefix("~>") {
            (Op::Tilde, stripped)
        } else if let Some(stripped) = token.strip_prefix('>') {
            (Op::Greater, stripped)
        } else if let Some(stripped) = token.strip_prefix('<') {
            (Op::Less, stripped)
        } else if let Some(stripped) = token.strip_prefix('=') {
            (Op::Exact, stripped)
        } else if let Some(stripped) = token.strip_prefix('^') {
            (Op::Caret, stripped)
        } else if let Some(stripped) = token.strip_prefix('~') {
            (Op::Tilde, stripped)
        } else {
            (Op::Exact, token)
        };

        match parse_partial(version_str, raw)? {
            Some(version) => Ok(Comparator { op, version }),
            // "<*" and ">*" admit nothing sensible
            None if matches!(op, Op::Less | Op::Greater) => Err(VersionError::InvalidRange {
                input: raw.to_string(),
            }),
            None => Ok(Comparator::wildcard()),
        }
    }

    /// Check if a version matches this comparator
    pub fn matches(&self, version: &Version) -> bool {
        let (lower, upper) = self.bounds();

        let above = lower.map_or(true, |b| {
            if b.inclusive {
                version >= &b.version
            } else {
                version > &b.version
            }
        });
        let below = upper.map_or(true, |b| {
            if b.inclusive {
                version <= &b.version
            } else {
                version < &b.version
            }
        });

        above && below
    }

    /// Interval admitted by this comparator
    fn bounds(&self) -> (Option<Bound>, Option<Bound>) {
        let floor = self.version.to_version();
        let inclusive = |version: Version| Some(Bound {
            version,
            inclusive: true,
        });
        let exclusive = |version: Version| Some(Bound {
            version,
            inclusive: false,
        });

        match self.op {
            Op::Wildcard => (None, None),
            Op::Exact => match self.version.next_boundary() {
                None => (inclusive(floor.clone()), inclusive(floor)),
                Some(ceiling) => (inclusive(floor), exclusive(ceiling)),
            },
            Op::Greater => match self.version.next_boundary() {
                None => (exclusive(floor), None),
                Some(ceiling) => (inclusive(ceiling), None),
            },
            Op::GreaterEq => (inclusive(floor), None),
            Op::Less => (None, exclusive(floor)),
            Op::LessEq => match self.version.next_boundary() {
                None => (None, inclusive(floor)),
                Some(ceiling) => (None, exclusive(ceiling)),
            },
            Op::Tilde => (inclusive(floor), exclusive(self.version.tilde_ceiling())),
            Op::Caret => (inclusive(floor), exclusive(self.version.caret_ceiling())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Op::Wildcard => return write!(f, "*"),
            Op::Exact => "",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Tilde => "~",
            Op::Caret => "^",
        };
        write!(f, "{}{}", op, self.version)
    }
}

impl PartialVersion {
    /// Convert to a full version (filling missing parts with 0)
    pub fn to_version(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            prerelease: self.prerelease.clone(),
            build: None,
        }
    }

    /// First release past the last specified component, or `None` when the
    /// version is complete (`1.2` -> `1.3.0`, `1` -> `2.0.0`)
    fn next_boundary(&self) -> Option<Version> {
        match (self.minor, self.patch) {
            (Some(_), Some(_)) => None,
            (Some(minor), None) => Some(Version::new(self.major, minor.saturating_add(1), 0)),
            (None, _) => Some(Version::new(self.major.saturating_add(1), 0, 0)),
        }
    }

    /// ~1.2.3 allows >=1.2.3 <1.3.0; ~1 allows <2.0.0
    fn tilde_ceiling(&self) -> Version {
        match self.minor {
            Some(minor) => Version::new(self.major, minor.saturating_add(1), 0),
            None => Version::new(self.major.saturating_add(1), 0, 0),
        }
    }

    /// ^1.2.3 allows <2.0.0, ^0.2.3 allows <0.3.0, ^0.0.3 allows <0.0.4
    fn caret_ceiling(&self) -> Version {
        if self.major > 0 {
            return Version::new(self.major.saturating_add(1), 0, 0);
        }
        match (self.minor, self.patch) {
            (None, _) => Version::new(1, 0, 0),
            (Some(minor), _) if minor > 0 => Version::new(0, minor.saturating_add(1), 0),
            (Some(_), None) => Version::new(0, 1, 0),
            (Some(_), Some(patch)) => Version::new(0, 0, patch.saturating_add(1)),
        }
    }
}

impl fmt::Display for PartialVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(input: &str) -> Version {
        Version::from_str(input).unwrap()
    }

    fn req(input: &str) -> VersionReq {
        VersionReq::parse(input).unwrap()
    }

    #[test]
    fn test_rejects_components_beyond_safe_integer() {
        assert!(Version::from_str("9007199254740991.0.0").is_ok());
        assert!(matches!(
            Version::from_str("9007199254740992.0.0"),
            Err(VersionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Version::from_str("18446744073709551615.0.0"),
            Err(VersionError::InvalidNumber { .. })
        ));
        assert!(VersionReq::parse("^18446744073709551615").is_err());
        assert!(VersionReq::parse("~1.18446744073709551615").is_err());
        assert!(VersionReq::parse("0.0.99999999999999999999").is_err());

        // The largest accepted components still get a ceiling
        let top = req("^9007199254740991");
        assert!(top.matches(&v("9007199254740991.5.0")));
        assert!(!top.matches(&v("1.0.0")));
    }

    #[test]
    fn test_version_parsing() {
        let v = Version::from_str("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.prerelease, None);
        assert_eq!(v.build, None);
    }

    #[test]
    fn test_version_with_prerelease_and_build() {
        let v = Version::from_str("v1.2.3-alpha.1+build.1").unwrap();
        assert_eq!(v.prerelease, Some("alpha.1".to_string()));
        assert_eq!(v.build, Some("build.1".to_string()));
        assert_eq!(v.to_string(), "1.2.3-alpha.1+build.1");
    }

    #[test]
    fn test_invalid_versions() {
        assert!(Version::from_str("1.2").is_err());
        assert!(Version::from_str("1.2.x").is_err());
        assert!(Version::from_str("latest").is_err());
        assert!(Version::from_str("1.2.3-").is_err());
        assert!(Version::from_str("1..3").is_err());
    }

    #[test]
    fn test_version_comparison() {
        assert!(v("1.0.0") < v("2.0.0"));
        assert!(v("1.0.0") < v("1.1.0"));
        assert!(v("1.1.0") < v("2.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-alpha.1"));
        assert!(v("1.0.0-alpha.2") < v("1.0.0-alpha.10"));
        assert!(v("1.0.0-alpha.10") < v("1.0.0-beta"));
        assert_eq!(v("1.0.0+a"), v("1.0.0+b"));
    }

    #[test]
    fn test_version_serde_as_string() {
        let json = serde_json::to_string(&v("2.1.0-rc.1")).unwrap();
        assert_eq!(json, "\"2.1.0-rc.1\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("2.1.0-rc.1"));
        assert!(serde_json::from_str::<Version>("\"not-a-version\"").is_err());
    }

    #[test]
    fn test_version_req_exact_and_wildcard() {
        assert!(req("1.2.3").matches(&v("1.2.3")));
        assert!(!req("1.2.3").matches(&v("1.2.4")));
        assert!(req("*").matches(&v("999.999.999")));
        assert!(req("").matches(&v("0.0.1")));
        assert!(req("x").matches(&v("3.0.0")));
    }

    #[test]
    fn test_version_req_caret() {
        let caret = req("^1.2.3");
        assert!(caret.matches(&v("1.2.3")));
        assert!(caret.matches(&v("1.3.0")));
        assert!(!caret.matches(&v("2.0.0")));
        assert!(!caret.matches(&v("1.2.2")));

        assert!(req("^0.2.3").matches(&v("0.2.9")));
        assert!(!req("^0.2.3").matches(&v("0.3.0")));
        assert!(req("^0.0.3").matches(&v("0.0.3")));
        assert!(!req("^0.0.3").matches(&v("0.0.4")));
        assert!(req("^4").matches(&v("4.17.21")));
        assert!(!req("^4").matches(&v("5.0.0")));
    }

    #[test]
    fn test_version_req_tilde_and_x_ranges() {
        assert!(req("~1.2.3").matches(&v("1.2.9")));
        assert!(!req("~1.2.3").matches(&v("1.3.0")));
        assert!(req("~1").matches(&v("1.9.0")));
        assert!(req("1.x").matches(&v("1.4.0")));
        assert!(!req("1.x").matches(&v("2.0.0")));
        assert!(req("1.2.*").matches(&v("1.2.7")));
    }

    #[test]
    fn test_version_req_operators() {
        assert!(!req(">1.2.3").matches(&v("1.2.3")));
        assert!(req(">1.2.3").matches(&v("1.2.4")));
        assert!(req(">=1.2.3").matches(&v("1.2.3")));
        assert!(req("<1.2.4").matches(&v("1.2.3")));
        assert!(!req("<1.2.4").matches(&v("1.3.0")));
        assert!(req("<=1.2").matches(&v("1.2.9")));
        assert!(!req(">1.2").matches(&v("1.2.9")));
        assert!(req(">= 18").matches(&v("18.0.0")));
    }

    #[test]
    fn test_version_req_intersections_and_unions() {
        let range = req(">=1.2.0 <2.0.0");
        assert!(range.matches(&v("1.5.0")));
        assert!(!range.matches(&v("2.0.0")));

        let union = req("^16.8.0 || ^17.0.0 || ^18.0.0");
        assert!(union.matches(&v("17.0.2")));
        assert!(union.matches(&v("18.2.0")));
        assert!(!union.matches(&v("15.0.0")));
    }

    #[test]
    fn test_version_req_hyphen() {
        let range = req("1.2.3 - 2.3.4");
        assert!(range.matches(&v("1.2.3")));
        assert!(range.matches(&v("2.3.4")));
        assert!(!range.matches(&v("2.3.5")));

        let partial = req("1.2 - 2.3");
        assert!(partial.matches(&v("2.3.9")));
        assert!(!partial.matches(&v("2.4.0")));
    }

    #[test]
    fn test_prerelease_matching() {
        assert!(!req("^1.2.3").matches(&v("1.3.0-beta.1")));
        assert!(!req("^1.2.3").matches(&v("2.0.0-alpha")));
        assert!(req("^1.2.3-beta.1").matches(&v("1.2.3-beta.2")));
        assert!(!req("^1.2.3-beta.1").matches(&v("1.2.4-beta.1")));
        assert!(req(">=2.0.0-alpha").matches(&v("2.0.0-beta.1")));
    }

    #[test]
    fn test_workspace_protocol() {
        assert!(req("workspace:*").matches(&v("0.0.1")));
        assert!(req("workspace:^1.0.0").matches(&v("1.4.0")));
    }

    #[test]
    fn test_malformed_ranges() {
        for input in ["latest", "github:user/repo", "file:../pkg", ">=", "^1.2.3.4", "1.2.3-"] {
            assert!(VersionReq::parse(input).is_err(), "{} should not parse", input);
        }
    }

    #[test]
    fn test_lower_bound() {
        assert_eq!(req("^4.17.0").lower_bound(), Some(v("4.17.0")));
        assert_eq!(req(">=1.2.0 <2.0.0").lower_bound(), Some(v("1.2.0")));
        assert_eq!(req("^2.0.0 || ^1.5.0").lower_bound(), Some(v("1.5.0")));
        assert_eq!(req("<3.0.0").lower_bound(), Some(v("0.0.0")));
    }

    #[test]
    fn test_display() {
        assert_eq!(req(">= 1.2.0  <2").to_string(), ">=1.2.0 <2");
        assert_eq!(req("^1 || ~2.1").to_string(), "^1 || ~2.1");
        assert_eq!(req("*").to_string(), "*");
    }
}
