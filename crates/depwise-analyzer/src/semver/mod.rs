//! Version range oracle
//!
//! String-level answers about versions and ranges for the classifier and the
//! solution generator. Every function here fails closed: malformed input
//! yields `false` or `None`, never an error.

use std::collections::BTreeSet;

use depwise_core::types::{Version, VersionReq, MAX_COMPONENT};

/// Whether `version` satisfies `range` (false when either is malformed)
pub fn satisfies(version: &str, range: &str) -> bool {
    match (version.parse::<Version>(), VersionReq::parse(range)) {
        (Ok(version), Ok(req)) => req.matches(&version),
        _ => false,
    }
}

/// Greatest version satisfying `range`; malformed versions are ignored
pub fn max_satisfying<I, V>(versions: I, range: &str) -> Option<Version>
where
    I: IntoIterator<Item = V>,
    V: AsRef<str>,
{
    let req = VersionReq::parse(range).ok()?;
    versions
        .into_iter()
        .filter_map(|v| v.as_ref().parse::<Version>().ok())
        .filter(|v| req.matches(v))
        .max()
}

/// Whether moving from `from` to `to` crosses a major version.
///
/// Both sides may be exact versions or ranges; a range contributes the first
/// version written in it. An absent or unreadable `from` is never a bump.
pub fn is_major_bump(from: Option<&str>, to: &str) -> bool {
    let from = match from.and_then(extract_version) {
        Some(v) => v,
        None => return false,
    };
    match extract_version(to) {
        Some(to) => to.major > from.major,
        None => false,
    }
}

/// First version written in a requirement string (`^4.17` -> `4.17.0`).
///
/// Syntactic fallback used when registry facts are missing.
pub fn extract_version(spec: &str) -> Option<Version> {
    let start = spec.find(|c: char| c.is_ascii_digit())?;
    let token = spec[start..]
        .split(|c: char| c.is_whitespace() || c == '|' || c == ',')
        .next()?;

    if let Ok(version) = token.parse::<Version>() {
        return Some(version);
    }

    let mut parts = token
        .split('.')
        .map(|part| part.parse::<u64>().ok().filter(|n| *n <= MAX_COMPONENT));
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Leading integer of a version-ish string, `v` prefix tolerated
fn leading_major(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Engine check against the runtime's major version.
///
/// Only `>=N` ranges are compared, and only their leading integer; upper
/// bounds are ignored. Any other range, or an unreadable runtime version,
/// counts as satisfied.
pub fn engine_allows(range: &str, runtime_version: &str) -> bool {
    let required = match range.trim().strip_prefix(">=") {
        Some(rest) => leading_major(rest),
        None => return true,
    };
    match (required, leading_major(runtime_version)) {
        (Some(required), Some(current)) => current >= required,
        _ => true,
    }
}

/// Version selector for finding best matching versions
#[derive(Debug, Clone, Default)]
pub struct VersionSelector {
    /// Available versions in ascending order
    available_versions: BTreeSet<Version>,
}

impl VersionSelector {
    /// Create new version selector with available versions
    pub fn new(versions: impl IntoIterator<Item = Version>) -> Self {
        Self {
            available_versions: versions.into_iter().collect(),
        }
    }

    /// Select highest version matching all constraints
    pub fn select_best(&self, constraints: &[VersionReq]) -> Option<Version> {
        self.available_versions
            .iter()
            .rev()
            .find(|version| constraints.iter().all(|req| req.matches(version)))
            .cloned()
    }

    /// Select highest stable version (no prerelease) matching constraints
    pub fn select_best_stable(&self, constraints: &[VersionReq]) -> Option<Version> {
        self.available_versions
            .iter()
            .rev()
            .filter(|version| !version.is_prerelease())
            .find(|version| constraints.iter().all(|req| req.matches(version)))
            .cloned()
    }

    /// Stable versions first, prereleases only when nothing stable fits
    pub fn select_preferred(&self, constraints: &[VersionReq]) -> Option<Version> {
        self.select_best_stable(constraints)
            .or_else(|| self.select_best(constraints))
    }

    /// Get the highest available version
    pub fn highest_version(&self) -> Option<&Version> {
        self.available_versions.iter().next_back()
    }

    pub fn is_empty(&self) -> bool {
        self.available_versions.is_empty()
    }
}
