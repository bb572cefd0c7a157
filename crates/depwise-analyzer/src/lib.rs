//! # depwise-analyzer
//!
//! Turns a project snapshot plus registry facts into an analysis report.
//!
//! The pipeline has four stages:
//! - `graph`: normalizes the installed tree into a requirement graph and a
//!   flat name -> versions view
//! - `classify`: runs the conflict checks in a fixed order
//! - `solutions`: proposes remediation candidates per conflict and graph-wide
//! - `score`: scores, ranks and compares the candidates
//!
//! `advisor` wires the stages together; `semver` is the range oracle they
//! all consult.

pub mod advisor;
pub mod classify;
pub mod graph;
pub mod score;
pub mod semver;
pub mod solutions;

#[cfg(test)]
mod fixtures;

pub use advisor::{analyze, Advisor};
pub use classify::Classifier;
pub use graph::{FlatDependencyRecord, RequirementGraph};
pub use semver::{is_major_bump, max_satisfying, satisfies, VersionSelector};
pub use solutions::{AdvisorOptions, SolutionGenerator};
