//! # depwise-core
//!
//! Core types and utilities shared across all depwise crates.
//!
//! This crate provides:
//! - Version and VersionReq types implementing the npm range grammar
//! - Snapshot types describing an installed dependency graph
//! - Report types (conflicts, solution candidates, comparisons)
//! - DepwiseError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, ProjectSnapshot, ConflictRecord, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Stable identifiers and path helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{DepwiseError, DepwiseResult};
pub use types::{
    AnalysisReport, ConflictRecord, ConflictType, DependencyKind, ProjectSnapshot, Severity,
    SolutionCandidate, Version, VersionReq, VersionRequirement,
};
