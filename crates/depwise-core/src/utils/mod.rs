//! Utility functions and helpers.
//!
//! Common functionality used across multiple depwise crates.

pub mod hash;
pub mod path;

// Re-export commonly used utilities
pub use hash::{blake3_hash, stable_id};
pub use path::{manifest_path, normalize_relative};
