//! depwise benchmarking suite
//!
//! Benchmarks for the range oracle and the full analysis pipeline, plus the
//! synthetic projects they run against.

pub mod common;

pub use common::*;
