//! npm registry collaborator for depwise
//!
//! This crate fetches package metadata (dist-tags, versions, peer requirements,
//! engines, deprecation notices) from an npm-compatible registry, caches it with
//! a time-to-live and exposes bounded concurrent lookups to the analyzer.
//! A failed lookup is never fatal: the package is simply absent from the index.

pub mod api;
pub mod cache;
pub mod client;
pub mod source;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types
pub use api::{PackageMetadataResponse, RegistryIndex, VersionMetadata};
pub use cache::{CacheEntry, CacheStats, Clock, ManualClock, MetadataCache, SystemClock};
pub use client::{AuthConfig, RegistryClient, RetryConfig};
pub use source::{CachedRegistry, MetadataSource};
#[cfg(any(test, feature = "test-util"))]
pub use testing::StaticSource;

use depwise_core::error::DepwiseError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, DepwiseError>;

/// Public npm registry
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
