//! In-memory metadata source for tests.
//!
//! Compiled for this crate's tests and, behind the `test-util` feature, for
//! downstream crates that need a registry without a network.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use depwise_core::error::DepwiseError;

use crate::api::PackageMetadataResponse;
use crate::source::MetadataSource;
use crate::RegistryResult;

/// In-memory source backed by fixed documents
#[derive(Debug, Default)]
pub struct StaticSource {
    packages: HashMap<String, PackageMetadataResponse>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this document under its own name
    pub fn with_package(mut self, metadata: PackageMetadataResponse) -> Self {
        self.packages.insert(metadata.name.clone(), metadata);
        self
    }

    /// Fail every fetch of `name` with a network error
    pub fn with_failure(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataSource for StaticSource {
    fn fetch(
        &self,
        name: &str,
    ) -> impl Future<Output = RegistryResult<PackageMetadataResponse>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing.contains(name) {
            Err(DepwiseError::Network {
                message: format!("connection refused while fetching {}", name),
                source: None,
            })
        } else {
            self.packages
                .get(name)
                .cloned()
                .ok_or_else(|| DepwiseError::PackageNotFound {
                    name: name.to_string(),
                })
        };
        async move { result }
    }
}
