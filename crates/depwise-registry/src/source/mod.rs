//! Metadata sources and the cached, concurrent lookup front-end

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::api::{PackageMetadataResponse, RegistryIndex};
use crate::cache::MetadataCache;
use crate::client::RegistryClient;
use crate::RegistryResult;

/// Default number of lookups in flight
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Anything that can produce package metadata by name
pub trait MetadataSource: Send + Sync {
    fn fetch(
        &self,
        name: &str,
    ) -> impl Future<Output = RegistryResult<PackageMetadataResponse>> + Send;
}

impl MetadataSource for RegistryClient {
    fn fetch(
        &self,
        name: &str,
    ) -> impl Future<Output = RegistryResult<PackageMetadataResponse>> + Send {
        self.fetch_metadata(name)
    }
}

/// Cache-first registry front-end with bounded concurrent lookups
#[derive(Debug)]
pub struct CachedRegistry<S> {
    source: S,
    cache: Arc<MetadataCache>,
    concurrency: usize,
}

impl<S: MetadataSource> CachedRegistry<S> {
    /// Wrap a source with a fresh 5 minute cache
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Arc::new(MetadataCache::new()))
    }

    /// Wrap a source with a shared cache
    pub fn with_cache(source: S, cache: Arc<MetadataCache>) -> Self {
        Self {
            source,
            cache,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Limit the number of lookups in flight (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cached metadata, or a fetch whose success is cached
    pub async fn lookup(&self, name: &str) -> RegistryResult<PackageMetadataResponse> {
        if let Some(metadata) = self.cache.get(name) {
            debug!(package = name, "Registry cache hit");
            return Ok(metadata);
        }

        let metadata = self.source.fetch(name).await?;
        self.cache.insert(name.to_string(), metadata.clone());
        Ok(metadata)
    }

    /// Look up every distinct name; failures are logged and left out
    pub async fn lookup_all<I, N>(&self, names: I) -> RegistryIndex
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let distinct: BTreeSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        let requested = distinct.len();

        let mut results: Vec<(String, RegistryResult<PackageMetadataResponse>)> =
            stream::iter(distinct)
                .map(|name| async move {
                    let result = self.lookup(&name).await;
                    (name, result)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let mut index = RegistryIndex::new();
        for (name, result) in results {
            match result {
                Ok(metadata) => index.insert(metadata),
                Err(e) => {
                    warn!(package = %name, "Registry lookup failed: {}", e);
                    index.record_miss(name);
                }
            }
        }

        debug!(
            requested,
            found = index.len(),
            misses = index.misses().len(),
            "Registry lookups finished"
        );
        index
    }
}
