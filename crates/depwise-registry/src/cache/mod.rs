//! Metadata caching with TTL support

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::api::PackageMetadataResponse;

/// Default time-to-live for cached metadata
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Source of "now" for freshness checks
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached metadata
    pub metadata: PackageMetadataResponse,
    /// When the entry was stored
    pub stored_at: Instant,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create cache entry stored at `now`
    pub fn new(metadata: PackageMetadataResponse, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            metadata,
            stored_at,
            ttl,
        }
    }

    /// Check if cache entry is still fresh at `now`
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.age_at(now) < self.ttl
    }

    /// Age of cache entry at `now`
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }
}

/// In-memory metadata cache with TTL
///
/// Reads are concurrent; writes insert or overwrite. Stale entries are
/// dropped lazily on read or eagerly through [`MetadataCache::cleanup`].
#[derive(Debug)]
pub struct MetadataCache {
    /// Cache storage
    cache: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl MetadataCache {
    /// Create new metadata cache on the system clock with a 5 minute TTL
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a cache driven by the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: DashMap::new(),
            clock,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Change the TTL used by [`MetadataCache::insert`]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get cached metadata if fresh
    pub fn get(&self, package_name: &str) -> Option<PackageMetadataResponse> {
        let now = self.clock.now();
        match self.cache.get(package_name) {
            Some(entry) if entry.is_fresh_at(now) => return Some(entry.metadata.clone()),
            Some(_) => {}
            None => return None,
        }

        // Remove stale entry unless a writer refreshed it meanwhile
        self.cache
            .remove_if(package_name, |_, entry| !entry.is_fresh_at(now));
        None
    }

    /// Store metadata with default TTL
    pub fn insert(&self, package_name: String, metadata: PackageMetadataResponse) {
        self.insert_with_ttl(package_name, metadata, self.default_ttl);
    }

    /// Store metadata with custom TTL
    pub fn insert_with_ttl(
        &self,
        package_name: String,
        metadata: PackageMetadataResponse,
        ttl: Duration,
    ) {
        let entry = CacheEntry::new(metadata, self.clock.now(), ttl);
        self.cache.insert(package_name, entry);
    }

    /// Check if package is cached and fresh
    pub fn contains_fresh(&self, package_name: &str) -> bool {
        let now = self.clock.now();
        self.cache
            .get(package_name)
            .map(|entry| entry.is_fresh_at(now))
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut fresh_count = 0;
        let mut stale_count = 0;

        for entry in self.cache.iter() {
            if entry.is_fresh_at(now) {
                fresh_count += 1;
            } else {
                stale_count += 1;
            }
        }

        CacheStats {
            total_entries: fresh_count + stale_count,
            fresh_entries: fresh_count,
            stale_entries: stale_count,
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove stale entries
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.cache.retain(|_, entry| {
            if entry.is_fresh_at(now) {
                true
            } else {
                removed += 1;
                false
            }
        });
        removed
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries
    pub stale_entries: usize,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}
