//! Statement set caching at the boundary layer.
//!
//! The engine itself knows nothing about caching. Boundary code wraps it in a
//! [`CachedGenerator`] backed by any [`StatementCache`]; the default adapter
//! is an in-memory Moka cache.

use chrono::{DateTime, Utc};
use forecast_shared::config::CacheConfig;
use forecast_shared::types::ScenarioId;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::engine::StatementEngine;
use super::error::StatementError;
use super::types::{StatementInputs, StatementSet};

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 100;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache key: a scenario at a given revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Scenario the inputs belong to.
    pub scenario_id: ScenarioId,
    /// Last modification of the scenario's assumptions.
    pub last_modified: DateTime<Utc>,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(scenario_id: ScenarioId, last_modified: DateTime<Utc>) -> Self {
        Self {
            scenario_id,
            last_modified,
        }
    }

    /// Stable string form, for logs and external stores.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}",
            self.scenario_id,
            self.last_modified.timestamp_millis()
        )
    }
}

/// Storage port for generated statement sets.
pub trait StatementCache: Send + Sync {
    /// Returns the cached set for `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<Arc<StatementSet>>;

    /// Stores a set under `key`.
    fn insert(&self, key: CacheKey, set: Arc<StatementSet>);

    /// Removes the entry for `key`.
    fn invalidate(&self, key: &CacheKey);

    /// Removes every entry.
    fn invalidate_all(&self);
}

/// In-memory statement cache with a bounded size and TTL.
#[derive(Clone)]
pub struct MokaStatementCache {
    cache: Cache<CacheKey, Arc<StatementSet>>,
}

impl MokaStatementCache {
    /// Creates a cache with default settings.
    ///
    /// Default: 100 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries to cache
    /// * `ttl_secs` - Time-to-live in seconds for each entry
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance so counts and invalidations settle.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for MokaStatementCache {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&CacheConfig> for MokaStatementCache {
    fn from(config: &CacheConfig) -> Self {
        Self::with_config(config.max_capacity, config.ttl_secs)
    }
}

impl StatementCache for MokaStatementCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<StatementSet>> {
        self.cache.get(key)
    }

    fn insert(&self, key: CacheKey, set: Arc<StatementSet>) {
        self.cache.insert(key, set);
    }

    fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }

    fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

/// Statement engine fronted by a cache.
pub struct CachedGenerator<C> {
    engine: StatementEngine,
    cache: C,
}

impl<C: StatementCache> CachedGenerator<C> {
    /// Wraps `engine` with `cache`.
    pub const fn new(engine: StatementEngine, cache: C) -> Self {
        Self { engine, cache }
    }

    /// Returns the underlying cache.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Generates statements, returning the cached set if one exists.
    ///
    /// Cached results come back with `cached: true`. Errors are not cached.
    pub fn generate(
        &self,
        key: CacheKey,
        inputs: &StatementInputs,
    ) -> Result<StatementSet, StatementError> {
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key.fingerprint(), "Statement cache hit");
            let mut set = (*cached).clone();
            set.cached = true;
            return Ok(set);
        }

        let set = self.engine.generate(inputs)?;
        debug!(key = %key.fingerprint(), passes = set.convergence.passes, "Statement cache miss");
        self.cache.insert(key, Arc::new(set.clone()));

        Ok(set)
    }

    /// Drops the cached set for `key`.
    pub fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }
}
