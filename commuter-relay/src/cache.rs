//! Caching layer for connection searches.
//!
//! A user scrolling through station pairs on the device tends to come back
//! to the same pair within seconds. Untimed searches are cached for a short
//! TTL keyed by (from, to, language). Timed queries, which back detail
//! requests, always go to the source: their whole point is fresh delay and
//! platform data.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::config::Language;
use crate::gateway::ScheduleSource;
use crate::irail::{ConnectionQuery, ConnectionsResponse, IrailError, StationDto};

/// Cache key for searches: (from id, to id, language).
type SearchKey = (String, String, Language);

/// Cached search entry.
type SearchEntry = Arc<ConnectionsResponse>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl CacheConfig {
    /// A config with the given TTL and the default capacity.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 64,
        }
    }
}

/// Schedule source with search caching.
///
/// Wraps any [`ScheduleSource`] and caches untimed connection searches.
pub struct CachedSource<S> {
    source: S,
    searches: MokaCache<SearchKey, SearchEntry>,
}

impl<S: ScheduleSource> CachedSource<S> {
    /// Create a new caching wrapper.
    pub fn new(source: S, config: &CacheConfig) -> Self {
        let searches = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { source, searches }
    }
}

impl<S: ScheduleSource> ScheduleSource for CachedSource<S> {
    async fn connections(&self, query: &ConnectionQuery) -> Result<ConnectionsResponse, IrailError> {
        if query.at.is_some() {
            return self.source.connections(query).await;
        }

        let key = (query.from.clone(), query.to.clone(), query.lang);

        if let Some(cached) = self.searches.get(&key).await {
            trace!(from = %query.from, to = %query.to, "search cache hit");
            return Ok(cached.as_ref().clone());
        }

        let response = self.source.connections(query).await?;
        self.searches.insert(key, Arc::new(response.clone())).await;

        Ok(response)
    }

    async fn stations(&self, lang: Language) -> Result<Vec<StationDto>, IrailError> {
        self.source.stations(lang).await
    }
}
