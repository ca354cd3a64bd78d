//! TTL cache of completed analyses

use crate::{AnalysisKind, TrendAnalysis};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use qatrend_common::{iso_timestamp, Result};
use qatrend_config::{CacheSettings, TrendConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default lifetime of a cached analysis
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default entry bound
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Identity of one analysis request: kind, time range and effective config
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    kind: AnalysisKind,
    start: String,
    end: String,
    config: String,
}

impl CacheKey {
    /// Build the key for an analysis request.
    ///
    /// `config` must already have any per-request override merged in.
    pub fn new(
        kind: AnalysisKind,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        config: &TrendConfig,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            start: iso_timestamp(start),
            end: iso_timestamp(end),
            config: serde_json::to_string(config)?,
        })
    }

    /// Analysis kind this key belongs to
    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.kind, self.start, self.end, self.config)
    }
}

/// Cache performance metrics
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheMetrics {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that found nothing
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of entries dropped by explicit clears
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that hit, 0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Snapshot of the cache contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries
    pub size: usize,
    /// Rendered keys of the live entries
    pub keys: Vec<String>,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

/// Analysis cache with a fixed time-to-live.
///
/// Expiry is checked when an entry is read. Only whole-cache clears are
/// supported.
pub struct AnalysisCache {
    cache: Cache<CacheKey, TrendAnalysis>,
    ttl: Duration,
    metrics: Arc<CacheMetrics>,
}

impl AnalysisCache {
    /// Create a cache with the given TTL and entry bound
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            ttl,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Create a cache from configuration
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.ttl(), settings.max_capacity)
    }

    /// Time-to-live of each entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached analysis if present and not expired
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(&self, key: &CacheKey) -> Option<TrendAnalysis> {
        if let Some(analysis) = self.cache.get(key).await {
            debug!("Cache hit");
            self.metrics.record_hit();
            Some(analysis)
        } else {
            debug!("Cache miss");
            self.metrics.record_miss();
            None
        }
    }

    /// Store an analysis, replacing any previous entry for the key
    #[instrument(skip(self, analysis), fields(key = %key))]
    pub async fn put(&self, key: CacheKey, analysis: TrendAnalysis) {
        debug!("Storing analysis");
        self.cache.insert(key, analysis).await;
    }

    /// Drop every entry
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        self.cache.run_pending_tasks().await;
        let entry_count = self.cache.entry_count();

        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;

        self.metrics
            .invalidations
            .fetch_add(entry_count, Ordering::Relaxed);
        info!("Cleared {} cached analyses", entry_count);
    }

    /// Cache metrics
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Current size, keys and counters
    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;

        let mut keys: Vec<String> = self.cache.iter().map(|(key, _)| key.to_string()).collect();
        keys.sort();

        CacheStats {
            size: keys.len(),
            keys,
            hits: self.metrics.hits(),
            misses: self.metrics.misses(),
        }
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrendDirection;
    use chrono::TimeZone;

    fn analysis(slope: f64) -> TrendAnalysis {
        TrendAnalysis {
            trend: TrendDirection::Stable,
            strength: 0.0,
            slope,
            correlation: 0.0,
            seasonality: None,
            anomalies: vec![],
            forecast: vec![],
        }
    }

    fn key(kind: AnalysisKind, config: &TrendConfig) -> CacheKey {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        CacheKey::new(kind, &start, &end, config).unwrap()
    }

    #[test]
    fn test_cache_key_display() {
        let rendered = key(AnalysisKind::ErrorRate, &TrendConfig::default()).to_string();

        assert!(rendered.starts_with(
            "error_rate:2024-01-01T00:00:00.000Z:2024-01-31T23:59:59.000Z:{"
        ));
        assert!(rendered.contains("\"smoothing_window\":7"));
    }

    #[test]
    fn test_cache_key_depends_on_config() {
        let base = TrendConfig::default();
        let wider = TrendConfig {
            smoothing_window: 14,
            ..Default::default()
        };

        assert_eq!(key(AnalysisKind::Quality, &base), key(AnalysisKind::Quality, &base));
        assert_ne!(key(AnalysisKind::Quality, &base), key(AnalysisKind::Quality, &wider));
        assert_ne!(key(AnalysisKind::Quality, &base), key(AnalysisKind::Efficiency, &base));
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = AnalysisCache::default();
        let key = key(AnalysisKind::Quality, &TrendConfig::default());

        assert!(cache.get(&key).await.is_none());

        cache.put(key.clone(), analysis(1.5)).await;
        assert_eq!(cache.get(&key).await, Some(analysis(1.5)));

        cache.put(key.clone(), analysis(2.5)).await;
        assert_eq!(cache.get(&key).await.map(|a| a.slope), Some(2.5));
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = AnalysisCache::default();
        let config = TrendConfig::default();

        cache.put(key(AnalysisKind::Quality, &config), analysis(1.0)).await;
        cache.put(key(AnalysisKind::Engagement, &config), analysis(2.0)).await;
        assert_eq!(cache.stats().await.size, 2);

        cache.clear().await;

        let stats = cache.stats().await;
        assert_eq!(stats.size, 0);
        assert!(stats.keys.is_empty());
        assert!(cache.get(&key(AnalysisKind::Quality, &config)).await.is_none());
        assert_eq!(cache.metrics().invalidations(), 2);
    }

    #[tokio::test]
    async fn test_cache_metrics() {
        let cache = AnalysisCache::default();
        let key = key(AnalysisKind::Quality, &TrendConfig::default());

        cache.get(&key).await;
        cache.put(key.clone(), analysis(0.0)).await;
        cache.get(&key).await;
        cache.get(&key).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.keys, vec![key.to_string()]);
        assert!((cache.metrics().hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = AnalysisCache::new(Duration::from_millis(50), 10);
        let key = key(AnalysisKind::Quality, &TrendConfig::default());

        cache.put(key.clone(), analysis(1.0)).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.stats().await.size, 0);
    }
}
