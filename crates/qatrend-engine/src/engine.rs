//! Cached trend analysis over a record source

use crate::{
    AnalysisCache, AnalysisKind, CacheKey, CacheStats, RecordSource, TimeSeriesBuilder,
    TrendAnalysis, TrendAnalyzer,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use qatrend_common::{QaTrendError, Result};
use qatrend_config::{Config, TrendConfig, TrendConfigOverride};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Entry point for trend analyses.
///
/// Results are cached per (kind, range, effective config) so repeated
/// dashboard requests within the TTL never reach the record source.
pub struct TrendEngine {
    source: Arc<dyn RecordSource>,
    cache: Arc<AnalysisCache>,
    defaults: TrendConfig,
}

impl TrendEngine {
    /// Create an engine with default analysis settings and a fresh cache
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            cache: Arc::new(AnalysisCache::default()),
            defaults: TrendConfig::default(),
        }
    }

    /// Create an engine from application configuration
    pub fn from_config(config: &Config, source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            cache: Arc::new(AnalysisCache::from_settings(&config.cache)),
            defaults: config.analysis.clone(),
        }
    }

    /// Replace the default analysis settings
    pub fn with_defaults(mut self, defaults: TrendConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Share an existing cache
    pub fn with_cache(mut self, cache: Arc<AnalysisCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Analysis settings used when a request overrides nothing
    pub fn defaults(&self) -> &TrendConfig {
        &self.defaults
    }

    /// Cache reference for direct access
    pub fn cache(&self) -> Arc<AnalysisCache> {
        Arc::clone(&self.cache)
    }

    /// Analyze `kind` over `[start, end]`.
    ///
    /// Fields set in `overrides` replace the defaults for this request only.
    /// A cached result is returned when one exists for the same kind, range
    /// and effective settings. Effective settings outside the configured
    /// bounds (for example a horizon over 365 days or a non-positive anomaly
    /// threshold) fail with [`QaTrendError::Validation`] before any fetch.
    /// Fetch failures are logged, wrapped as [`QaTrendError::Fetch`] and not
    /// cached.
    #[instrument(skip(self, overrides), fields(kind = %kind))]
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        overrides: Option<&TrendConfigOverride>,
    ) -> Result<TrendAnalysis> {
        let config = match overrides {
            Some(overrides) => self.defaults.merged(overrides),
            None => self.defaults.clone(),
        };
        config.validate_all().map_err(|e| {
            warn!("Rejected analysis settings: {}", e);
            QaTrendError::validation(format!("Invalid analysis settings: {e}"))
        })?;

        let cache_key = CacheKey::new(kind, &start, &end, &config)?;
        if let Some(analysis) = self.cache.get(&cache_key).await {
            return Ok(analysis);
        }

        let records = self.source.fetch(kind, start, end).await.map_err(|e| {
            error!("Failed to fetch {} records: {}", kind, e);
            QaTrendError::fetch_with_source(format!("Failed to fetch {kind} records"), e)
        })?;

        let series = TimeSeriesBuilder::new(kind.aggregation()).build(&records);
        let analysis = TrendAnalyzer::new(config).analyze(&series);

        info!(
            "Analyzed {} {} records into {} points: {} trend, {} anomalies",
            records.len(),
            kind,
            series.len(),
            analysis.trend,
            analysis.anomalies.len()
        );

        self.cache.put(cache_key, analysis.clone()).await;
        Ok(analysis)
    }

    /// Analyze several kinds concurrently; fails if any analysis fails
    #[instrument(skip(self, kinds, overrides))]
    pub async fn analyze_many(
        &self,
        kinds: &[AnalysisKind],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        overrides: Option<&TrendConfigOverride>,
    ) -> Result<Vec<(AnalysisKind, TrendAnalysis)>> {
        try_join_all(kinds.iter().map(|&kind| async move {
            let analysis = self.analyze(kind, start, end, overrides).await?;
            Ok::<_, QaTrendError>((kind, analysis))
        }))
        .await
    }

    /// Drop every cached analysis
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Cached keys and hit/miss counters
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
