//! # QA Trend Engine
//!
//! Time-series trend analysis for QA platform metrics: daily aggregation of
//! raw records, moving-average smoothing, linear trend estimation, weekly and
//! monthly seasonality detection, residual anomaly detection and forecasting,
//! with a TTL cache in front of the record source.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod analyzer;
pub mod anomaly;
pub mod cache;
pub mod engine;
pub mod forecast;
pub mod http_source;
pub mod records;
pub mod regression;
pub mod seasonality;
pub mod smoothing;
pub mod source;
pub mod stats;
#[allow(missing_docs)]
pub mod types;

pub use aggregator::TimeSeriesBuilder;
pub use analyzer::TrendAnalyzer;
pub use cache::{AnalysisCache, CacheKey, CacheMetrics, CacheStats};
pub use engine::TrendEngine;
pub use http_source::QaPlatformClient;
pub use records::{Aggregation, AnalysisKind, RawRecord};
pub use source::{JsonFileSource, RecordSource};
pub use types::*;

#[cfg(test)]
pub use source::MockRecordSource;
