//! Trend analysis data model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One aggregated observation, or one forecast point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TrendPoint {
    /// An observed point
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            predicted: None,
            confidence: None,
        }
    }

    /// A forecast point carrying its confidence
    pub fn predicted(date: NaiveDate, value: f64, confidence: f64) -> Self {
        Self {
            date,
            value,
            predicted: Some(true),
            confidence: Some(confidence),
        }
    }
}

/// Ordinary least squares fit of value against index
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Goodness of fit (R²) clamped to `[0, 1]`
    pub correlation: f64,
}

/// Direction of trend movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Candidate seasonal periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalPeriod {
    Weekly,
    Monthly,
}

impl SeasonalPeriod {
    /// Period length in days
    pub fn length(self) -> usize {
        match self {
            SeasonalPeriod::Weekly => 7,
            SeasonalPeriod::Monthly => 30,
        }
    }
}

/// Detected seasonal component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalPattern {
    pub period: SeasonalPeriod,
    /// Largest absolute deviation from the series mean
    pub amplitude: f64,
    /// Always 0; the sinusoid starts at the first forecast day
    pub phase: f64,
    /// Autocorrelation at the period lag
    pub strength: f64,
}

/// Anomaly severity bands, relative to the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Whether the observation sits above or below its expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyType {
    Spike,
    Drop,
}

/// A flagged outlier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Smoothed value at the same date
    pub expected: f64,
    /// Standardized residual that qualified the point
    pub z_score: f64,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
}

/// Complete result of one analysis; the unit of caching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: TrendDirection,
    pub strength: f64,
    pub slope: f64,
    pub correlation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<SeasonalPattern>,
    pub anomalies: Vec<AnomalyPoint>,
    pub forecast: Vec<TrendPoint>,
}
