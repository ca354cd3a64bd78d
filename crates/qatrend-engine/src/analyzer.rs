//! The pure analysis pipeline over one daily series

use crate::{anomaly, forecast, regression, seasonality, smoothing, TrendAnalysis, TrendPoint};
use qatrend_config::TrendConfig;
use tracing::{debug, instrument};

/// Trend analyzer for a single daily series
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    /// Create an analyzer with the effective configuration
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Smooth, fit, and look for seasonality and anomalies, then forecast.
    ///
    /// Never fails: short or flat series produce a stable analysis with empty
    /// anomaly and forecast lists.
    #[instrument(skip(self, series), fields(points = series.len()))]
    pub fn analyze(&self, series: &[TrendPoint]) -> TrendAnalysis {
        let smoothed = smoothing::moving_average(series, self.config.smoothing_window);

        let fit = regression::linear_fit(&smoothed);
        let (trend, strength) = regression::classify(&fit);

        let seasonality = if self.config.seasonality_detection {
            seasonality::detect(series)
        } else {
            None
        };

        let anomalies = anomaly::detect(series, &smoothed, self.config.anomaly_threshold);

        let forecast = forecast::forecast(
            &smoothed,
            &fit,
            seasonality.as_ref(),
            self.config.forecast_periods,
        );

        debug!(
            "Trend {} (strength {:.3}, slope {:.4}), {} anomalies, seasonal: {}",
            trend,
            strength,
            fit.slope,
            anomalies.len(),
            seasonality.is_some()
        );

        TrendAnalysis {
            trend,
            strength,
            slope: fit.slope,
            correlation: fit.correlation,
            seasonality,
            anomalies,
            forecast,
        }
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}
