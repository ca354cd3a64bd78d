//! Weekly and monthly seasonality detection by autocorrelation

use crate::stats::{is_negligible_spread, std_dev};
use crate::{SeasonalPattern, SeasonalPeriod, TrendPoint};

/// Series shorter than this are never seasonal
pub const MIN_POINTS: usize = 14;

/// Autocorrelation required at the period lag
pub const MIN_STRENGTH: f64 = 0.3;

/// Find the strongest weekly or monthly pattern in the raw series.
///
/// A period is only tried when the series covers it twice. On equal
/// strength the weekly candidate wins. A series whose deviations from its
/// mean are rounding noise is flat and never seasonal.
pub fn detect(series: &[TrendPoint]) -> Option<SeasonalPattern> {
    if series.len() < MIN_POINTS {
        return None;
    }

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if is_negligible_spread(std_dev(&values, mean), &values) {
        return None;
    }

    let mut best: Option<(SeasonalPeriod, f64)> = None;
    for period in [SeasonalPeriod::Weekly, SeasonalPeriod::Monthly] {
        if values.len() < 2 * period.length() {
            continue;
        }

        let strength = autocorrelation(&values, mean, period.length());
        if best.map_or(true, |(_, current)| strength > current) {
            best = Some((period, strength));
        }
    }

    let (period, strength) = best?;
    if strength < MIN_STRENGTH {
        return None;
    }

    let amplitude = values
        .iter()
        .map(|v| (v - mean).abs())
        .fold(0.0, f64::max);

    Some(SeasonalPattern {
        period,
        amplitude,
        phase: 0.0,
        strength,
    })
}

/// Lag-`lag` autocorrelation: overlapping cross products over the total
/// sum of squares of the whole series. Zero total variance scores 0.
fn autocorrelation(values: &[f64], mean: f64, lag: usize) -> f64 {
    let denominator: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if denominator == 0.0 || lag >= values.len() {
        return 0.0;
    }

    let numerator: f64 = (0..values.len() - lag)
        .map(|i| (values[i] - mean) * (values[i + lag] - mean))
        .sum();

    numerator / denominator
}
