//! Linear trend estimation

use crate::stats::is_negligible_spread;
use crate::{LinearFit, TrendDirection, TrendPoint};

/// Slopes smaller than this (units per day) count as flat
pub const MIN_SLOPE: f64 = 0.01;

/// Fits explaining less variance than this are not trends
pub const MIN_CORRELATION: f64 = 0.1;

/// Least-squares fit of value against 0-based index.
///
/// Calendar gaps are ignored: the n-th point sits at x = n. Fewer than two
/// points yield the zero fit. A flat series, including one that only varies
/// by rounding noise, has nothing to explain and gets correlation 0.
pub fn linear_fit(series: &[TrendPoint]) -> LinearFit {
    let n = series.len();
    if n < 2 {
        return LinearFit::default();
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = series.iter().map(|p| p.value).sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, point) in series.iter().enumerate() {
        let x_diff = i as f64 - x_mean;
        numerator += x_diff * (point.value - y_mean);
        denominator += x_diff * x_diff;
    }

    if denominator.abs() < f64::EPSILON {
        return LinearFit::default();
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, point) in series.iter().enumerate() {
        let predicted = slope * i as f64 + intercept;
        ss_res += (point.value - predicted).powi(2);
        ss_tot += (point.value - y_mean).powi(2);
    }

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let flat = is_negligible_spread((ss_tot / n as f64).sqrt(), &values);

    let correlation = if ss_tot > 0.0 && !flat {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    LinearFit {
        slope,
        intercept,
        correlation,
    }
}

/// Direction and strength of a fit.
///
/// Strength is `min(1, correlation × |slope|)` and 0 for stable series.
pub fn classify(fit: &LinearFit) -> (TrendDirection, f64) {
    if fit.slope.abs() < MIN_SLOPE || fit.correlation < MIN_CORRELATION {
        return (TrendDirection::Stable, 0.0);
    }

    let direction = if fit.slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    (direction, (fit.correlation * fit.slope.abs()).min(1.0))
}
