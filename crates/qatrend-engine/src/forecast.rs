//! Linear forecasting with an optional seasonal overlay

use crate::{LinearFit, SeasonalPattern, TrendPoint};
use chrono::Days;
use std::f64::consts::PI;

/// Confidence never decays below this
pub const MIN_CONFIDENCE: f64 = 0.1;

/// Extend the smoothed series by `periods` daily points.
///
/// Step `i` (1-based) lands on the last date plus `i` days with value
/// `slope × (last_index + i) + intercept`, plus
/// `amplitude × sin(2π × (i mod L) / L)` when a pattern of length `L` is
/// present, floored at 0. Confidence falls linearly from 1 to 0.5 over the
/// horizon and never below [`MIN_CONFIDENCE`]. The forecast ends early if it
/// would run past the last representable date.
pub fn forecast(
    smoothed: &[TrendPoint],
    fit: &LinearFit,
    pattern: Option<&SeasonalPattern>,
    periods: usize,
) -> Vec<TrendPoint> {
    if smoothed.len() < 2 || periods == 0 {
        return Vec::new();
    }

    let Some(last) = smoothed.last() else {
        return Vec::new();
    };
    let last_index = (smoothed.len() - 1) as f64;

    (1..=periods)
        .map_while(|i| {
            let date = last.date.checked_add_days(Days::new(i as u64))?;
            let mut value = fit.slope * (last_index + i as f64) + fit.intercept;

            if let Some(pattern) = pattern {
                let length = pattern.period.length();
                let phase = (i % length) as f64 / length as f64;
                value += pattern.amplitude * (2.0 * PI * phase).sin();
            }

            let confidence = (1.0 - (i as f64 / periods as f64) * 0.5).max(MIN_CONFIDENCE);
            Some(TrendPoint::predicted(date, value.max(0.0), confidence))
        })
        .collect()
}
