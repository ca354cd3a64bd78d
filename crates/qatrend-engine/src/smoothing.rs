//! Centered moving-average smoothing

use crate::TrendPoint;

/// Smooth `series` with a centered moving average of `window` days.
///
/// Point `i` becomes the mean of indices `[i - ⌊w/2⌋, i + ⌈w/2⌉)` clipped to
/// the series bounds, so edges average over fewer points. Dates are kept and
/// a window of 0 or 1 returns the input unchanged.
pub fn moving_average(series: &[TrendPoint], window: usize) -> Vec<TrendPoint> {
    if window <= 1 {
        return series.to_vec();
    }

    let behind = window / 2;
    let ahead = window - behind;
    let len = series.len();

    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = i.saturating_sub(behind);
            let end = (i + ahead).min(len);
            let slice = &series[start..end];
            let mean = slice.iter().map(|p| p.value).sum::<f64>() / slice.len() as f64;
            TrendPoint::new(point.date, mean)
        })
        .collect()
}
