//! Residual-based anomaly detection

use crate::stats::{is_negligible_spread, std_dev};
use crate::{AnomalyPoint, AnomalyType, Severity, TrendPoint};

/// Flag points whose residual from the smoothed series is an outlier.
///
/// Residuals are standardized with the population standard deviation of all
/// residuals; `z = |residual| / stddev`. A point qualifies when
/// `z > threshold`, and is High above twice the threshold, Medium above
/// 1.5×, otherwise Low. Output is chronological.
///
/// Returns nothing when the series lengths differ, when there are fewer than
/// two points, or when the residuals only differ by rounding noise (as for
/// a constant series).
pub fn detect(raw: &[TrendPoint], smoothed: &[TrendPoint], threshold: f64) -> Vec<AnomalyPoint> {
    if raw.len() != smoothed.len() || raw.len() < 2 {
        return Vec::new();
    }

    let residuals: Vec<f64> = raw
        .iter()
        .zip(smoothed)
        .map(|(r, s)| r.value - s.value)
        .collect();

    let mean = residuals.iter().sum::<f64>() / residuals.len() as f64;
    let std_dev = std_dev(&residuals, mean);

    let values: Vec<f64> = raw.iter().map(|p| p.value).collect();
    if is_negligible_spread(std_dev, &values) {
        return Vec::new();
    }

    raw.iter()
        .zip(smoothed)
        .zip(&residuals)
        .filter_map(|((point, expected), &residual)| {
            let z_score = residual.abs() / std_dev;
            if z_score <= threshold {
                return None;
            }

            Some(AnomalyPoint {
                date: point.date,
                value: point.value,
                expected: expected.value,
                z_score,
                severity: severity(z_score, threshold),
                anomaly_type: if residual > 0.0 {
                    AnomalyType::Spike
                } else {
                    AnomalyType::Drop
                },
            })
        })
        .collect()
}

fn severity(z_score: f64, threshold: f64) -> Severity {
    if z_score > threshold * 2.0 {
        Severity::High
    } else if z_score > threshold * 1.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
