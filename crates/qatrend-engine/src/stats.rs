//! Floating-point tolerance for spread checks

/// Whether `spread` (a standard deviation) is rounding noise for `values`.
///
/// Averaging or mean-centering a constant series leaves residue a few ulps
/// wide, growing with the number of terms summed. A spread within
/// `max(len, 16) × ε` of the mean magnitude of `values` counts as zero.
pub fn is_negligible_spread(spread: f64, values: &[f64]) -> bool {
    if values.is_empty() {
        return true;
    }

    let scale = values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64;
    let terms = values.len().max(16) as f64;
    spread <= f64::EPSILON * terms * scale
}

/// Population standard deviation around `mean`
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
