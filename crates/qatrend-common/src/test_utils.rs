//! Test utilities and shared fixtures for the trend engine workspace.
//!
//! Compiled for this crate's own tests and, through the `testing` feature,
//! for the unit and integration tests of the other workspace crates.

use chrono::{Duration, NaiveDate};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Synthetic series used across the analysis tests.
pub mod series_fixtures {
    use super::*;

    /// `count` consecutive days starting at `start`.
    pub fn daily_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
        (0..count)
            .map(|offset| start + Duration::days(offset as i64))
            .collect()
    }

    /// `value[i] = slope * i + intercept`
    pub fn linear(count: usize, slope: f64, intercept: f64) -> Vec<f64> {
        (0..count).map(|i| slope * i as f64 + intercept).collect()
    }

    /// Every value equal to `value`.
    pub fn constant(count: usize, value: f64) -> Vec<f64> {
        vec![value; count]
    }

    /// Square wave around `baseline`: the first half of each period sits at
    /// `baseline + amplitude`, the rest at `baseline - amplitude`.
    pub fn square_wave(count: usize, period: usize, amplitude: f64, baseline: f64) -> Vec<f64> {
        let high_len = (period + 1) / 2;
        (0..count)
            .map(|i| {
                if i % period < high_len {
                    baseline + amplitude
                } else {
                    baseline - amplitude
                }
            })
            .collect()
    }

    /// Flat series with a single injected value at `index`.
    pub fn with_spike(count: usize, baseline: f64, index: usize, spike: f64) -> Vec<f64> {
        let mut values = constant(count, baseline);
        if let Some(slot) = values.get_mut(index) {
            *slot = spike;
        }
        values
    }
}
