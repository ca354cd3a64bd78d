//! Daily bucketing of raw records into a time series

use crate::{Aggregation, RawRecord, TrendPoint};
use chrono::NaiveDate;
use qatrend_common::day_of;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Builds one point per calendar day (UTC) present in the records.
///
/// Days without records are absent rather than zero-filled.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuilder {
    aggregation: Aggregation,
}

impl TimeSeriesBuilder {
    /// Create a builder for the given rule
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }

    /// The rule this builder applies
    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// Collapse `records` into an ascending daily series
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[RawRecord]) -> Vec<TrendPoint> {
        let daily = match &self.aggregation {
            Aggregation::Mean { field } => Self::daily_mean(records, field),
            Aggregation::Count => Self::daily_count(records),
            Aggregation::RatePerMinute {
                numerator,
                denominator,
            } => Self::daily_rate(records, numerator, denominator),
            Aggregation::DistinctCount { field } => Self::daily_distinct(records, field),
        };

        let mut series: Vec<TrendPoint> = daily
            .into_iter()
            .map(|(date, value)| TrendPoint::new(date, value))
            .collect();
        series.sort_by_key(|point| point.date);

        debug!("Aggregated {} daily points", series.len());
        series
    }

    fn daily_mean(records: &[RawRecord], field: &str) -> HashMap<NaiveDate, f64> {
        let mut sums: HashMap<NaiveDate, (f64, usize)> = HashMap::new();

        for record in records {
            if let Some(value) = record.number(field) {
                let slot = sums.entry(day_of(&record.timestamp)).or_insert((0.0, 0));
                slot.0 += value;
                slot.1 += 1;
            }
        }

        sums.into_iter()
            .map(|(date, (sum, count))| (date, sum / count as f64))
            .collect()
    }

    fn daily_count(records: &[RawRecord]) -> HashMap<NaiveDate, f64> {
        let mut counts: HashMap<NaiveDate, f64> = HashMap::new();
        for record in records {
            *counts.entry(day_of(&record.timestamp)).or_insert(0.0) += 1.0;
        }
        counts
    }

    fn daily_rate(
        records: &[RawRecord],
        numerator: &str,
        denominator: &str,
    ) -> HashMap<NaiveDate, f64> {
        let mut totals: HashMap<NaiveDate, (f64, f64)> = HashMap::new();

        for record in records {
            let (Some(num), Some(den)) = (record.number(numerator), record.number(denominator))
            else {
                continue;
            };
            if num > 0.0 && den > 0.0 {
                let slot = totals.entry(day_of(&record.timestamp)).or_insert((0.0, 0.0));
                slot.0 += num;
                slot.1 += den;
            }
        }

        totals
            .into_iter()
            .map(|(date, (num, den))| (date, num / den * 60.0))
            .collect()
    }

    fn daily_distinct(records: &[RawRecord], field: &str) -> HashMap<NaiveDate, f64> {
        let mut seen: HashMap<NaiveDate, HashSet<String>> = HashMap::new();

        for record in records {
            if let Some(id) = record.identifier(field) {
                seen.entry(day_of(&record.timestamp)).or_default().insert(id);
            }
        }

        seen.into_iter()
            .map(|(date, ids)| (date, ids.len() as f64))
            .collect()
    }
}
