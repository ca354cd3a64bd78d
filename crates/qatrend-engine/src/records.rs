//! Raw records delivered by a record source, and the analysis kinds built from them

use chrono::{DateTime, Utc};
use qatrend_common::QaTrendError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One timestamped record with arbitrary named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// When the record was created
    pub timestamp: DateTime<Utc>,
    /// Every other field of the record
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Create a record without fields
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            fields: Map::new(),
        }
    }

    /// Attach a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Numeric field value. Numeric strings are accepted, as some endpoints
    /// serialize decimals as strings.
    pub fn number(&self, field: &str) -> Option<f64> {
        let value = match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    /// Identifier field value, normalized to a string
    pub fn identifier(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// How a day's records collapse into one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Mean of a numeric field
    Mean { field: String },
    /// Number of records
    Count,
    /// `sum(numerator) / sum(denominator) * 60` over records where both are positive
    RatePerMinute {
        numerator: String,
        denominator: String,
    },
    /// Number of distinct identifiers
    DistinctCount { field: String },
}

/// The metrics the engine knows how to analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Daily mean of assessment `overall_score`
    Quality,
    /// Daily count of error records
    ErrorRate,
    /// Daily words processed per minute
    Efficiency,
    /// Daily distinct active users
    Engagement,
}

impl AnalysisKind {
    /// Every kind, in display order
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Quality,
        AnalysisKind::ErrorRate,
        AnalysisKind::Efficiency,
        AnalysisKind::Engagement,
    ];

    /// Stable name used in cache keys and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::Quality => "quality",
            AnalysisKind::ErrorRate => "error_rate",
            AnalysisKind::Efficiency => "efficiency",
            AnalysisKind::Engagement => "engagement",
        }
    }

    /// Aggregation rule that builds this kind's daily series
    pub fn aggregation(self) -> Aggregation {
        match self {
            AnalysisKind::Quality => Aggregation::Mean {
                field: "overall_score".to_string(),
            },
            AnalysisKind::ErrorRate => Aggregation::Count,
            AnalysisKind::Efficiency => Aggregation::RatePerMinute {
                numerator: "word_count".to_string(),
                denominator: "processing_time".to_string(),
            },
            AnalysisKind::Engagement => Aggregation::DistinctCount {
                field: "user_id".to_string(),
            },
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = QaTrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                QaTrendError::validation_field(format!("Unknown analysis kind: {s}"), "kind")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_record_deserialization_flattens_fields() {
        let record: RawRecord = serde_json::from_value(json!({
            "timestamp": "2024-05-01T09:00:00Z",
            "overall_score": 87.5,
            "user_id": 42
        }))
        .unwrap();

        assert_eq!(record.timestamp, timestamp());
        assert_eq!(record.number("overall_score"), Some(87.5));
        assert_eq!(record.identifier("user_id").as_deref(), Some("42"));
    }

    #[test]
    fn test_numeric_lookup_accepts_strings() {
        let record = RawRecord::new(timestamp())
            .with_field("overall_score", "91.25")
            .with_field("word_count", "many")
            .with_field("flag", true);

        assert_eq!(record.number("overall_score"), Some(91.25));
        assert_eq!(record.number("word_count"), None);
        assert_eq!(record.number("flag"), None);
        assert_eq!(record.number("missing"), None);
    }

    #[test]
    fn test_identifier_lookup_rejects_empty_and_null() {
        let record = RawRecord::new(timestamp())
            .with_field("user_id", "")
            .with_field("session", Value::Null);

        assert_eq!(record.identifier("user_id"), None);
        assert_eq!(record.identifier("session"), None);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.as_str().parse::<AnalysisKind>().unwrap(), kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
        assert!("throughput".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_kind_aggregation_rules() {
        assert_eq!(AnalysisKind::ErrorRate.aggregation(), Aggregation::Count);
        assert_eq!(
            AnalysisKind::Engagement.aggregation(),
            Aggregation::DistinctCount {
                field: "user_id".to_string()
            }
        );
        assert!(matches!(
            AnalysisKind::Efficiency.aggregation(),
            Aggregation::RatePerMinute { .. }
        ));
    }
}
