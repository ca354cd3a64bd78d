//! Record sources feeding the engine

use crate::{AnalysisKind, RawRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qatrend_common::{result_with_context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Supplies the raw records behind an analysis
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Records of `kind` timestamped within `[start, end]`
    async fn fetch(
        &self,
        kind: AnalysisKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>>;
}

/// Either one list shared by every kind, or one list per kind
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Shared(Vec<RawRecord>),
    PerKind(HashMap<AnalysisKind, Vec<RawRecord>>),
}

/// Reads records from a JSON file.
///
/// The file holds either an array of records, used for every kind, or an
/// object mapping kind names (`quality`, `error_rate`, ...) to arrays. The
/// file is re-read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// File this source reads
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(
        &self,
        kind: AnalysisKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>> {
        let content = result_with_context!(
            tokio::fs::read_to_string(&self.path).await,
            "Failed to read records file {}",
            self.path.display()
        )?;

        let records = match serde_json::from_str::<RecordFile>(&content)? {
            RecordFile::Shared(records) => records,
            RecordFile::PerKind(mut by_kind) => by_kind.remove(&kind).unwrap_or_default(),
        };

        let total = records.len();
        let records: Vec<RawRecord> = records
            .into_iter()
            .filter(|record| record.timestamp >= start && record.timestamp <= end)
            .collect();

        debug!("Loaded {} of {} records in range", records.len(), total);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_records(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write records");
        file
    }

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 30, 23, 59, 59).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_shared_file_is_filtered_to_range() {
        let file = write_records(
            r#"[
                {"timestamp": "2024-03-31T23:59:59Z", "overall_score": 10},
                {"timestamp": "2024-04-01T00:00:00Z", "overall_score": 20},
                {"timestamp": "2024-04-15T12:00:00Z", "overall_score": 30},
                {"timestamp": "2024-05-01T00:00:00Z", "overall_score": 40}
            ]"#,
        );
        let (start, end) = range();

        let records = JsonFileSource::new(file.path())
            .fetch(AnalysisKind::Quality, start, end)
            .await
            .unwrap();

        let scores: Vec<f64> = records.iter().filter_map(|r| r.number("overall_score")).collect();
        assert_eq!(scores, vec![20.0, 30.0]);
    }

    #[tokio::test]
    async fn test_per_kind_file() {
        let file = write_records(
            r#"{
                "error_rate": [{"timestamp": "2024-04-02T08:00:00Z", "code": "E1"}],
                "engagement": [
                    {"timestamp": "2024-04-02T08:00:00Z", "user_id": "a"},
                    {"timestamp": "2024-04-03T08:00:00Z", "user_id": "b"}
                ]
            }"#,
        );
        let (start, end) = range();
        let source = JsonFileSource::new(file.path());

        assert_eq!(source.fetch(AnalysisKind::ErrorRate, start, end).await.unwrap().len(), 1);
        assert_eq!(source.fetch(AnalysisKind::Engagement, start, end).await.unwrap().len(), 2);
        assert!(source.fetch(AnalysisKind::Quality, start, end).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let (start, end) = range();
        let err = JsonFileSource::new("/nonexistent/records.json")
            .fetch(AnalysisKind::Quality, start, end)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to read records file"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let file = write_records("{\"quality\": 12}");
        let (start, end) = range();

        let result = JsonFileSource::new(file.path())
            .fetch(AnalysisKind::Quality, start, end)
            .await;

        assert!(result.is_err());
    }
}
