//! QA platform client tests against a scripted local HTTP server.

use chrono::{DateTime, TimeZone, Utc};
use qatrend_common::QaTrendError;
use qatrend_config::SourceConfig;
use qatrend_engine::{AnalysisKind, QaPlatformClient, RecordSource};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Requests seen by the scripted server, one string per request head
type RequestLog = Arc<Mutex<Vec<String>>>;

/// Serve `responses` in order, one connection each, and log every request head
async fn scripted_server(responses: Vec<(u16, &'static str)>) -> (String, RequestLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api/v1", listener.local_addr().unwrap());
    let log: RequestLog = Arc::default();

    let seen = Arc::clone(&log);
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..read]);
            }
            seen.lock().unwrap().push(String::from_utf8_lossy(&head).to_lowercase());

            let response = format!(
                "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (base_url, log)
}

fn range() -> (DateTime<Utc>, DateTime<Utc>) {
    (
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
    )
}

fn client(base_url: &str) -> QaPlatformClient {
    QaPlatformClient::new(
        SourceConfig::new(base_url)
            .with_api_key("qa_test_key")
            .with_page_size(2)
            .with_max_retries(2)
            .with_rate_limit(100),
    )
    .unwrap()
}

const PAGE_ONE: &str = r#"{"data": [
    {"timestamp": "2024-06-01T10:00:00Z", "overall_score": 90},
    {"timestamp": "2024-06-02T10:00:00Z", "overall_score": 80}
], "pagination": {"total": 3}}"#;

const PAGE_TWO: &str = r#"{"data": [
    {"timestamp": "2024-06-03T10:00:00Z", "overall_score": 70}
], "pagination": {"total": 3}}"#;

#[tokio::test]
async fn test_fetch_pages_until_short_page() {
    let (base_url, log) = scripted_server(vec![(200, PAGE_ONE), (200, PAGE_TWO)]).await;
    let (start, end) = range();

    let records = client(&base_url)
        .fetch(AnalysisKind::Quality, start, end)
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[2].number("overall_score"), Some(70.0));

    let requests = log.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("get /api/v1/analytics/assessments?"));
    assert!(requests[0].contains("offset=0"));
    assert!(requests[0].contains("limit=2"));
    assert!(requests[0].contains("start_date=2024-06-01t00%3a00%3a00.000z"));
    assert!(requests[0].contains("x-api-key: qa_test_key"));
    assert!(requests[1].contains("offset=2"));
}

#[tokio::test]
async fn test_stops_when_total_reached() {
    let full_page = r#"{"data": [
        {"timestamp": "2024-06-01T10:00:00Z"},
        {"timestamp": "2024-06-02T10:00:00Z"}
    ], "pagination": {"total": 2}}"#;
    let (base_url, log) = scripted_server(vec![(200, full_page)]).await;
    let (start, end) = range();

    let records = client(&base_url)
        .fetch(AnalysisKind::ErrorRate, start, end)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_total_ends_paging() {
    let full_page = r#"{"data": [
        {"timestamp": "2024-06-01T10:00:00Z", "overall_score": 90},
        {"timestamp": "2024-06-02T10:00:00Z", "overall_score": 80}
    ]}"#;
    let (base_url, log) = scripted_server(vec![(200, full_page), (200, full_page)]).await;
    let (start, end) = range();

    let records = client(&base_url)
        .fetch(AnalysisKind::Quality, start, end)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (base_url, log) = scripted_server(vec![
        (503, r#"{"error": "unavailable"}"#),
        (429, r#"{"error": "slow down"}"#),
        (200, PAGE_TWO),
    ])
    .await;
    let (start, end) = range();

    let records = client(&base_url)
        .fetch(AnalysisKind::Quality, start, end)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_client_errors_fail_immediately() {
    let (base_url, log) =
        scripted_server(vec![(401, r#"{"error": "unauthorized"}"#), (200, PAGE_TWO)]).await;
    let (start, end) = range();

    let err = client(&base_url)
        .fetch(AnalysisKind::Engagement, start, end)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QaTrendError::Api {
            status_code: Some(401),
            ..
        }
    ));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_json_body_is_a_serialization_error() {
    let (base_url, _log) = scripted_server(vec![(200, "<html>maintenance</html>")]).await;
    let (start, end) = range();

    let err = client(&base_url)
        .fetch(AnalysisKind::Efficiency, start, end)
        .await
        .unwrap_err();

    assert!(matches!(err, QaTrendError::Serialization(_)));
}

#[tokio::test]
async fn test_jwt_and_health_check() {
    let (base_url, log) = scripted_server(vec![(200, r#"{"status": "ok"}"#)]).await;
    let client = QaPlatformClient::new(
        SourceConfig::new(&base_url)
            .with_api_key("ignored")
            .with_jwt_token("header.payload.sig"),
    )
    .unwrap();

    assert!(client.health_check().await);

    let requests = log.lock().unwrap().clone();
    assert!(requests[0].starts_with("get /api/v1/health "));
    assert!(requests[0].contains("authorization: bearer header.payload.sig"));
    assert!(!requests[0].contains("x-api-key"));
}
