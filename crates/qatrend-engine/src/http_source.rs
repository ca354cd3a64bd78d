//! QA platform API client with connection pooling and rate limiting
//!
//! Implements [`RecordSource`] over the platform's paginated analytics
//! endpoints, with bearer-token or API-key authentication, a client-side rate
//! limit and retries with exponential backoff for transient failures.

use crate::{AnalysisKind, RawRecord, RecordSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota};
use qatrend_common::{ensure, iso_timestamp, QaTrendError, Result};
use qatrend_config::SourceConfig;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT,
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Header carrying the API key when no JWT is configured
const API_KEY_HEADER: &str = "x-api-key";

/// One page of a paginated listing
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<RawRecord>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: Option<u64>,
}

/// QA platform API client
#[derive(Debug, Clone)]
pub struct QaPlatformClient {
    client: Client,
    config: SourceConfig,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl QaPlatformClient {
    /// Create a client from source configuration.
    ///
    /// A JWT is sent as a bearer token; otherwise the API key is sent as
    /// `X-API-Key`. One of the two is required.
    pub fn new(config: SourceConfig) -> Result<Self> {
        ensure!(config.page_size > 0, "Page size must be greater than 0");

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            QaTrendError::config_with_source(format!("Invalid base URL: {}", config.base_url), e)
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .default_headers(Self::auth_headers(&config)?)
            .build()
            .map_err(|e| QaTrendError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| QaTrendError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config,
            base_url,
            rate_limiter,
        })
    }

    fn auth_headers(config: &SourceConfig) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("qatrend/", env!("CARGO_PKG_VERSION"))),
        );

        let invalid = |e: InvalidHeaderValue| {
            QaTrendError::config_with_source("Credential is not a valid header value", e)
        };

        match (&config.jwt_token, &config.api_key) {
            (Some(token), _) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(invalid)?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            (None, Some(key)) => {
                let mut value = HeaderValue::from_str(key).map_err(invalid)?;
                value.set_sensitive(true);
                headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
            }
            (None, None) => {
                return Err(QaTrendError::config(
                    "QA platform source requires a JWT token or an API key",
                ))
            }
        }

        Ok(headers)
    }

    /// Full URL of an endpoint path
    fn build_url(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| QaTrendError::config_with_source(format!("Invalid endpoint URL: {joined}"), e))
    }

    /// Endpoint path serving records of `kind`
    fn endpoint(&self, kind: AnalysisKind) -> &str {
        let endpoints = &self.config.endpoints;
        match kind {
            AnalysisKind::Quality => &endpoints.quality,
            AnalysisKind::ErrorRate => &endpoints.error_rate,
            AnalysisKind::Efficiency => &endpoints.efficiency,
            AnalysisKind::Engagement => &endpoints.engagement,
        }
    }

    /// Make a request with retry logic.
    ///
    /// Timeouts, connection failures, 429 and 5xx responses are retried with
    /// exponential backoff; other client errors fail at once.
    #[instrument(skip(self, params), fields(url = %url))]
    async fn make_request(&self, url: &Url, params: &[(&str, String)]) -> Result<Response> {
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(10))
            .take(self.config.max_retries);

        RetryIf::spawn(
            retry_strategy,
            || async move {
                self.rate_limiter.until_ready().await;
                debug!("Sending request with {} parameters", params.len());

                match self.client.get(url.clone()).query(params).send().await {
                    Ok(response) => Self::check_status(response),
                    Err(e) if e.is_timeout() => {
                        warn!("Request timeout, will retry: {}", e);
                        Err(QaTrendError::network_with_source("Request timeout", e))
                    }
                    Err(e) if e.is_connect() => {
                        warn!("Connection error, will retry: {}", e);
                        Err(QaTrendError::network_with_source("Connection error", e))
                    }
                    Err(e) => {
                        error!("Request failed: {}", e);
                        Err(QaTrendError::network_with_source("Request failed", e))
                    }
                }
            },
            |e: &QaTrendError| e.is_transient(),
        )
        .await
    }

    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {}", status);
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!("Transient API error, will retry: {}", status);
        } else {
            error!("Client error: {}", status);
        }

        Err(QaTrendError::api_with_status(
            format!("API returned {status}"),
            status.as_u16(),
        ))
    }

    /// Parse a JSON response body
    async fn parse_response<T>(response: Response) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let text = response
            .text()
            .await
            .map_err(|e| QaTrendError::network_with_source("Failed to read response body", e))?;

        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch every page of `path` within the date range.
    ///
    /// Paging stops on a short page, once `pagination.total` records have
    /// been requested, or when a page reports no total.
    #[instrument(skip(self))]
    async fn fetch_all(
        &self,
        path: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Vec<RawRecord>> {
        let url = self.build_url(path)?;
        let limit = u64::from(self.config.page_size);
        let mut offset: u64 = 0;
        let mut records = Vec::new();

        loop {
            let params = [
                ("start_date", iso_timestamp(start)),
                ("end_date", iso_timestamp(end)),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ];

            let response = self.make_request(&url, &params).await?;
            let page: Page = Self::parse_response(response).await?;
            let received = page.data.len() as u64;
            records.extend(page.data);
            offset += limit;

            // a page without a total is the last one
            let total = page.pagination.and_then(|p| p.total);
            if received < limit || total.map_or(true, |total| total <= offset) {
                break;
            }
        }

        info!("Fetched {} records from {}", records.len(), path);
        Ok(records)
    }

    /// Check that the API is reachable and answering
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> bool {
        let url = match self.build_url("/health") {
            Ok(url) => url,
            Err(e) => {
                warn!("Health check failed: {}", e);
                return false;
            }
        };

        match self.make_request(&url, &[]).await {
            Ok(_) => {
                info!("Health check successful");
                true
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl RecordSource for QaPlatformClient {
    async fn fetch(
        &self,
        kind: AnalysisKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>> {
        self.fetch_all(self.endpoint(kind), &start, &end).await
    }
}
