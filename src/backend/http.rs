//! HTTP implementation of the reasoning backend over reqwest.
//!
//! All reqwest errors are converted to [`BackendError`] here, at the one
//! boundary, and every request runs through a bounded exponential-backoff
//! retry loop configured by [`BackendConfig`] rather than per call site.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{
    AnalyzeRequest, AnalyzeResponse, BackendError, BatchFixRequest, BatchFixResponse,
    GenerateRequest, GenerateResponse, MaintenanceBackend,
};
use crate::config::BackendConfig;

/// HTTP client for the maintenance backend.
pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    base_delay: Duration,
}

impl HttpBackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Exponential backoff delay for a zero-based attempt index.
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// POST `body` to `path`, retrying retryable failures up to the
    /// configured attempt budget.
    async fn post_with_retry<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let mut last_err: Option<BackendError> = None;

        for attempt in 0..self.max_attempts {
            match self.post_once(&url, body).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    tokio::time::sleep(self.backoff(attempt)).await;
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| BackendError::Unknown("retry budget exhausted".into())))
    }

    async fn post_once<B, R>(&self, url: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(convert_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<R>()
                .await
                .map_err(|e| BackendError::Unknown(format!("malformed backend response: {e}")))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(classify_status(status.as_u16(), message))
        }
    }
}

/// The single reqwest-to-taxonomy conversion point for transport errors.
fn convert_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() {
        BackendError::Network(err.to_string())
    } else {
        BackendError::Unknown(err.to_string())
    }
}

/// Classify a non-2xx status into the taxonomy.
fn classify_status(status: u16, message: String) -> BackendError {
    match status {
        400 | 422 => BackendError::Validation(message),
        500..=599 => BackendError::Server(format!("HTTP {status}: {message}")),
        _ => BackendError::Http { status, message },
    }
}

#[async_trait]
impl MaintenanceBackend for HttpBackendClient {
    async fn health(&self) -> Result<bool, BackendError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(convert_reqwest_error)?;
        Ok(response.status().is_success())
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, BackendError> {
        self.post_with_retry("/maintenance/analyze", request).await
    }

    async fn generate_test(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError> {
        self.post_with_retry("/maintenance/generate", request).await
    }

    async fn fix(&self, request: &BatchFixRequest) -> Result<BatchFixResponse, BackendError> {
        self.post_with_retry("/maintenance/fix", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BackendConfig {
        BackendConfig {
            url: "http://localhost:8000/".into(),
            timeout_secs: 30,
            retry_max_attempts: 3,
            retry_base_delay_ms: 100,
            mock: false,
        }
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = HttpBackendClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let client = HttpBackendClient::new(&test_config()).unwrap();
        assert_eq!(client.backoff(0), Duration::from_millis(100));
        assert_eq!(client.backoff(1), Duration::from_millis(200));
        assert_eq!(client.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(400, String::new()),
            BackendError::Validation(_)
        ));
        assert!(matches!(
            classify_status(422, String::new()),
            BackendError::Validation(_)
        ));
        assert!(matches!(
            classify_status(503, String::new()),
            BackendError::Server(_)
        ));
        assert!(matches!(
            classify_status(404, String::new()),
            BackendError::Http { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let mut config = test_config();
        // Reserved TEST-NET-1 address, nothing listens there.
        config.url = "http://192.0.2.1:9".into();
        config.timeout_secs = 1;
        config.retry_max_attempts = 1;
        let client = HttpBackendClient::new(&config).unwrap();

        let err = client
            .analyze(&AnalyzeRequest {
                commit_hash: "b".into(),
                previous_commit_hash: "a".into(),
                changes: vec![],
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "expected transient kind, got: {err}");
    }
}
