use super::scrub::sanitize_api_error;
use crate::error::BackendError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Slack over the per-backend limit so the chain's own timeout fires first.
const CLIENT_TIMEOUT_SLACK_SECS: u64 = 5;

pub fn build_backend_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs + CLIENT_TIMEOUT_SLACK_SECS))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send `request` and decode a JSON body, mapping failures to [`BackendError`].
pub(super) async fn send_json<T: DeserializeOwned>(
    backend: &str,
    request: RequestBuilder,
) -> Result<T, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|err| BackendError::unavailable(backend, sanitize_api_error(&err.to_string())))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BackendError::RateLimited {
            backend: backend.to_string(),
        });
    }
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read error body>".to_string());
        return Err(BackendError::unavailable(
            backend,
            format!("HTTP {status}: {}", sanitize_api_error(&body)),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| BackendError::unavailable(backend, format!("invalid response body: {err}")))
}

/// Trimmed text, or an error when the backend answered with nothing.
pub(super) fn non_empty(backend: &str, text: Option<String>) -> Result<String, BackendError> {
    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BackendError::unavailable(backend, "empty completion"))
}
