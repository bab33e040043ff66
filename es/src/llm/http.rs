//! Shared POST-with-retry loop for the provider clients

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

use super::UpstreamError;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Default wait when a 429 carries no retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504 | 529)
}

/// POST `body` to `url`, retrying transient failures up to `max_retries` times
///
/// `decorate` adds provider-specific headers. Returns the first successful
/// response; which failures get another attempt is decided by
/// [`UpstreamError::is_retryable`].
pub(crate) async fn post_json<F>(
    http: &Client,
    url: &str,
    body: &serde_json::Value,
    max_retries: u32,
    decorate: F,
) -> Result<Response, UpstreamError>
where
    F: Fn(RequestBuilder) -> RequestBuilder,
{
    debug!(%url, max_retries, "post_json: called");
    let mut attempt = 0;
    loop {
        let request = decorate(http.post(url))
            .header("content-type", "application/json")
            .json(body);

        let err = match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(attempt, "post_json: success");
                return Ok(response);
            }
            Ok(response) => error_from_response(response).await,
            Err(e) => UpstreamError::Network(e),
        };

        if attempt >= max_retries || !err.is_retryable() {
            debug!(attempt, error = %err, "post_json: giving up");
            return Err(err);
        }

        attempt += 1;
        let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
        warn!(attempt, backoff_ms = backoff, error = %err, "post_json: retrying after transient error");
        tokio::time::sleep(Duration::from_millis(backoff)).await;
    }
}

/// Map a non-success response onto an error; 429 becomes `RateLimited`
async fn error_from_response(response: Response) -> UpstreamError {
    let status = response.status().as_u16();
    if status == 429 {
        debug!("error_from_response: rate limited (429)");
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return UpstreamError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        };
    }

    let message = response.text().await.unwrap_or_default();
    debug!(status, "error_from_response: API error");
    UpstreamError::ApiError { status, message }
}
