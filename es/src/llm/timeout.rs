//! Timeout layer around any LlmClient

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, UpstreamError};

/// Fails a completion with `UpstreamError::Timeout` once `timeout` elapses
pub struct TimeoutClient {
    inner: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl TimeoutClient {
    pub fn new(inner: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        debug!(?timeout, "TimeoutClient::new: called");
        Self { inner, timeout }
    }
}

#[async_trait]
impl LlmClient for TimeoutClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, UpstreamError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "TimeoutClient::complete: timed out");
                Err(UpstreamError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowClient {
        delay: Duration,
    }

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, UpstreamError> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse::text("late"))
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: String::new(),
            messages: vec![],
            max_tokens: 10,
        }
    }

    #[tokio::test]
    async fn test_times_out_slow_call() {
        let client = TimeoutClient::new(
            Arc::new(SlowClient {
                delay: Duration::from_millis(500),
            }),
            Duration::from_millis(20),
        );

        let err = client.complete(request()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_passes_fast_call_through() {
        let client = TimeoutClient::new(
            Arc::new(SlowClient {
                delay: Duration::from_millis(1),
            }),
            Duration::from_secs(5),
        );

        let response = client.complete(request()).await.unwrap();
        assert_eq!(response.content.as_deref(), Some("late"));
    }
}
