//! HTTP plumbing shared by the LLM backends.

use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::RequestConfig;
use crate::error::{LlmError, LlmResult};
use crate::research::retry_with_backoff;

/// HTTP client, base URL and retry settings for one backend.
#[derive(Clone)]
pub(crate) struct HttpCore {
    client: Client,
    base_url: String,
    request_config: RequestConfig,
}

impl HttpCore {
    pub(crate) fn new(base_url: &str, request_config: RequestConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_config,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run `call` until it succeeds or the retry budget is spent.
    ///
    /// Exhaustion is reported as [`LlmError::Unavailable`] carrying the last
    /// underlying error message.
    pub(crate) async fn with_retries<T, F, Fut>(&self, backend: &str, mut call: F) -> LlmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LlmResult<T>>,
    {
        let policy = self.request_config.retry_policy();
        let start = Instant::now();

        let outcome = retry_with_backoff(&policy, backend, |_| call()).await;

        match outcome {
            Ok(value) => {
                info!(
                    backend = %backend,
                    latency_ms = start.elapsed().as_millis(),
                    "LLM call succeeded"
                );
                Ok(value)
            }
            Err(e) => {
                error!(
                    backend = %backend,
                    error = %e,
                    latency_ms = start.elapsed().as_millis(),
                    "LLM call failed"
                );
                Err(LlmError::Unavailable {
                    message: e.to_string(),
                    retries: self.request_config.max_retries,
                })
            }
        }
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post_json<B, R>(&self, url: &str, headers: HeaderMap, body: &B) -> LlmResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(url = %url, "Sending LLM request");

        let response = self
            .client
            .post(url)
            .headers(headers)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}
