use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use super::http::HttpCore;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, GenerateRequest, ResponseFormat};
use super::LlmBackend;
use crate::config::{LlmConfig, RequestConfig};
use crate::error::{LlmError, LlmResult};

const PROVIDER: &str = "openai";

/// Chat-completions backend (OpenAI-compatible API).
#[derive(Clone)]
pub struct OpenAiBackend {
    http: HttpCore,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiBackend {
    /// Create the primary backend from LLM configuration
    pub fn new(config: &LlmConfig, request_config: RequestConfig) -> LlmResult<Self> {
        Ok(Self {
            http: HttpCore::new(&config.base_url, request_config)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn execute_request(&self, api_key: &str, request: &GenerateRequest) -> LlmResult<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: request.to_messages(),
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
            LlmError::NotConfigured {
                provider: format!("{} (invalid API key: {})", PROVIDER, e),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let url = self.http.url("/v1/chat/completions");
        let response: ChatCompletionResponse = self.http.post_json(&url, headers, &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                message: "Response contained no message content".to_string(),
            })
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerateRequest) -> LlmResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| LlmError::NotConfigured {
            provider: PROVIDER.to_string(),
        })?;

        self.http
            .with_retries(PROVIDER, || self.execute_request(api_key, request))
            .await
    }
}
