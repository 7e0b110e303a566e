use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};

use super::http::HttpCore;
use super::types::{AnthropicRequest, AnthropicResponse, GenerateRequest, Message};
use super::LlmBackend;
use crate::config::{LlmConfig, RequestConfig};
use crate::error::{LlmError, LlmResult};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const JSON_INSTRUCTION: &str = "Respond with valid JSON only, no other text.";

/// Messages-API backend, used as the fallback.
#[derive(Clone)]
pub struct AnthropicBackend {
    http: HttpCore,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl AnthropicBackend {
    /// Create the fallback backend from LLM configuration
    pub fn new(config: &LlmConfig, request_config: RequestConfig) -> LlmResult<Self> {
        Ok(Self {
            http: HttpCore::new(&config.fallback_base_url, request_config)?,
            api_key: config.fallback_api_key.clone(),
            model: config.fallback_model.clone(),
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
        // No native JSON mode; ask in the prompt instead.
        let prompt = if request.json_mode {
            format!("{}\n\n{}", request.prompt, JSON_INSTRUCTION)
        } else {
            request.prompt.clone()
        };

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            messages: vec![Message::user(prompt)],
            system: request.system_prompt.as_deref(),
            temperature: Some(request.temperature.unwrap_or(self.temperature)),
        };

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|e| LlmError::NotConfigured {
            provider: format!("{} (invalid API key: {})", PROVIDER, e),
        })?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let url = self.http.url("/v1/messages");
        let response: AnthropicResponse = self.http.post_json(&url, headers, &body).await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(LlmError::InvalidResponse {
                message: "Response contained no text content".to_string(),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
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
