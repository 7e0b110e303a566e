//! Sticky primary-to-fallback LLM failover.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::anthropic::AnthropicBackend;
use super::openai::OpenAiBackend;
use super::types::GenerateRequest;
use super::{parse_json_completion, LlmBackend};
use crate::config::Config;
use crate::error::{LlmError, LlmResult};

/// Routes generation to a primary backend and switches to the fallback for
/// good after the first primary failure.
///
/// The switch is process-wide for every holder of the same client: once set,
/// the flag is never cleared and the primary is not consulted again. A
/// fallback failure is returned to the caller.
pub struct FallbackLlmClient {
    primary: Arc<dyn LlmBackend>,
    fallback: Arc<dyn LlmBackend>,
    use_fallback: AtomicBool,
}

impl FallbackLlmClient {
    /// Create a client over two backends
    pub fn new(primary: Arc<dyn LlmBackend>, fallback: Arc<dyn LlmBackend>) -> Self {
        Self {
            primary,
            fallback,
            use_fallback: AtomicBool::new(false),
        }
    }

    /// Build OpenAI (primary) and Anthropic (fallback) backends from config.
    ///
    /// Without a primary key the client starts in fallback mode.
    pub fn from_config(config: &Config) -> LlmResult<Self> {
        let primary = OpenAiBackend::new(&config.llm, config.request.clone())?;
        let fallback = AnthropicBackend::new(&config.llm, config.request.clone())?;
        let start_on_fallback = !primary.is_configured() && fallback.is_configured();

        let client = Self::new(Arc::new(primary), Arc::new(fallback));
        if start_on_fallback {
            info!("Primary LLM not configured, starting on fallback");
            client.use_fallback.store(true, Ordering::SeqCst);
        }
        Ok(client)
    }

    /// Whether the fallback backend is now in use
    pub fn is_using_fallback(&self) -> bool {
        self.use_fallback.load(Ordering::SeqCst)
    }

    /// Name of the backend that will serve the next request
    pub fn active_backend(&self) -> &str {
        if self.is_using_fallback() {
            self.fallback.name()
        } else {
            self.primary.name()
        }
    }

    /// Generate text, failing over to the fallback on primary error
    pub async fn generate(&self, request: &GenerateRequest) -> LlmResult<String> {
        if !self.is_using_fallback() {
            match self.primary.generate(request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        primary = %self.primary.name(),
                        fallback = %self.fallback.name(),
                        error = %e,
                        "Primary LLM failed, switching to fallback"
                    );
                    self.use_fallback.store(true, Ordering::SeqCst);
                }
            }
        }

        self.fallback.generate(request).await
    }

    /// Generate and deserialize a JSON completion into `T`
    pub async fn generate_typed<T: DeserializeOwned>(&self, request: &GenerateRequest) -> LlmResult<T> {
        let value = LlmBackend::generate_json(self, request).await?;
        serde_json::from_value(value).map_err(|e| LlmError::InvalidResponse {
            message: format!("Unexpected JSON shape: {}", e),
        })
    }
}

#[async_trait]
impl LlmBackend for FallbackLlmClient {
    fn name(&self) -> &str {
        self.active_backend()
    }

    async fn generate(&self, request: &GenerateRequest) -> LlmResult<String> {
        FallbackLlmClient::generate(self, request).await
    }

    async fn generate_json(&self, request: &GenerateRequest) -> LlmResult<serde_json::Value> {
        let request = request.clone().with_json_mode(true);
        let text = FallbackLlmClient::generate(self, &request).await?;
        parse_json_completion(&text)
    }
}
