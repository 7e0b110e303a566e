//! LLM backends and the failover client.
//!
//! Two HTTP backends are provided: [`OpenAiBackend`] (primary) and
//! [`AnthropicBackend`] (fallback). [`FallbackLlmClient`] combines them with
//! sticky failover.

mod anthropic;
mod fallback;
mod http;
mod json;
mod openai;
mod types;

pub use anthropic::AnthropicBackend;
pub use fallback::FallbackLlmClient;
pub use json::{extract_json, parse_json_completion};
pub use openai::OpenAiBackend;
pub use types::{GenerateRequest, Message, MessageRole};

use async_trait::async_trait;

use crate::error::LlmResult;

/// A text-generation backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Generate a completion for the request.
    async fn generate(&self, request: &GenerateRequest) -> LlmResult<String>;

    /// Generate a completion and parse it as JSON.
    ///
    /// Parse failures are reported as `InvalidResponse`.
    async fn generate_json(&self, request: &GenerateRequest) -> LlmResult<serde_json::Value> {
        let request = request.clone().with_json_mode(true);
        let text = self.generate(&request).await?;
        parse_json_completion(&text)
    }
}
