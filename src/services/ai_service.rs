use crate::error::GatewayError;
use crate::services::prompts::Prompt;

/// One completion call: which model, what to send, and how.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: Prompt,
    /// Ask the provider to enforce JSON-only output.
    pub json_mode: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Trait for model providers (OpenAI, OpenRouter, etc.)
///
/// Prompt in, raw text out. Implementations never retry.
#[async_trait::async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}
