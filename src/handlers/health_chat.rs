use std::sync::Arc;

use crate::error::{GatewayError, PipelineError};
use crate::handlers::{PipelineTrace, Stage};
use crate::services::{prompts, CompletionRequest, ModelGateway};

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

/// Answer returned when the provider succeeds but says nothing.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate a response.";

/// Stateless, domain-scoped health Q&A. Free text is the contract, no JSON involved.
pub struct HealthChatHandler {
    gateway: Arc<dyn ModelGateway>,
    model: String,
}

impl HealthChatHandler {
    pub fn new(gateway: Arc<dyn ModelGateway>, model: String) -> Self {
        Self { gateway, model }
    }

    pub async fn answer(&self, message: &str) -> Result<String, PipelineError> {
        let mut trace = PipelineTrace::start("health_chat");
        let question = message.trim();
        if question.is_empty() {
            return Err(trace.fail(PipelineError::InputInvalid("message is empty".to_string())));
        }

        log::info!("💬 Chat question received ({} chars)", question.chars().count());

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: prompts::health_chat(question),
            json_mode: false,
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
        };

        trace.advance(Stage::Sent);
        let raw = match self.gateway.complete(&request).await {
            Ok(raw) => raw,
            Err(GatewayError::EmptyCompletion) => {
                log::warn!("⚠️ Empty chat completion, using fallback answer");
                String::new()
            }
            Err(e) => return Err(trace.fail(e)),
        };
        trace.advance(Stage::Received);

        let answer = raw.trim();
        trace.advance(Stage::Extracted);
        let answer = if answer.is_empty() { FALLBACK_ANSWER } else { answer };
        trace.advance(Stage::Validated);
        trace.advance(Stage::Assembled);
        trace.advance(Stage::Done);

        Ok(answer.to_string())
    }
}
