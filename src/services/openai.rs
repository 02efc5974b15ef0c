use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::services::ai_service::{CompletionRequest, ModelGateway};
use crate::services::fingerprint;
use crate::services::prompts::Prompt;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageData },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint (OpenAI, OpenRouter).
pub struct OpenAIService {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIService {
    pub fn new(config: &AppConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::TransportFailure(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn build_request(request: &CompletionRequest) -> ChatRequest {
        let Prompt {
            system,
            instruction,
            image,
        } = &request.prompt;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(system.clone()),
            });
        }

        let user_content = match image {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: instruction.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageData { url: url.clone() },
                },
            ]),
            None => MessageContent::Text(instruction.clone()),
        };
        messages.push(ChatMessage {
            role: "user",
            content: user_content,
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

#[async_trait::async_trait]
impl ModelGateway for OpenAIService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let Some(api_key) = self.api_key.as_deref() else {
            log::error!("❌ No provider credential configured, rejecting request for {}", request.model);
            return Err(GatewayError::ProviderRejected {
                status: None,
                detail: "OPENAI_API_KEY is not configured".to_string(),
            });
        };

        let body = Self::build_request(request);
        if let Some(image) = request.prompt.image.as_deref() {
            log::debug!("🖼️ Attaching image {} ({} bytes)", fingerprint(image), image.len());
        }
        log::info!("🤖 Sending request to provider with model: {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Provider unreachable: {}", e);
                GatewayError::TransportFailure(e.to_string())
            })?;

        let status = response.status();
        log::debug!("📥 Provider response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            log::error!("❌ Provider API error ({}): {}", status, detail);
            return Err(GatewayError::ProviderRejected {
                status: Some(status.as_u16()),
                detail,
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            log::error!("❌ Undecodable provider response: {}", e);
            GatewayError::TransportFailure(format!("undecodable provider response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyCompletion)?;

        log::debug!("💬 Provider returned {} bytes", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn service(base_url: String, api_key: Option<&str>) -> OpenAIService {
        let config = AppConfig {
            api_key: api_key.map(str::to_string),
            base_url,
            request_timeout: Duration::from_secs(5),
            ..AppConfig::default()
        };
        OpenAIService::new(&config).unwrap()
    }

    fn request(json_mode: bool) -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            prompt: Prompt {
                system: Some("be brief".to_string()),
                instruction: "hello".to_string(),
                image: None,
            },
            json_mode,
            max_tokens: Some(300),
            temperature: None,
        }
    }

    #[test]
    fn test_vision_request_shape() {
        let mut req = request(false);
        req.prompt.system = None;
        req.prompt.image = Some("data:image/jpeg;base64,AAAA".to_string());

        let body = serde_json::to_value(OpenAIService::build_request(&req)).unwrap();

        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(body["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            body["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_successful_completion_in_json_mode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "response_format": { "type": "json_object" },
                "max_tokens": 300
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"plan\":[]}"}}]}"#)
            .create_async()
            .await;

        let gateway = service(server.url(), Some("test-key"));
        let text = gateway.complete(&request(true)).await.unwrap();

        assert_eq!(text, r#"{"plan":[]}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_provider_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
            .create_async()
            .await;

        let gateway = service(server.url(), Some("test-key"));
        let err = gateway.complete(&request(false)).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::ProviderRejected {
                status: Some(429),
                detail: "Rate limit reached".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let gateway = service(server.url(), None);
        let err = gateway.complete(&request(false)).await.unwrap_err();

        assert!(matches!(err, GatewayError::ProviderRejected { status: None, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_or_blank_content_is_empty_completion() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
            .create_async()
            .await;
        let gateway = service(server.url(), Some("k"));
        assert_eq!(
            gateway.complete(&request(false)).await.unwrap_err(),
            GatewayError::EmptyCompletion
        );

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;
        let gateway = service(server.url(), Some("k"));
        assert_eq!(
            gateway.complete(&request(false)).await.unwrap_err(),
            GatewayError::EmptyCompletion
        );
    }

    #[tokio::test]
    async fn test_garbage_body_is_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let gateway = service(server.url(), Some("k"));
        let err = gateway.complete(&request(false)).await.unwrap_err();

        assert!(matches!(err, GatewayError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_failure() {
        let gateway = service("http://127.0.0.1:1".to_string(), Some("k"));
        let err = gateway.complete(&request(false)).await.unwrap_err();

        assert!(matches!(err, GatewayError::TransportFailure(_)));
    }
}
