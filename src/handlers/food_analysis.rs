use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use std::sync::Arc;

use crate::error::PipelineError;
use crate::handlers::{PipelineTrace, Stage};
use crate::models::NutritionEstimate;
use crate::services::extractor::extract_json_object;
use crate::services::validator::validate_nutrition;
use crate::services::{fingerprint, prompts, CompletionRequest, ModelGateway};

const MAX_TOKENS: u32 = 1000;

/// Standard alphabet, padding optional: browsers and clients disagree on trailing `=`.
const IMAGE_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Photo of a meal -> nutrition estimate.
pub struct FoodAnalysisHandler {
    gateway: Arc<dyn ModelGateway>,
    model: String,
    language: String,
}

impl FoodAnalysisHandler {
    pub fn new(gateway: Arc<dyn ModelGateway>, model: String, language: String) -> Self {
        Self {
            gateway,
            model,
            language,
        }
    }

    pub async fn analyze(&self, image: &str) -> Result<NutritionEstimate, PipelineError> {
        let image = image.trim();
        let mut trace = PipelineTrace::start("food_analysis");
        check_image(image).map_err(|e| trace.fail(e))?;

        log::info!("📸 Starting image analysis for {} ({} bytes)", fingerprint(image), image.len());

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: prompts::food_analysis(image, &self.language),
            json_mode: false,
            max_tokens: Some(MAX_TOKENS),
            temperature: None,
        };

        trace.advance(Stage::Sent);
        let raw = self.gateway.complete(&request).await.map_err(|e| trace.fail(e))?;
        trace.advance(Stage::Received);

        let object = extract_json_object(&raw).map_err(|e| trace.fail_with_raw(e, &raw))?;
        trace.advance(Stage::Extracted);

        let estimate = validate_nutrition(&object).map_err(|e| trace.fail_with_raw(e, &raw))?;
        trace.advance(Stage::Validated);

        // A single estimate has nothing to assemble.
        trace.advance(Stage::Assembled);
        trace.advance(Stage::Done);

        log::info!("✅ Identified '{}' ({} kcal)", estimate.food, estimate.calories);
        Ok(estimate)
    }
}

/// Accepts `data:image/<type>;base64,<payload>` with a decodable payload, or an http(s) URL.
fn check_image(image: &str) -> Result<(), PipelineError> {
    if image.is_empty() {
        return Err(PipelineError::InputInvalid("image is empty".to_string()));
    }

    if image.starts_with("https://") || image.starts_with("http://") {
        return Ok(());
    }

    let Some(rest) = image.strip_prefix("data:") else {
        return Err(PipelineError::InputInvalid(
            "image must be a data URI or an http(s) URL".to_string(),
        ));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PipelineError::InputInvalid("data URI has no payload".to_string()))?;

    if !header.starts_with("image/") || !header.ends_with(";base64") {
        return Err(PipelineError::InputInvalid(format!(
            "unsupported data URI header '{}'",
            header
        )));
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = IMAGE_PAYLOAD
        .decode(payload.as_bytes())
        .map_err(|e| PipelineError::InputInvalid(format!("image payload is not base64: {}", e)))?;

    if decoded.is_empty() {
        return Err(PipelineError::InputInvalid("image payload is empty".to_string()));
    }

    log::debug!("📊 Image payload decoded: {} bytes", decoded.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GatewayError};
    use crate::services::ai_service::mock::ScriptedGateway;

    const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

    fn handler(gateway: Arc<ScriptedGateway>) -> FoodAnalysisHandler {
        FoodAnalysisHandler::new(gateway, "vision-model".to_string(), "English".to_string())
    }

    #[test]
    fn test_check_image() {
        assert!(check_image(IMAGE).is_ok());
        assert!(check_image("https://example.com/meal.jpg").is_ok());
        assert!(check_image("").is_err());
        assert!(check_image("not an image").is_err());
        assert!(check_image("data:image/png;base64").is_err());
        assert!(check_image("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(check_image("data:image/png;base64,@@@").is_err());
        assert!(check_image("data:image/png;base64,").is_err());
        assert!(check_image("data:image/png;base64,aGVsbG8").is_ok());
        assert!(check_image("data:image/png;base64,aGVsbG8=").is_ok());
    }

    #[tokio::test]
    async fn test_fenced_response_is_parsed() {
        let gateway = Arc::new(ScriptedGateway::replying(
            "Sure! ```json\n{\"food\":\"rice\",\"quantityGrams\":150,\"proteinG\":4,\"calories\":195}\n```",
        ));
        let estimate = handler(gateway.clone()).analyze(IMAGE).await.unwrap();

        assert_eq!(estimate.food, "rice");
        assert_eq!(estimate.quantity_grams, 150.0);
        assert_eq!(estimate.calories, 195.0);
        assert_eq!(estimate.fat_g, 0.0);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "vision-model");
        assert_eq!(requests[0].max_tokens, Some(1000));
        assert_eq!(requests[0].prompt.image.as_deref(), Some(IMAGE));
    }

    #[tokio::test]
    async fn test_invalid_image_never_reaches_provider() {
        let gateway = Arc::new(ScriptedGateway::replying("{}"));
        let err = handler(gateway.clone()).analyze("   ").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InputInvalid);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_prose_only_response_is_contract_failure() {
        let gateway = Arc::new(ScriptedGateway::replying("I can't tell what food this is, sorry."));
        let err = handler(gateway).analyze(IMAGE).await.unwrap_err();

        assert!(matches!(err, PipelineError::Extraction(_)));
        assert_eq!(err.kind(), ErrorKind::Contract);
    }

    #[tokio::test]
    async fn test_missing_quantity_is_schema_violation() {
        let gateway = Arc::new(ScriptedGateway::replying(r#"{"food": "salad", "calories": 120}"#));
        let err = handler(gateway).analyze(IMAGE).await.unwrap_err();

        match err {
            PipelineError::Schema(violation) => assert_eq!(violation.missing_fields, vec!["quantityGrams"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let gateway = Arc::new(ScriptedGateway::failing(GatewayError::TransportFailure(
            "connection reset".into(),
        )));
        let err = handler(gateway).analyze(IMAGE).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Provider);
    }
}
