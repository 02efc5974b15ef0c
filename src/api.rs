use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{ErrorKind, PipelineError};
use crate::handlers::{FoodAnalysisHandler, HealthChatHandler, PlanGenerationHandler};
use crate::models::{PlanHorizon, UserProfile};
use crate::services::ModelGateway;

/// Largest accepted request body; photos arrive inline as data URIs.
const BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct AnalyzeFoodRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// `message` stays untyped so a non-string value can be told apart from a broken body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub user_profile: UserProfile,
    pub plan_type: PlanHorizon,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse<T> {
    pub plan: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Caller-facing messages for each failure kind of one endpoint.
struct FailureMessages {
    input_invalid: &'static str,
    provider: &'static str,
    contract: &'static str,
}

const IMAGE_MISSING: &str = "Imagem não fornecida";
const CONTRACT_FAILURE: &str = "Erro ao processar resposta da IA";

const ANALYZE_FAILURES: FailureMessages = FailureMessages {
    input_invalid: "Formato de imagem inválido",
    provider: "Erro ao analisar imagem com IA",
    contract: CONTRACT_FAILURE,
};

const CHAT_FAILURES: FailureMessages = FailureMessages {
    input_invalid: "Invalid message",
    provider: "Internal server error",
    contract: "Internal server error",
};

const MEAL_PLAN_FAILURES: FailureMessages = FailureMessages {
    input_invalid: "Perfil de usuário inválido",
    provider: "Erro ao gerar plano alimentar",
    contract: CONTRACT_FAILURE,
};

const WORKOUT_PLAN_FAILURES: FailureMessages = FailureMessages {
    input_invalid: "Perfil de usuário inválido",
    provider: "Erro ao gerar plano de treino",
    contract: CONTRACT_FAILURE,
};

pub struct AppState {
    pub food: FoodAnalysisHandler,
    pub chat: HealthChatHandler,
    pub plans: PlanGenerationHandler,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &AppConfig) -> Self {
        Self {
            food: FoodAnalysisHandler::new(
                gateway.clone(),
                config.models.vision.clone(),
                config.response_language.clone(),
            ),
            chat: HealthChatHandler::new(gateway.clone(), config.models.chat.clone()),
            plans: PlanGenerationHandler::new(
                gateway,
                config.models.plan.clone(),
                config.response_language.clone(),
            ),
        }
    }
}

pub mod server {
    use super::*;
    use axum::{
        extract::{DefaultBodyLimit, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use tower_http::cors::CorsLayer;

    pub fn create_router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_check))
            .route("/analyze-food", post(analyze_food))
            .route("/chat", post(chat))
            .route("/generate-meal-plan", post(generate_meal_plan))
            .route("/generate-workout-plan", post(generate_workout_plan))
            .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    async fn analyze_food(State(state): State<Arc<AppState>>, body: String) -> Response {
        let request: AnalyzeFoodRequest = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("⚠️ Malformed analyze-food body: {}", e);
                return error_response(StatusCode::BAD_REQUEST, ANALYZE_FAILURES.input_invalid);
            }
        };

        let Some(image) = request.image.filter(|image| !image.trim().is_empty()) else {
            return error_response(StatusCode::BAD_REQUEST, IMAGE_MISSING);
        };

        match state.food.analyze(&image).await {
            Ok(estimate) => (StatusCode::OK, Json(estimate)).into_response(),
            Err(e) => failure_response(&e, &ANALYZE_FAILURES),
        }
    }

    async fn chat(State(state): State<Arc<AppState>>, body: String) -> Response {
        let message = match serde_json::from_str::<ChatRequest>(&body) {
            Ok(ChatRequest {
                message: serde_json::Value::String(message),
            }) if !message.trim().is_empty() => message,
            _ => return error_response(StatusCode::BAD_REQUEST, CHAT_FAILURES.input_invalid),
        };

        match state.chat.answer(&message).await {
            Ok(response) => (StatusCode::OK, Json(ChatResponse { response })).into_response(),
            Err(e) => failure_response(&e, &CHAT_FAILURES),
        }
    }

    async fn generate_meal_plan(State(state): State<Arc<AppState>>, body: String) -> Response {
        let request = match parse_plan_request(&body, &MEAL_PLAN_FAILURES) {
            Ok(r) => r,
            Err(response) => return response,
        };

        match state
            .plans
            .generate_meal_plan(&request.user_profile, request.plan_type)
            .await
        {
            Ok(plan) => (StatusCode::OK, Json(PlanResponse { plan })).into_response(),
            Err(e) => failure_response(&e, &MEAL_PLAN_FAILURES),
        }
    }

    async fn generate_workout_plan(State(state): State<Arc<AppState>>, body: String) -> Response {
        let request = match parse_plan_request(&body, &WORKOUT_PLAN_FAILURES) {
            Ok(r) => r,
            Err(response) => return response,
        };

        match state
            .plans
            .generate_workout_plan(&request.user_profile, request.plan_type)
            .await
        {
            Ok(plan) => (StatusCode::OK, Json(PlanResponse { plan })).into_response(),
            Err(e) => failure_response(&e, &WORKOUT_PLAN_FAILURES),
        }
    }

    fn parse_plan_request(body: &str, messages: &FailureMessages) -> Result<PlanRequest, Response> {
        serde_json::from_str(body).map_err(|e| {
            log::warn!("⚠️ Malformed plan request: {}", e);
            error_response(StatusCode::BAD_REQUEST, messages.input_invalid)
        })
    }

    /// Maps a pipeline failure to a status and a safe message. Provider detail and raw
    /// model output stay in the logs.
    fn failure_response(error: &PipelineError, messages: &FailureMessages) -> Response {
        let (status, message) = match error.kind() {
            ErrorKind::InputInvalid => (StatusCode::BAD_REQUEST, messages.input_invalid),
            ErrorKind::Provider => (StatusCode::INTERNAL_SERVER_ERROR, messages.provider),
            ErrorKind::Contract => (StatusCode::INTERNAL_SERVER_ERROR, messages.contract),
        };
        error_response(status, message)
    }

    fn error_response(status: StatusCode, message: &str) -> Response {
        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }

    async fn root_handler() -> &'static str {
        "NutriTracker AI service - POST /analyze-food, /chat, /generate-meal-plan, /generate-workout-plan"
    }

    async fn health_check() -> &'static str {
        "OK"
    }
}
