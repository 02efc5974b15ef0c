use std::sync::Arc;

use crate::error::{PipelineError, SchemaViolation};
use crate::handlers::{PipelineTrace, Stage};
use crate::models::{MealDay, PlanHorizon, PlanKind, UserProfile, WorkoutDay};
use crate::services::assembler::{assemble, PlanDay};
use crate::services::extractor::{extract_json_object, JsonObject};
use crate::services::prompts::{self, Prompt};
use crate::services::validator::{validate_meal_plan, validate_workout_plan};
use crate::services::{CompletionRequest, ModelGateway};

/// Profile + horizon -> meal plan or workout plan.
///
/// The two plan kinds are independent pipelines; a caller that needs both issues two calls.
pub struct PlanGenerationHandler {
    gateway: Arc<dyn ModelGateway>,
    model: String,
    language: String,
}

impl PlanGenerationHandler {
    pub fn new(gateway: Arc<dyn ModelGateway>, model: String, language: String) -> Self {
        Self {
            gateway,
            model,
            language,
        }
    }

    pub async fn generate_meal_plan(
        &self,
        profile: &UserProfile,
        horizon: PlanHorizon,
    ) -> Result<Vec<MealDay>, PipelineError> {
        self.generate(
            PlanKind::Meal,
            profile,
            horizon,
            prompts::meal_plan,
            validate_meal_plan,
        )
        .await
    }

    pub async fn generate_workout_plan(
        &self,
        profile: &UserProfile,
        horizon: PlanHorizon,
    ) -> Result<Vec<WorkoutDay>, PipelineError> {
        self.generate(
            PlanKind::Workout,
            profile,
            horizon,
            prompts::workout_plan,
            validate_workout_plan,
        )
        .await
    }

    async fn generate<D: PlanDay>(
        &self,
        kind: PlanKind,
        profile: &UserProfile,
        horizon: PlanHorizon,
        build_prompt: fn(&UserProfile, PlanHorizon, &str) -> Prompt,
        validate: fn(&JsonObject, usize) -> Result<Vec<D>, SchemaViolation>,
    ) -> Result<Vec<D>, PipelineError> {
        let mut trace = PipelineTrace::start(match kind {
            PlanKind::Meal => "meal_plan",
            PlanKind::Workout => "workout_plan",
        });
        profile
            .validate()
            .map_err(|reason| trace.fail(PipelineError::InputInvalid(reason)))?;

        log::info!("🗓️ Generating {} {} plan", horizon, kind);

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: build_prompt(profile, horizon, &self.language),
            json_mode: true,
            max_tokens: None,
            temperature: None,
        };

        trace.advance(Stage::Sent);
        let raw = self.gateway.complete(&request).await.map_err(|e| trace.fail(e))?;
        trace.advance(Stage::Received);

        let object = extract_json_object(&raw).map_err(|e| trace.fail_with_raw(e, &raw))?;
        trace.advance(Stage::Extracted);

        let days = validate(&object, horizon.day_count()).map_err(|e| trace.fail_with_raw(e, &raw))?;
        trace.advance(Stage::Validated);

        let plan = assemble(days, horizon, kind.today_label()).map_err(|e| trace.fail_with_raw(e, &raw))?;
        trace.advance(Stage::Assembled);
        trace.advance(Stage::Done);

        log::info!("✅ {} plan ready with {} day(s)", kind, plan.len());
        Ok(plan)
    }
}
