pub mod food_analysis;
pub mod health_chat;
pub mod plan_generation;

pub use food_analysis::FoodAnalysisHandler;
pub use health_chat::HealthChatHandler;
pub use plan_generation::PlanGenerationHandler;

use crate::error::{ErrorKind, PipelineError};
use crate::services::fingerprint;

const RAW_PREVIEW_CHARS: usize = 2000;

/// Per-request pipeline stages. Any stage may end in failure; none is retried or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Built,
    Sent,
    Received,
    Extracted,
    Validated,
    Assembled,
    Done,
}

/// Tracks and logs the stage of one request.
#[derive(Debug)]
pub struct PipelineTrace {
    operation: &'static str,
    stage: Stage,
}

impl PipelineTrace {
    pub fn start(operation: &'static str) -> Self {
        log::debug!("🔧 [{}] {:?}", operation, Stage::Built);
        Self {
            operation,
            stage: Stage::Built,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{:?} cannot follow {:?}", next, self.stage);
        log::debug!("🔧 [{}] {:?} -> {:?}", self.operation, self.stage, next);
        self.stage = next;
    }

    /// Logs the failure at the current stage and hands the error back.
    pub fn fail(&self, error: impl Into<PipelineError>) -> PipelineError {
        let error = error.into();
        match error.kind() {
            ErrorKind::InputInvalid => {
                log::info!("🚫 [{}] rejected input: {}", self.operation, error)
            }
            ErrorKind::Provider => {
                log::error!("❌ [{}] failed after {:?}: {}", self.operation, self.stage(), error)
            }
            ErrorKind::Contract => {
                log::warn!("⚠️ [{}] failed after {:?}: {}", self.operation, self.stage(), error)
            }
        }
        error
    }

    /// Like [`fail`](Self::fail), also logging the model output that broke the contract.
    pub fn fail_with_raw(&self, error: impl Into<PipelineError>, raw: &str) -> PipelineError {
        log::warn!(
            "📄 [{}] unusable AI response {}: {}",
            self.operation,
            fingerprint(raw),
            preview(raw, RAW_PREVIEW_CHARS)
        );
        self.fail(error)
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}… ({} bytes total)", &text[..cut], text.len()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    #[test]
    fn test_trace_advances_and_returns_error() {
        let mut trace = PipelineTrace::start("test");
        assert_eq!(trace.stage(), Stage::Built);

        trace.advance(Stage::Sent);
        let err = trace.fail(GatewayError::EmptyCompletion);

        assert_eq!(trace.stage(), Stage::Sent);
        assert_eq!(err.kind(), ErrorKind::Provider);
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("çãõé", 2), "çã… (8 bytes total)");
    }
}
