//! Plan adapters: turn user input into a schema-conformant [`WeeklyPlan`].
//!
//! An adapter owns everything about one model call: the fixed system
//! instructions, the user content, the response schema and the decoding of
//! the answer. The retry loop only sees [`PlanAdapter::produce`] and feeds
//! back validation errors from the previous attempt.
//!
//! - [`ParseAdapter`] structures a plan the user already has (text or files).
//! - [`GenerateAdapter`] writes a new plan for a [`crate::profile::UserProfile`].

pub mod generate;
pub mod parse;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::PlanError;
use crate::llm::{ModelRequest, StructuredModel};
use crate::plan::{WeeklyPlan, decode_plan, extract_json};

pub use generate::{GenerateAdapter, ModelChoice, generator_instructions, select_model};
pub use parse::{
    PARSE_THINKING_BUDGET, ParseAdapter, PlanFile, PreparedInput, mime_type_for_path,
    parser_instructions,
};

/// Produces one candidate plan per call.
#[async_trait]
pub trait PlanAdapter: Send + Sync {
    /// Adapter name for logs (e.g. "parse").
    fn name(&self) -> &str;

    /// Produce a candidate plan. `feedback` carries corrective instructions
    /// from the previous attempt and is appended verbatim to the system
    /// instructions.
    async fn produce(&self, feedback: Option<&str>) -> Result<WeeklyPlan, PlanError>;
}

// Compile-time assertion: PlanAdapter must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanAdapter) {}
};

/// `instructions` followed by `feedback`, when there is any.
pub(crate) fn with_feedback(instructions: String, feedback: Option<&str>) -> String {
    match feedback {
        Some(feedback) if !feedback.is_empty() => format!("{instructions}{feedback}"),
        _ => instructions,
    }
}

/// Run `request` and decode the answer into a plan.
pub(crate) async fn request_plan(
    model: &dyn StructuredModel,
    request: &ModelRequest,
) -> Result<WeeklyPlan, PlanError> {
    let output = model.generate(request).await.map_err(|e| {
        error!(backend = model.name(), error = %e, detail = e.detail(), "model call failed");
        PlanError::from(e)
    })?;
    debug!(
        backend = model.name(),
        model = %output.model,
        finish_reason = output.finish_reason.as_deref().unwrap_or("unknown"),
        chars = output.text.len(),
        "model answered"
    );

    let plan = extract_json(&output.text)
        .and_then(decode_plan)
        .map_err(|e| {
            error!(backend = model.name(), error = %e, "model output does not fit the plan schema");
            PlanError::from(e)
        })?;
    Ok(plan)
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedModel;
    use super::*;
    use crate::llm::{ModelError, UpstreamCategory};
    use serde_json::json;

    #[test]
    fn feedback_is_appended_verbatim() {
        assert_eq!(with_feedback("base".into(), None), "base");
        assert_eq!(with_feedback("base".into(), Some("")), "base");
        assert_eq!(with_feedback("base".into(), Some("\n\nfix it")), "base\n\nfix it");
    }

    #[tokio::test]
    async fn request_plan_decodes_fenced_output() {
        let plan = json!({
            "name": "Rest week",
            "weeklyPlan": [{"day_of_week": 1, "focus": "Rest", "blocks": []}],
        });
        let model = ScriptedModel::answering(format!("```json\n{plan}\n```"));
        let request = ModelRequest::new("parse", json!({"type": "object"}));
        let decoded = request_plan(&model, &request).await.unwrap();
        assert_eq!(decoded.name, "Rest week");
        assert_eq!(decoded.weekly_plan.len(), 1);
    }

    #[tokio::test]
    async fn request_plan_rejects_prose() {
        let model = ScriptedModel::answering("Sorry, I can't help with that.");
        let request = ModelRequest::new("parse", json!({"type": "object"}));
        let err = request_plan(&model, &request).await.unwrap_err();
        assert!(matches!(err, PlanError::SchemaViolation { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn request_plan_passes_upstream_errors_through() {
        let model = ScriptedModel::new(vec![Err(ModelError::upstream(
            UpstreamCategory::InvalidCredentials,
            "HTTP 401",
        ))]);
        let request = ModelRequest::new("parse", json!({"type": "object"}));
        let err = request_plan(&model, &request).await.unwrap_err();
        assert!(matches!(
            err,
            PlanError::Upstream {
                category: UpstreamCategory::InvalidCredentials,
                ..
            }
        ));
    }
}
