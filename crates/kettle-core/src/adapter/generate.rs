//! The generating adapter: write a new week for a [`UserProfile`].

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{PlanAdapter, request_plan, with_feedback};
use crate::error::PlanError;
use crate::llm::{ContentPart, FAST_MODEL, ModelRequest, QUALITY_MODEL, StructuredModel};
use crate::plan::{WeeklyPlan, plan_response_schema};
use crate::profile::{SportProfile, UserProfile, sport_profile};
use crate::validate::{COOLDOWN_RANGE, WARMUP_RANGE};

/// Reasoning budget for the quality model.
pub const QUALITY_THINKING_BUDGET: u32 = 4096;

// ---------------------------------------------------------------------------
// Model selection
// ---------------------------------------------------------------------------

/// Which model serves a generation, and how much it may think.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub model: String,
    pub thinking_budget: Option<u32>,
}

/// Simple profiles go to the fast model, everything else to the quality
/// model. `override_model` wins when set.
pub fn select_model(profile: &UserProfile, override_model: Option<&str>) -> ModelChoice {
    let model = match override_model.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => model.to_owned(),
        None if profile.is_simple_case() => FAST_MODEL.to_owned(),
        None => QUALITY_MODEL.to_owned(),
    };
    let thinking_budget = (model == QUALITY_MODEL).then_some(QUALITY_THINKING_BUDGET);
    ModelChoice {
        model,
        thinking_budget,
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

fn goal_focus(goal: &str) -> Option<&'static str> {
    match goal {
        "strength" => Some("compound lifts first, 3-5 reps at 85-95% of one-rep max"),
        "aesthetic" | "hypertrophy" => Some("volume work, 6-12 reps at 65-85% of one-rep max"),
        "athletic" => Some("power and strength, explosive work first while fresh"),
        "health" | "general" => Some("balanced full-body work at moderate intensity"),
        _ => None,
    }
}

fn pain_protocol(pain_point: &str) -> String {
    let lower = pain_point.to_lowercase();
    if lower.contains("knee") {
        "knee: AVOID deep squats, lunges and jumping".to_owned()
    } else if lower.contains("back") {
        "lower back: AVOID deadlifts, bent-over rows and good mornings".to_owned()
    } else if lower.contains("shoulder") {
        "shoulder: AVOID overhead press, dips and upright rows".to_owned()
    } else {
        format!("{pain_point}: AVOID anything that aggravates it")
    }
}

fn sport_section(out: &mut String, sport: &str, profile: Option<&SportProfile>) {
    let Some(profile) = profile else {
        let _ = write!(out, "\nSPORT: {sport}. Include sport-specific conditioning.");
        return;
    };
    let priorities: Vec<String> = profile.priority_names().collect();
    let _ = write!(
        out,
        "\nSPORT: {} ({})",
        profile.display_name, profile.focus
    );
    let quantifier = if profile.competition {
        "every one of"
    } else {
        "at least one of"
    };
    let _ = write!(
        out,
        "\n- Include {quantifier}: {}",
        priorities.join(", ")
    );
    if !profile.mobility.is_empty() {
        let _ = write!(out, "\n- Warmup mobility: {}", profile.mobility.join(", "));
    }
    if !profile.conditioning.is_empty() {
        let _ = write!(out, "\n- Conditioning: {}", profile.conditioning);
    }
    if !profile.avoid.is_empty() {
        let _ = write!(out, "\n- AVOID: {}", profile.avoid.join(", "));
    }
}

/// Compressed system instructions for generating a plan for `profile`.
pub fn generator_instructions(profile: &UserProfile) -> String {
    let goal = profile.goal();
    let mut out = String::from("Create a 7-day training plan.\n");

    let _ = write!(
        out,
        "USER: goal={goal}, exp={}, freq={}, sex={}",
        profile.experience(),
        profile.frequency,
        profile.sex.as_deref().unwrap_or("unspecified")
    );
    if let Some(equipment) = profile.equipment.as_deref() {
        let _ = write!(out, ", equip={equipment}");
    }
    let pains: Vec<&str> = profile.pain_points().collect();
    if !pains.is_empty() {
        let _ = write!(out, ", injuries={}", pains.join(","));
    }
    if let Some(sport) = profile.sport() {
        let _ = write!(out, ", sport={sport}");
    }
    if let Some(notes) = profile.additional_notes.as_deref() {
        let _ = write!(out, "\nNOTES: {notes}");
    }

    let (warm_lo, warm_hi) = WARMUP_RANGE;
    let (cool_lo, cool_hi) = COOLDOWN_RANGE;
    let _ = write!(
        out,
        "\nRULES:\
         \n- 7 days (day_of_week 1-7). Exactly {} training days; rest days have focus \"Rest\" and empty blocks.\
         \n- Blocks: single, superset (rounds; only the last member rests) or amrap (duration_minutes).\
         \n- Every exercise has a category: warmup, main or cooldown. Order warmup -> main -> cooldown.\
         \n- Each training day starts with {warm_lo}-{warm_hi} specific warmup exercises (no \"General Warmup\").\
         \n- End each training day with {cool_lo}-{cool_hi} cooldown stretches.\
         \n- Cover squat, hinge, push, pull, carry and core across the week.",
        profile.frequency
    );
    if let Some(focus) = goal_focus(&goal) {
        let _ = write!(out, "\n- Focus: {focus}.");
    }
    if let Some(length) = profile.session_length {
        let (lo, hi) = length.exercise_band();
        let _ = write!(
            out,
            "\n- SESSION: {length} minutes of lifting. {lo}-{hi} main exercises per training day, \
             {} supersets, {}s rest between sets.",
            length.superset_range(),
            length.rest_range_s()
        );
    }
    if !pains.is_empty() {
        out.push_str("\nPAIN PROTOCOL:");
        for pain in &pains {
            let _ = write!(out, "\n- {}", pain_protocol(pain));
        }
    }
    if let Some(sport) = profile.sport() {
        sport_section(&mut out, sport, sport_profile(sport));
    }

    out.push_str("\nReturn only the JSON plan.");
    out
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Generates a week for one profile.
pub struct GenerateAdapter {
    model: Arc<dyn StructuredModel>,
    profile: UserProfile,
    choice: ModelChoice,
    instructions: String,
}

impl GenerateAdapter {
    pub fn new(model: Arc<dyn StructuredModel>, profile: UserProfile) -> Self {
        let choice = select_model(&profile, None);
        let instructions = generator_instructions(&profile);
        Self {
            model,
            profile,
            choice,
            instructions,
        }
    }

    /// Use `model` instead of the automatic choice.
    #[must_use]
    pub fn with_model_override(mut self, model: Option<&str>) -> Self {
        self.choice = select_model(&self.profile, model);
        self
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn choice(&self) -> &ModelChoice {
        &self.choice
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    fn request(&self, feedback: Option<&str>) -> ModelRequest {
        ModelRequest::new(
            with_feedback(self.instructions.clone(), feedback),
            plan_response_schema().clone(),
        )
        .with_part(ContentPart::text("Generate the plan for this profile."))
        .with_model(Some(self.choice.model.clone()))
        .with_thinking_budget(self.choice.thinking_budget)
    }
}

#[async_trait]
impl PlanAdapter for GenerateAdapter {
    fn name(&self) -> &str {
        "generate"
    }

    async fn produce(&self, feedback: Option<&str>) -> Result<WeeklyPlan, PlanError> {
        info!(
            backend = self.model.name(),
            model = %self.choice.model,
            goal = %self.profile.goal(),
            retry = feedback.is_some(),
            "generating plan"
        );
        request_plan(self.model.as_ref(), &self.request(feedback)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
