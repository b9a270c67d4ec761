//! The parsing adapter: structure a plan the user already has.
//!
//! Input text is normalized and analysed locally first ([`PreparedInput`]);
//! the detected format, colloquial-term hints and notation cues are folded
//! into the system instructions so the model does not have to rediscover
//! them. Files (PDFs, screenshots) travel as inline-data parts.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{PlanAdapter, request_plan, with_feedback};
use crate::dictionary::Dictionary;
use crate::error::PlanError;
use crate::llm::{ContentPart, ModelRequest, StructuredModel};
use crate::normalize::{identify_colloquial_terms, resolve_abbreviations};
use crate::notation::{NotationCue, WorkoutFormat, detect_workout_format, scan_notation};
use crate::plan::{WeeklyPlan, plan_response_schema};

/// Reasoning budget used when thinking is enabled for hard inputs.
pub const PARSE_THINKING_BUDGET: u32 = 8192;

// ---------------------------------------------------------------------------
// Input preparation
// ---------------------------------------------------------------------------

/// Plan text after local analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInput {
    /// The text as the user wrote it.
    pub original: String,
    /// The text with abbreviations expanded.
    pub normalized: String,
    pub format: WorkoutFormat,
    /// Lowercased colloquial phrase -> meaning.
    pub colloquial: BTreeMap<String, String>,
    pub cues: Vec<NotationCue>,
}

impl PreparedInput {
    /// Normalize `text` and analyse it.
    ///
    /// Format detection and the cue scan both run on the raw text, where
    /// shorthand such as "E2MOM", "@ 80%" and "RPE 8" is still intact.
    pub fn new(dict: &Dictionary, text: &str) -> Self {
        let normalized = resolve_abbreviations(dict, text).into_owned();
        let format = detect_workout_format(text);
        let colloquial = identify_colloquial_terms(dict, text);
        let cues = scan_notation(text);
        debug!(
            format = %format,
            colloquial = colloquial.len(),
            cues = cues.len(),
            "prepared plan text"
        );
        Self {
            original: text.to_owned(),
            normalized,
            format,
            colloquial,
            cues,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.trim().is_empty()
    }
}

/// A file handed to the model as inline data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PlanFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// MIME type for a plan file, from its extension. `None` for formats the
/// model cannot read.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        _ => return None,
    };
    Some(mime)
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

const PARSER_PREAMBLE: &str = "\
You are a workout plan parser. Convert the user's plan, in whatever format it \
arrives (coach's notes, tables, app exports, screenshots, handwritten notes), \
into the JSON structure defined by the response schema.

RULES:
1. Every exercise has a category: \"warmup\", \"main\" or \"cooldown\".
2. The weeklyPlan always has 7 days, day_of_week 1 (Monday) to 7 (Sunday). \
Days the plan does not mention are rest days with focus \"Rest\" and empty blocks.
3. Never return empty blocks on a day that is not a rest or recovery day.
4. If the user lists specific exercises, parse exactly what they wrote. Do not add extras.
5. If the plan does not give sets or reps, infer sensible ones \
(\"Bench press\" -> 3 sets of 8-10).
6. Translate exercise names to English and fix obvious typos.
7. Pick the metrics_template type that matches the exercise: sets_reps_weight for \
loaded strength work, sets_reps for bodyweight, sets_duration for holds, \
sets_distance_rest for repeated distances, duration_only for steady cardio and \
distance_time for runs or rows over a distance.

BLOCKS:
- \"single\": straight sets.
- \"superset\": exercises done back to back (A1/A2, B1/B2). Set rounds to the \
number of times the group repeats. Every member except the last has \
rest_period_s 0; the last member carries the rest between rounds.
- \"amrap\": as many rounds as possible inside duration_minutes.

SINGLE SESSION: when the user describes a single session (\"chest today\", \
\"leg day\"), put it on day 1 as the only training day. Give it a warmup block \
of 5-7 specific warmup exercises and a main block of 3-4 exercises for the \
named muscle group. The other six days are rest days.";

/// System instructions for parsing `input`.
pub fn parser_instructions(input: &PreparedInput) -> String {
    let mut out = String::from(PARSER_PREAMBLE);

    let _ = write!(
        out,
        "\n\nDETECTED FORMAT: {} ({}).",
        input.format,
        input.format.description()
    );

    if !input.colloquial.is_empty() {
        out.push_str("\n\nTERMS IN THIS PLAN:");
        for (term, meaning) in &input.colloquial {
            let _ = write!(out, "\n- \"{term}\": {meaning}");
        }
    }

    if !input.cues.is_empty() {
        out.push_str("\n\nNOTATION FOUND:");
        for cue in &input.cues {
            let _ = write!(out, "\n- {cue}");
        }
    }

    out.push_str("\n\nReturn only the JSON plan.");
    out
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Structures user-supplied plan text and files.
pub struct ParseAdapter {
    model: Arc<dyn StructuredModel>,
    input: PreparedInput,
    files: Vec<PlanFile>,
    model_override: Option<String>,
    thinking_budget: Option<u32>,
    instructions: String,
}

impl ParseAdapter {
    pub fn new(model: Arc<dyn StructuredModel>, input: PreparedInput) -> Self {
        let instructions = parser_instructions(&input);
        Self {
            model,
            input,
            files: Vec::new(),
            model_override: None,
            thinking_budget: None,
            instructions,
        }
    }

    #[must_use]
    pub fn with_files(mut self, files: Vec<PlanFile>) -> Self {
        self.files = files;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model_override = model;
        self
    }

    /// Let the model reason before answering. Slower, better on messy input.
    #[must_use]
    pub fn with_thinking(mut self, enabled: bool) -> Self {
        self.thinking_budget = enabled.then_some(PARSE_THINKING_BUDGET);
        self
    }

    pub fn input(&self) -> &PreparedInput {
        &self.input
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    fn request(&self, feedback: Option<&str>) -> ModelRequest {
        let mut request = ModelRequest::new(
            with_feedback(self.instructions.clone(), feedback),
            plan_response_schema().clone(),
        )
        .with_model(self.model_override.clone())
        .with_thinking_budget(self.thinking_budget);

        if !self.input.is_empty() {
            request = request.with_part(ContentPart::text(format!(
                "USER'S PLAN TO PARSE:\n---\n{}",
                self.input.normalized
            )));
        }
        for file in &self.files {
            request = request.with_part(ContentPart::InlineData {
                mime_type: file.mime_type.clone(),
                data: file.data.clone(),
            });
        }
        request
    }
}

#[async_trait]
impl PlanAdapter for ParseAdapter {
    fn name(&self) -> &str {
        "parse"
    }

    async fn produce(&self, feedback: Option<&str>) -> Result<WeeklyPlan, PlanError> {
        info!(
            backend = self.model.name(),
            format = %self.input.format,
            files = self.files.len(),
            retry = feedback.is_some(),
            "parsing plan"
        );
        request_plan(self.model.as_ref(), &self.request(feedback)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
