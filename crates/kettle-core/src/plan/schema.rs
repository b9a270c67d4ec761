//! Structured-output schema and the adapter boundary checks.
//!
//! [`plan_response_schema`] is the JSON Schema handed to the model. Model
//! output goes through [`extract_json`] and then [`decode_plan`], which checks
//! conformance against the same schema before deserializing into
//! [`WeeklyPlan`]. Anything failing here is a [`SchemaViolation`], never a
//! validation error.

use std::sync::LazyLock;

use serde_json::{Map, Value, json};
use thiserror::Error;

use super::model::WeeklyPlan;

/// Output that cannot be turned into a [`WeeklyPlan`].
#[derive(Debug, Error)]
pub enum SchemaViolation {
    #[error("model output is not JSON: {0}")]
    NotJson(String),

    #[error("model output does not match the plan schema: {}", .0.join("; "))]
    Mismatch(Vec<String>),

    #[error("model output could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

fn integer() -> Value {
    json!({"type": "integer", "minimum": 0})
}

fn number() -> Value {
    json!({"type": "number", "minimum": 0})
}

fn string() -> Value {
    json!({"type": "string"})
}

fn target_reps() -> Value {
    json!({
        "anyOf": [{"type": "integer", "minimum": 0}, {"type": "string"}],
        "description": "A rep count (8) or a scheme such as \"8-12\" or \"AMRAP\"."
    })
}

/// A closed object schema tagged with `type = tag`.
fn tagged(tag: &str, required: &[&str], properties: Vec<(&str, Value)>) -> Value {
    let mut props = Map::new();
    props.insert("type".into(), json!({"type": "string", "enum": [tag]}));
    for (name, schema) in properties {
        props.insert(name.into(), schema);
    }
    let mut required_fields = vec!["type"];
    required_fields.extend_from_slice(required);
    json!({
        "type": "object",
        "properties": props,
        "required": required_fields,
        "additionalProperties": false
    })
}

fn weighted_fields(tempo: bool) -> Vec<(&'static str, Value)> {
    let mut fields = vec![
        ("target_sets", integer()),
        ("target_reps", target_reps()),
        (
            "one_rep_max_percentage",
            json!({"type": "string", "description": "Percentage of one-rep max, e.g. \"75\" or \"70-75\"."}),
        ),
        ("target_weight_kg", number()),
        ("rest_period_s", integer()),
        ("has_drop_set", json!({"type": "boolean"})),
    ];
    if tempo {
        fields.push((
            "target_tempo",
            json!({"type": "string", "description": "Tempo notation like \"3-1-2-1\"."}),
        ));
    }
    fields
}

fn metrics_template() -> Value {
    json!({
        "anyOf": [
            tagged("sets_reps_weight", &["target_sets", "target_reps"], weighted_fields(false)),
            tagged(
                "sets_reps_weight_tempo",
                &["target_sets", "target_reps", "target_tempo"],
                weighted_fields(true),
            ),
            tagged(
                "sets_reps",
                &["target_sets", "target_reps"],
                vec![
                    ("target_sets", integer()),
                    ("target_reps", target_reps()),
                    ("rest_period_s", integer()),
                ],
            ),
            tagged(
                "sets_distance_rest",
                &["target_sets", "target_distance_m"],
                vec![
                    ("target_sets", integer()),
                    ("target_distance_m", integer()),
                    ("rest_period_s", integer()),
                ],
            ),
            tagged(
                "sets_duration",
                &["target_sets", "target_duration_s"],
                vec![
                    ("target_sets", integer()),
                    ("target_duration_s", integer()),
                    ("rest_period_s", integer()),
                ],
            ),
            tagged(
                "duration_only",
                &["target_duration_minutes"],
                vec![("target_duration_minutes", integer())],
            ),
            tagged(
                "distance_time",
                &[],
                vec![
                    ("target_distance_km", number()),
                    ("target_distance_m", integer()),
                    ("target_time_minutes", number()),
                ],
            ),
        ]
    })
}

fn exercise() -> Value {
    json!({
        "type": "object",
        "properties": {
            "exercise_name": string(),
            "category": {"type": "string", "enum": ["warmup", "main", "cooldown"]},
            "notes": string(),
            "rpe": {"anyOf": [{"type": "string"}, {"type": "number"}]},
            "metrics_template": metrics_template()
        },
        "required": ["exercise_name", "category", "metrics_template"],
        "additionalProperties": false
    })
}

fn block() -> Value {
    let exercises = json!({"type": "array", "items": exercise()});
    json!({
        "anyOf": [
            tagged(
                "single",
                &["exercises"],
                vec![("title", string()), ("exercises", exercises.clone())],
            ),
            tagged(
                "superset",
                &["exercises", "rounds"],
                vec![
                    ("title", string()),
                    ("exercises", exercises.clone()),
                    ("rounds", integer()),
                    ("rest_between_rounds_s", integer()),
                ],
            ),
            tagged(
                "amrap",
                &["exercises", "duration_minutes"],
                vec![
                    ("title", string()),
                    ("exercises", exercises),
                    ("duration_minutes", integer()),
                ],
            ),
        ]
    })
}

static PLAN_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "name": string(),
            "weeklyPlan": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "day_of_week": {"type": "integer", "description": "1 = Monday ... 7 = Sunday"},
                        "focus": string(),
                        "notes": string(),
                        "blocks": {"type": "array", "items": block()}
                    },
                    "required": ["day_of_week", "focus", "blocks"],
                    "additionalProperties": false
                }
            },
            "dailyRoutine": {
                "type": "object",
                "properties": {
                    "focus": string(),
                    "notes": string(),
                    "exercises": {"type": "array", "items": exercise()}
                },
                "required": ["focus", "exercises"],
                "additionalProperties": false
            }
        },
        "required": ["name", "weeklyPlan"],
        "additionalProperties": false
    })
});

static PLAN_VALIDATOR: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    jsonschema::validator_for(&PLAN_SCHEMA).expect("embedded plan schema compiles")
});

/// The JSON Schema every model response must satisfy.
pub fn plan_response_schema() -> &'static Value {
    &PLAN_SCHEMA
}

// ---------------------------------------------------------------------------
// Boundary checks
// ---------------------------------------------------------------------------

/// Check `value` against [`plan_response_schema`], reporting every violation
/// with its instance path.
///
/// # Panics
///
/// Panics on first use if the embedded schema does not compile.
pub fn check_schema_conformance(value: &Value) -> Result<(), SchemaViolation> {
    let errors: Vec<String> = PLAN_VALIDATOR
        .iter_errors(value)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{path}: {e}")
            }
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaViolation::Mismatch(errors))
    }
}

/// Drop object members whose value is `null`; an explicit null means absent.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Check conformance, then deserialize into a [`WeeklyPlan`].
pub fn decode_plan(mut value: Value) -> Result<WeeklyPlan, SchemaViolation> {
    strip_nulls(&mut value);
    check_schema_conformance(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// Parse raw model text as JSON.
///
/// Tolerates Markdown code fences and prose around the outermost object.
pub fn extract_json(text: &str) -> Result<Value, SchemaViolation> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(SchemaViolation::NotJson(excerpt(trimmed)));
    };
    if end < start {
        return Err(SchemaViolation::NotJson(excerpt(trimmed)));
    }
    serde_json::from_str(&trimmed[start..=end])
        .map_err(|e| SchemaViolation::NotJson(format!("{e} in {}", excerpt(trimmed))))
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{:?}...", &text[..idx]),
        None => format!("{text:?}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
