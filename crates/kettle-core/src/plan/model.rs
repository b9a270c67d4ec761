//! Canonical workout plan types.
//!
//! These types are the JSON wire contract for every candidate plan, whether
//! parsed from text or generated from a profile. Block and metrics variants
//! are closed, `type`-tagged enums; fields that do not belong to a variant are
//! rejected rather than ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A full week of training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeeklyPlan {
    pub name: String,
    /// One entry per weekday, Monday first.
    #[serde(rename = "weeklyPlan")]
    pub weekly_plan: Vec<PlanDay>,
    #[serde(
        rename = "dailyRoutine",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub daily_routine: Option<DailyRoutine>,
}

impl WeeklyPlan {
    /// Every exercise in every block of every day.
    pub fn exercises(&self) -> impl Iterator<Item = &PlanExercise> {
        self.weekly_plan.iter().flat_map(PlanDay::exercises)
    }

    /// Days that are not rest or recovery days.
    pub fn training_days(&self) -> impl Iterator<Item = &PlanDay> {
        self.weekly_plan.iter().filter(|day| !day.is_rest_day())
    }
}

/// One weekday of a [`WeeklyPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanDay {
    /// 1 = Monday .. 7 = Sunday.
    pub day_of_week: u8,
    pub focus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub blocks: Vec<WorkoutBlock>,
}

impl PlanDay {
    /// A day whose focus names rest or recovery. Only these may have no blocks.
    pub fn is_rest_day(&self) -> bool {
        let focus = self.focus.to_lowercase();
        focus.contains("rest") || focus.contains("recovery")
    }

    pub fn exercises(&self) -> impl Iterator<Item = &PlanExercise> {
        self.blocks.iter().flat_map(|block| block.exercises().iter())
    }

    /// Number of exercises in `category` across all blocks of the day.
    pub fn count_category(&self, category: ExerciseCategory) -> usize {
        self.exercises().filter(|e| e.category == category).count()
    }

    /// Weekday name for labels, falling back to the raw number.
    pub fn weekday_name(&self) -> String {
        const NAMES: [&str; 7] = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ];
        match self.day_of_week {
            d @ 1..=7 => NAMES[usize::from(d - 1)].to_string(),
            d => format!("Day {d}"),
        }
    }
}

/// A routine repeated every day (mobility, activation), outside the weekly days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyRoutine {
    pub focus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub exercises: Vec<PlanExercise>,
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// A group of exercises performed under one execution rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum WorkoutBlock {
    /// Straight sets, one exercise after another.
    Single {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        exercises: Vec<PlanExercise>,
    },
    /// Exercises performed back to back for `rounds` rounds. Only the last
    /// member of a round carries rest.
    Superset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        exercises: Vec<PlanExercise>,
        rounds: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_between_rounds_s: Option<u32>,
    },
    /// As many rounds as possible inside `duration_minutes`.
    Amrap {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        exercises: Vec<PlanExercise>,
        duration_minutes: u32,
    },
}

impl WorkoutBlock {
    pub fn exercises(&self) -> &[PlanExercise] {
        match self {
            Self::Single { exercises, .. }
            | Self::Superset { exercises, .. }
            | Self::Amrap { exercises, .. } => exercises,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Single { title, .. } | Self::Superset { title, .. } | Self::Amrap { title, .. } => {
                title.as_deref()
            }
        }
    }

    /// The wire tag of this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Superset { .. } => "superset",
            Self::Amrap { .. } => "amrap",
        }
    }
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

/// One exercise instance inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanExercise {
    pub exercise_name: String,
    pub category: ExerciseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Rate of perceived exertion, kept as written (`"8"`, `"7-8"`).
    #[serde(
        default,
        deserialize_with = "rpe_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub rpe: Option<String>,
    pub metrics_template: MetricsTemplate,
}

/// Accepts RPE written either as a string or as a bare number.
fn rpe_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Where in a session an exercise sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Warmup,
    Main,
    Cooldown,
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Warmup => "warmup",
            Self::Main => "main",
            Self::Cooldown => "cooldown",
        };
        f.write_str(s)
    }
}

impl FromStr for ExerciseCategory {
    type Err = ExerciseCategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warmup" => Ok(Self::Warmup),
            "main" => Ok(Self::Main),
            "cooldown" => Ok(Self::Cooldown),
            other => Err(ExerciseCategoryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ExerciseCategory`] string.
#[derive(Debug, Clone)]
pub struct ExerciseCategoryParseError(pub String);

impl fmt::Display for ExerciseCategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid exercise category: {:?}", self.0)
    }
}

impl std::error::Error for ExerciseCategoryParseError {}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Target reps: a plain count or a textual scheme such as `"8-12"` or `"AMRAP"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetReps {
    Count(u32),
    Text(String),
}

impl fmt::Display for TargetReps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl TargetReps {
    /// A representative rep count: the count itself, or the upper end of a range.
    pub fn upper_bound(&self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Text(s) => s
                .split(|c: char| !c.is_ascii_digit())
                .filter_map(|part| part.parse().ok())
                .max(),
        }
    }
}

/// Which numeric targets apply to one exercise instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum MetricsTemplate {
    SetsRepsWeight {
        target_sets: u32,
        target_reps: TargetReps,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        one_rep_max_percentage: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_weight_kg: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_period_s: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        has_drop_set: Option<bool>,
    },
    SetsRepsWeightTempo {
        target_sets: u32,
        target_reps: TargetReps,
        target_tempo: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        one_rep_max_percentage: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_weight_kg: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_period_s: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        has_drop_set: Option<bool>,
    },
    /// Bodyweight sets.
    SetsReps {
        target_sets: u32,
        target_reps: TargetReps,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_period_s: Option<u32>,
    },
    SetsDistanceRest {
        target_sets: u32,
        target_distance_m: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_period_s: Option<u32>,
    },
    SetsDuration {
        target_sets: u32,
        target_duration_s: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_period_s: Option<u32>,
    },
    DurationOnly {
        target_duration_minutes: u32,
    },
    DistanceTime {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_distance_km: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_distance_m: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_time_minutes: Option<f64>,
    },
}

impl MetricsTemplate {
    /// The wire tag of this template.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetsRepsWeight { .. } => "sets_reps_weight",
            Self::SetsRepsWeightTempo { .. } => "sets_reps_weight_tempo",
            Self::SetsReps { .. } => "sets_reps",
            Self::SetsDistanceRest { .. } => "sets_distance_rest",
            Self::SetsDuration { .. } => "sets_duration",
            Self::DurationOnly { .. } => "duration_only",
            Self::DistanceTime { .. } => "distance_time",
        }
    }

    pub fn target_sets(&self) -> Option<u32> {
        match self {
            Self::SetsRepsWeight { target_sets, .. }
            | Self::SetsRepsWeightTempo { target_sets, .. }
            | Self::SetsReps { target_sets, .. }
            | Self::SetsDistanceRest { target_sets, .. }
            | Self::SetsDuration { target_sets, .. } => Some(*target_sets),
            Self::DurationOnly { .. } | Self::DistanceTime { .. } => None,
        }
    }

    pub fn target_reps(&self) -> Option<&TargetReps> {
        match self {
            Self::SetsRepsWeight { target_reps, .. }
            | Self::SetsRepsWeightTempo { target_reps, .. }
            | Self::SetsReps { target_reps, .. } => Some(target_reps),
            _ => None,
        }
    }

    /// Rest after each set, for templates that carry one.
    pub fn rest_period_s(&self) -> Option<u32> {
        match self {
            Self::SetsRepsWeight { rest_period_s, .. }
            | Self::SetsRepsWeightTempo { rest_period_s, .. }
            | Self::SetsReps { rest_period_s, .. }
            | Self::SetsDistanceRest { rest_period_s, .. }
            | Self::SetsDuration { rest_period_s, .. } => *rest_period_s,
            Self::DurationOnly { .. } | Self::DistanceTime { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn superset_block_deserializes() {
        let block: WorkoutBlock = serde_json::from_value(json!({
            "type": "superset",
            "title": "A",
            "rounds": 4,
            "exercises": [
                {
                    "exercise_name": "Pull-ups",
                    "category": "main",
                    "metrics_template": {"type": "sets_reps", "target_sets": 4, "target_reps": 8, "rest_period_s": 0}
                },
                {
                    "exercise_name": "Push-ups",
                    "category": "main",
                    "metrics_template": {"type": "sets_reps", "target_sets": 4, "target_reps": "AMRAP", "rest_period_s": 90}
                }
            ]
        }))
        .unwrap();

        assert_eq!(block.kind(), "superset");
        assert_eq!(block.title(), Some("A"));
        let rests: Vec<_> = block
            .exercises()
            .iter()
            .map(|e| e.metrics_template.rest_period_s())
            .collect();
        assert_eq!(rests, vec![Some(0), Some(90)]);
        assert!(matches!(block, WorkoutBlock::Superset { rounds: 4, .. }));
    }

    #[test]
    fn fields_foreign_to_a_variant_are_rejected() {
        let result: Result<MetricsTemplate, _> = serde_json::from_value(json!({
            "type": "duration_only",
            "target_duration_minutes": 20,
            "target_sets": 3
        }));
        assert!(result.is_err(), "target_sets does not belong to duration_only");

        let result: Result<WorkoutBlock, _> = serde_json::from_value(json!({
            "type": "single",
            "rounds": 3,
            "exercises": []
        }));
        assert!(result.is_err(), "rounds does not belong to single blocks");
    }

    #[test]
    fn target_reps_accepts_count_or_text() {
        let count: TargetReps = serde_json::from_value(json!(8)).unwrap();
        let text: TargetReps = serde_json::from_value(json!("8-12")).unwrap();
        assert_eq!(count, TargetReps::Count(8));
        assert_eq!(text, TargetReps::Text("8-12".into()));
        assert_eq!(text.upper_bound(), Some(12));
        assert_eq!(TargetReps::Text("AMRAP".into()).upper_bound(), None);
    }

    #[test]
    fn rpe_accepts_numbers() {
        let exercise: PlanExercise = serde_json::from_value(json!({
            "exercise_name": "Back Squat",
            "category": "main",
            "rpe": 8,
            "metrics_template": {"type": "sets_reps_weight", "target_sets": 5, "target_reps": 5}
        }))
        .unwrap();
        assert_eq!(exercise.rpe.as_deref(), Some("8"));
    }

    #[test]
    fn plan_keeps_camel_case_keys() {
        let plan = WeeklyPlan {
            name: "Test".into(),
            weekly_plan: vec![PlanDay {
                day_of_week: 1,
                focus: "Rest".into(),
                notes: None,
                blocks: vec![],
            }],
            daily_routine: None,
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert!(value.get("weeklyPlan").is_some());
        assert!(value.get("dailyRoutine").is_none());
        assert!(value["weeklyPlan"][0].get("notes").is_none());
    }

    #[test]
    fn rest_day_detection_is_case_insensitive() {
        let day = |focus: &str| PlanDay {
            day_of_week: 3,
            focus: focus.into(),
            notes: None,
            blocks: vec![],
        };
        assert!(day("Rest").is_rest_day());
        assert!(day("Active Recovery").is_rest_day());
        assert!(!day("Upper Body").is_rest_day());
        assert_eq!(day("Upper Body").weekday_name(), "Wednesday");
    }

    #[test]
    fn category_parses_from_strings() {
        assert_eq!(
            "cooldown".parse::<ExerciseCategory>().unwrap(),
            ExerciseCategory::Cooldown
        );
        assert!("finisher".parse::<ExerciseCategory>().is_err());
    }
}
