//! The canonical plan: types, the structured-output schema, and derived figures.

pub mod duration;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod model;
pub mod schema;

pub use duration::estimate_day_minutes;
pub use model::{
    DailyRoutine, ExerciseCategory, ExerciseCategoryParseError, MetricsTemplate, PlanDay,
    PlanExercise, TargetReps, WeeklyPlan, WorkoutBlock,
};
pub use schema::{
    SchemaViolation, check_schema_conformance, decode_plan, extract_json, plan_response_schema,
};
