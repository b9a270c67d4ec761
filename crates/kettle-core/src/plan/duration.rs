//! Rough session duration from metrics templates.
//!
//! Used for display only. The figures are coarse averages, not a model of
//! the athlete.

use super::model::{MetricsTemplate, PlanDay, PlanExercise, WorkoutBlock};

const SECONDS_PER_REP: u32 = 4;
/// Reps assumed when the target is textual ("AMRAP", "max").
const FALLBACK_REPS: u32 = 10;
const DEFAULT_REST_S: u32 = 60;
/// Roughly a steady run.
const METERS_PER_SECOND: u32 = 3;
const MINUTES_PER_KM: f64 = 6.0;

/// Estimated length of `day` in whole minutes, rounded up.
///
/// Saturates at `u32::MAX` seconds for absurd targets.
pub fn estimate_day_minutes(day: &PlanDay) -> u32 {
    let seconds = day.blocks.iter().map(block_seconds).fold(0, u32::saturating_add);
    seconds.div_ceil(60)
}

fn block_seconds(block: &WorkoutBlock) -> u32 {
    match block {
        WorkoutBlock::Single { exercises, .. } => exercises
            .iter()
            .map(exercise_seconds)
            .fold(0, u32::saturating_add),
        WorkoutBlock::Superset {
            exercises,
            rounds,
            rest_between_rounds_s,
            ..
        } => {
            let round = exercises
                .iter()
                .map(|e| {
                    let template = &e.metrics_template;
                    work_seconds(template).saturating_add(template.rest_period_s().unwrap_or(0))
                })
                .fold(0, u32::saturating_add);
            let between = rest_between_rounds_s
                .unwrap_or(0)
                .saturating_mul(rounds.saturating_sub(1));
            round.saturating_mul(*rounds).saturating_add(between)
        }
        WorkoutBlock::Amrap {
            duration_minutes, ..
        } => duration_minutes.saturating_mul(60),
    }
}

fn exercise_seconds(exercise: &PlanExercise) -> u32 {
    let template = &exercise.metrics_template;
    match template.target_sets() {
        Some(sets) => {
            let rest = template.rest_period_s().unwrap_or(DEFAULT_REST_S);
            sets.saturating_mul(work_seconds(template).saturating_add(rest))
        }
        None => work_seconds(template),
    }
}

/// Time under work for one set, or for the whole effort when setless.
fn work_seconds(template: &MetricsTemplate) -> u32 {
    match template {
        MetricsTemplate::SetsRepsWeight { target_reps, .. }
        | MetricsTemplate::SetsRepsWeightTempo { target_reps, .. }
        | MetricsTemplate::SetsReps { target_reps, .. } => {
            target_reps
                .upper_bound()
                .unwrap_or(FALLBACK_REPS)
                .saturating_mul(SECONDS_PER_REP)
        }
        MetricsTemplate::SetsDistanceRest {
            target_distance_m, ..
        } => target_distance_m / METERS_PER_SECOND,
        MetricsTemplate::SetsDuration {
            target_duration_s, ..
        } => *target_duration_s,
        MetricsTemplate::DurationOnly {
            target_duration_minutes,
        } => target_duration_minutes.saturating_mul(60),
        MetricsTemplate::DistanceTime {
            target_distance_km,
            target_distance_m,
            target_time_minutes,
        } => {
            let minutes = target_time_minutes
                .or_else(|| target_distance_km.map(|km| km * MINUTES_PER_KM))
                .or_else(|| target_distance_m.map(|m| f64::from(m) / 1000.0 * MINUTES_PER_KM))
                .unwrap_or(0.0);
            (minutes * 60.0).round() as u32
        }
    }
}
