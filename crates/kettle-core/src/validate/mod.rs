//! Plan validation.
//!
//! [`validate_plan`] is a pure function over a candidate plan and a
//! [`ValidationContext`]. It runs every check on every call and reports all
//! findings at once; it never edits the plan or proposes a fix.
//!
//! Findings are either errors (the plan is rejected) or warnings (reported
//! alongside, never affecting `valid`).

pub mod movement;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::plan::{ExerciseCategory, MetricsTemplate, PlanDay, WeeklyPlan, WorkoutBlock};
use crate::profile::{SessionLength, UserProfile, sport_profile};

pub use movement::{MovementPattern, classify, missing_patterns};

/// Warmup exercises required on each training day.
pub const WARMUP_RANGE: (usize, usize) = (5, 7);
/// Cooldown exercises allowed on a training day, when any are present.
pub const COOLDOWN_RANGE: (usize, usize) = (2, 4);
/// Movement patterns that may be entirely absent across the week.
pub const MAX_MISSING_PATTERNS: usize = 2;
/// Fewer training days than this are single sessions, not a balanced week.
pub const MIN_DAYS_FOR_BALANCE: usize = 3;
pub const DAYS_PER_WEEK: usize = 7;

// ---------------------------------------------------------------------------
// Context and result
// ---------------------------------------------------------------------------

/// What the plan is checked against. Every field is optional; absent fields
/// disable the checks that need them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    pub sport: Option<String>,
    /// snake_case identifiers or plain names.
    pub sport_priority_exercises: Vec<String>,
    pub desired_frequency: Option<u8>,
    pub preferred_session_length: Option<SessionLength>,
}

/// Loosely typed context as it arrives from forms and JSON bodies, where
/// numbers are often strings (`"5"`, `"30"`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawValidationContext {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub sport_priority_exercises: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub desired_frequency: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub preferred_session_length: Option<String>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    }))
}

impl ValidationContext {
    /// Build from string inputs. Unparseable numbers disable their check.
    pub fn from_raw(raw: &RawValidationContext) -> Self {
        let desired_frequency = raw.desired_frequency.as_deref().and_then(|f| {
            let parsed = f.trim().parse::<u8>().ok();
            if parsed.is_none() {
                debug!(value = f, "ignoring unparseable desired frequency");
            }
            parsed
        });
        let preferred_session_length = raw.preferred_session_length.as_deref().and_then(|s| {
            let parsed = s.parse::<SessionLength>().ok();
            if parsed.is_none() {
                debug!(value = s, "ignoring unsupported session length");
            }
            parsed
        });
        Self {
            sport: raw
                .sport
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            sport_priority_exercises: raw.sport_priority_exercises.clone(),
            desired_frequency,
            preferred_session_length,
        }
    }

    /// Context for a generated plan: the profile's frequency and session
    /// length, and the sport library's priority exercises.
    pub fn for_profile(profile: &UserProfile) -> Self {
        let sport = profile.sport().map(str::to_owned);
        let sport_priority_exercises = sport
            .as_deref()
            .and_then(sport_profile)
            .map(|p| p.priority_exercises.clone())
            .unwrap_or_default();
        Self {
            sport,
            sport_priority_exercises,
            desired_frequency: Some(profile.frequency),
            preferred_session_length: profile.session_length,
        }
    }

    /// Fill in priority exercises from the sport library when none were given.
    #[must_use]
    pub fn with_library_priorities(mut self) -> Self {
        if self.sport_priority_exercises.is_empty() {
            if let Some(profile) = self.sport.as_deref().and_then(sport_profile) {
                self.sport_priority_exercises = profile.priority_exercises.clone();
            }
        }
        self
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn finish(self) -> ValidationResult {
        ValidationResult {
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Check `plan` against every structural and programming rule.
pub fn validate_plan(plan: &WeeklyPlan, context: &ValidationContext) -> ValidationResult {
    let mut findings = Findings::default();

    check_week_shape(plan, &mut findings);
    for (index, day) in plan.weekly_plan.iter().enumerate() {
        check_day(index, day, &mut findings);
    }
    check_frequency(plan, context, &mut findings);
    check_movement_balance(plan, &mut findings);
    check_session_length(plan, context, &mut findings);
    check_sport_alignment(plan, context, &mut findings);

    let result = findings.finish();
    debug!(
        valid = result.valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validated plan"
    );
    result
}

fn day_label(index: usize, day: &PlanDay) -> String {
    let focus = day.focus.trim();
    let focus = if focus.is_empty() { "unnamed" } else { focus };
    format!("Day {} ({focus})", index + 1)
}

/// Training days that actually have work scheduled.
fn scheduled_days(plan: &WeeklyPlan) -> impl Iterator<Item = (usize, &PlanDay)> {
    plan.weekly_plan
        .iter()
        .enumerate()
        .filter(|(_, day)| !day.is_rest_day() && !day.blocks.is_empty())
}

fn check_week_shape(plan: &WeeklyPlan, findings: &mut Findings) {
    if plan.name.trim().is_empty() {
        findings.error("Plan must have a name".to_string());
    }
    if plan.weekly_plan.is_empty() {
        findings.error("Weekly plan is empty".to_string());
    }
    if plan.weekly_plan.len() != DAYS_PER_WEEK {
        findings.error(format!(
            "Weekly plan must have exactly {DAYS_PER_WEEK} days (found {})",
            plan.weekly_plan.len()
        ));
    }

    let mut seen: BTreeMap<u8, usize> = BTreeMap::new();
    for day in &plan.weekly_plan {
        *seen.entry(day.day_of_week).or_default() += 1;
    }
    for (day_of_week, count) in seen {
        if count > 1 && (1..=7).contains(&day_of_week) {
            findings.error(format!(
                "day_of_week {day_of_week} appears {count} times (each weekday must appear once)"
            ));
        }
    }
}

fn check_day(index: usize, day: &PlanDay, findings: &mut Findings) {
    let label = day_label(index, day);

    if !(1..=7).contains(&day.day_of_week) {
        findings.error(format!(
            "{label}: day_of_week must be 1-7 (found {})",
            day.day_of_week
        ));
    }
    if day.focus.trim().is_empty() {
        findings.warn(format!("{label}: missing focus description"));
    }

    if day.is_rest_day() {
        return;
    }
    if day.blocks.is_empty() {
        findings.error(format!(
            "{label}: has no blocks but is not a rest or recovery day"
        ));
        return;
    }

    let warmups = day.count_category(ExerciseCategory::Warmup);
    let (lo, hi) = WARMUP_RANGE;
    if !(lo..=hi).contains(&warmups) {
        findings.error(format!(
            "{label}: {warmups} warmup exercises (expected {lo}-{hi})"
        ));
    }
    let cooldowns = day.count_category(ExerciseCategory::Cooldown);
    let (lo, hi) = COOLDOWN_RANGE;
    if cooldowns > 0 && !(lo..=hi).contains(&cooldowns) {
        findings.error(format!(
            "{label}: {cooldowns} cooldown exercises (expected {lo}-{hi}, or none)"
        ));
    }

    for (block_index, block) in day.blocks.iter().enumerate() {
        check_block(&format!("{label} > Block {}", block_index + 1), block, findings);
    }
}

fn check_block(label: &str, block: &WorkoutBlock, findings: &mut Findings) {
    let exercises = block.exercises();
    if exercises.is_empty() {
        findings.error(format!("{label}: {} block has no exercises", block.kind()));
    }

    match block {
        WorkoutBlock::Superset { rounds, .. } => {
            if *rounds == 0 {
                findings.error(format!("{label}: superset must have rounds >= 1"));
            }
            let last = exercises.len().saturating_sub(1);
            for (i, exercise) in exercises.iter().enumerate() {
                let template = &exercise.metrics_template;
                let ex_label = exercise_label(label, i, &exercise.exercise_name);
                if i < last && template.rest_period_s().unwrap_or(0) > 0 {
                    findings.warn(format!(
                        "{ex_label}: rest should be 0 inside a superset (only the last exercise rests)"
                    ));
                }
                if let Some(sets) = template.target_sets() {
                    if *rounds > 0 && sets != *rounds {
                        findings.warn(format!(
                            "{ex_label}: {sets} sets but the superset runs {rounds} rounds"
                        ));
                    }
                }
            }
        }
        WorkoutBlock::Amrap {
            duration_minutes, ..
        } => {
            if *duration_minutes == 0 {
                findings.error(format!("{label}: amrap must have duration_minutes >= 1"));
            }
        }
        WorkoutBlock::Single { .. } => {}
    }

    for (i, exercise) in exercises.iter().enumerate() {
        let ex_label = exercise_label(label, i, &exercise.exercise_name);
        if exercise.exercise_name.trim().is_empty() {
            findings.warn(format!("{ex_label}: missing exercise_name"));
        }
        check_metrics(&ex_label, &exercise.exercise_name, &exercise.metrics_template, findings);
    }
}

fn exercise_label(block_label: &str, index: usize, name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { "unnamed" } else { name };
    format!("{block_label} > Exercise {} ({name})", index + 1)
}

fn check_metrics(label: &str, name: &str, template: &MetricsTemplate, findings: &mut Findings) {
    let kind = template.kind();
    if template.target_sets() == Some(0) {
        findings.error(format!("{label}: {kind} requires target_sets >= 1"));
    }
    match template {
        MetricsTemplate::SetsDuration {
            target_duration_s: 0,
            ..
        } => findings.error(format!("{label}: sets_duration requires target_duration_s >= 1")),
        MetricsTemplate::DurationOnly {
            target_duration_minutes: 0,
        } => {
            // A "Complete Rest" placeholder legitimately has no duration.
            let lower = name.to_lowercase();
            if !(lower.contains("rest") || lower.contains("recovery")) {
                findings.error(format!(
                    "{label}: duration_only requires target_duration_minutes >= 1"
                ));
            }
        }
        MetricsTemplate::DistanceTime {
            target_distance_km,
            target_distance_m,
            ..
        } => match (target_distance_km, target_distance_m) {
            (None, None) => findings.error(format!(
                "{label}: distance_time requires target_distance_km or target_distance_m"
            )),
            (Some(_), Some(_)) => findings.warn(format!(
                "{label}: distance_time has both target_distance_km and target_distance_m (use one)"
            )),
            _ => {}
        },
        _ => {}
    }
}

fn check_frequency(plan: &WeeklyPlan, context: &ValidationContext, findings: &mut Findings) {
    let Some(requested) = context.desired_frequency else {
        return;
    };
    let training_days = scheduled_days(plan).count();
    if training_days < usize::from(requested) {
        findings.error(format!(
            "Plan has {training_days} training days but the profile requested {requested}"
        ));
    }
}

fn check_movement_balance(plan: &WeeklyPlan, findings: &mut Findings) {
    if scheduled_days(plan).count() < MIN_DAYS_FOR_BALANCE {
        return;
    }
    let missing = missing_patterns(plan.exercises().map(|e| e.exercise_name.as_str()));
    if missing.len() > MAX_MISSING_PATTERNS {
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        findings.error(format!(
            "Movement patterns are imbalanced: no {} work across the week (at most {MAX_MISSING_PATTERNS} patterns may be absent)",
            names.join(", ")
        ));
    }
}

fn check_session_length(plan: &WeeklyPlan, context: &ValidationContext, findings: &mut Findings) {
    let Some(length) = context.preferred_session_length else {
        return;
    };
    let (lo, hi) = length.exercise_band();
    for (index, day) in scheduled_days(plan) {
        let mains = day.count_category(ExerciseCategory::Main);
        if !(lo..=hi).contains(&mains) {
            findings.error(format!(
                "{}: {mains} main exercises for a {length}-minute session (expected {lo}-{hi})",
                day_label(index, day)
            ));
        }
    }
}

/// Lowercase with `_`/`-` read as spaces and runs of whitespace collapsed.
fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_sport_alignment(plan: &WeeklyPlan, context: &ValidationContext, findings: &mut Findings) {
    let Some(sport) = context.sport.as_deref() else {
        return;
    };
    let priorities: Vec<String> = context
        .sport_priority_exercises
        .iter()
        .map(|p| normalize_name(p))
        .filter(|p| !p.is_empty())
        .collect();
    if priorities.is_empty() {
        return;
    }

    let covered = plan.exercises().any(|exercise| {
        let name = normalize_name(&exercise.exercise_name);
        priorities.iter().any(|p| name.contains(p.as_str()))
    });
    if !covered {
        findings.error(format!(
            "Plan contains no {sport} priority exercise (expected at least one of: {})",
            priorities.join(", ")
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::{
        balanced_week, chest_today, exercise, rest_day, single, training_day, week,
    };
    use crate::plan::{PlanExercise, TargetReps};

    fn no_context() -> ValidationContext {
        ValidationContext::default()
    }

    #[test]
    fn single_session_plan_passes() {
        let result = validate_plan(&chest_today(), &no_context());
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn balanced_week_passes_with_full_context() {
        let context = ValidationContext {
            sport: None,
            sport_priority_exercises: vec![],
            desired_frequency: Some(4),
            preferred_session_length: Some(SessionLength::FortyFive),
        };
        let result = validate_plan(&balanced_week(), &context);
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
    }

    #[test]
    fn rest_day_without_blocks_is_fine_but_training_day_is_not() {
        let mut plan = chest_today();
        plan.weekly_plan[2].focus = "Upper Body".to_string();
        let result = validate_plan(&plan, &no_context());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert!(result.errors[0].contains("Day 3 (Upper Body)"));
        assert!(result.errors[0].contains("has no blocks"));

        // Rest focus in any case is exempt.
        plan.weekly_plan[2].focus = "ACTIVE RECOVERY".to_string();
        assert!(validate_plan(&plan, &no_context()).valid);
    }

    #[test]
    fn reports_independent_defects_together() {
        let mut plan = chest_today();
        // Defect 1: only 3 warmups on Monday.
        plan.weekly_plan[0].blocks[0] = single(&["Cat-Cow", "Arm Circles", "Hip Circles"], ExerciseCategory::Warmup);
        // Defect 2: empty non-rest day.
        plan.weekly_plan[3].focus = "Legs".to_string();

        let result = validate_plan(&plan, &no_context());
        assert!(!result.valid);
        assert!(
            result.errors.iter().any(|e| e.contains("3 warmup exercises (expected 5-7)")),
            "{:?}",
            result.errors
        );
        assert!(
            result.errors.iter().any(|e| e.contains("Day 4 (Legs): has no blocks")),
            "{:?}",
            result.errors
        );
    }

    #[test]
    fn short_warmup_and_missing_sport_priority_are_both_reported() {
        let mut plan = chest_today();
        plan.weekly_plan[0].blocks[0] = single(&["Cat-Cow", "Arm Circles", "Hip Circles"], ExerciseCategory::Warmup);
        let context = ValidationContext {
            sport: Some("boxing".to_string()),
            sport_priority_exercises: vec!["heavy_bag_work".into(), "medicine_ball_slam".into()],
            ..ValidationContext::default()
        };

        let result = validate_plan(&plan, &context);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
        assert!(result.errors[0].contains("3 warmup exercises (expected 5-7)"));
        assert!(
            result.errors[1].contains("no boxing priority exercise"),
            "{:?}",
            result.errors
        );
    }

    #[test]
    fn cooldown_of_one_is_flagged_zero_is_fine() {
        let mut plan = chest_today();
        plan.weekly_plan[0].blocks[2] = single(&["Pec Stretch"], ExerciseCategory::Cooldown);
        let result = validate_plan(&plan, &no_context());
        assert!(result.errors.iter().any(|e| e.contains("1 cooldown exercises")));

        plan.weekly_plan[0].blocks.pop();
        assert!(validate_plan(&plan, &no_context()).valid);
    }

    #[test]
    fn frequency_shortfall_is_reported_with_counts() {
        let plan = week(
            "Three days",
            vec![
                training_day(1, "Push", &["Bench Press", "Overhead Press", "Dips", "Push-up"]),
                training_day(3, "Pull", &["Pull-up", "Barbell Row", "Face Pull", "Curl"]),
                training_day(5, "Legs", &["Back Squat", "Deadlift", "Lunge", "Plank"]),
            ],
        );
        let raw = RawValidationContext {
            desired_frequency: Some("5".into()),
            preferred_session_length: Some("30".into()),
            ..RawValidationContext::default()
        };
        let result = validate_plan(&plan, &ValidationContext::from_raw(&raw));
        let message = result
            .errors
            .iter()
            .find(|e| e.contains("training days"))
            .expect("frequency error");
        assert!(message.contains("3 training days"), "{message}");
        assert!(message.contains("requested 5"), "{message}");
    }

    #[test]
    fn week_must_have_seven_unique_days() {
        let mut plan = chest_today();
        plan.weekly_plan.pop();
        plan.weekly_plan[5].day_of_week = 1;
        let result = validate_plan(&plan, &no_context());
        assert!(result.errors.iter().any(|e| e.contains("exactly 7 days (found 6)")));
        assert!(result.errors.iter().any(|e| e.contains("day_of_week 1 appears 2 times")));
    }

    #[test]
    fn out_of_range_weekday_and_empty_name() {
        let mut plan = chest_today();
        plan.name = "  ".into();
        plan.weekly_plan[6].day_of_week = 9;
        let result = validate_plan(&plan, &no_context());
        assert!(result.errors.contains(&"Plan must have a name".to_string()));
        assert!(result.errors.iter().any(|e| e.contains("day_of_week must be 1-7 (found 9)")));
    }

    #[test]
    fn empty_week_is_flagged() {
        let plan = WeeklyPlan {
            name: "Nothing".into(),
            weekly_plan: vec![],
            daily_routine: None,
        };
        let result = validate_plan(&plan, &no_context());
        assert!(result.errors.contains(&"Weekly plan is empty".to_string()));
    }

    #[test]
    fn imbalanced_week_is_flagged() {
        let push = ["Bench Press", "Incline Press", "Cable Fly", "Dips"];
        let plan = week(
            "Push forever",
            vec![
                training_day(1, "Push A", &push),
                training_day(3, "Push B", &push),
                training_day(5, "Push C", &push),
            ],
        );
        let result = validate_plan(&plan, &no_context());
        let message = result
            .errors
            .iter()
            .find(|e| e.contains("imbalanced"))
            .expect("balance error");
        assert!(message.contains("squat"), "{message}");
        assert!(message.contains("carry"), "{message}");
    }

    #[test]
    fn session_length_band_is_enforced_per_day() {
        let context = ValidationContext {
            preferred_session_length: Some(SessionLength::Thirty),
            ..ValidationContext::default()
        };
        let result = validate_plan(&balanced_week(), &context);
        assert!(result.valid, "6 mains fit a 30 minute band: {:?}", result.errors);

        let context = ValidationContext {
            preferred_session_length: Some(SessionLength::SeventyFive),
            ..ValidationContext::default()
        };
        let result = validate_plan(&balanced_week(), &context);
        assert_eq!(
            result
                .errors
                .iter()
                .filter(|e| e.contains("6 main exercises for a 75-minute session (expected 9-12)"))
                .count(),
            4
        );
    }

    #[test]
    fn sport_without_priority_exercise_is_flagged() {
        let raw = RawValidationContext {
            sport: Some("boxing".into()),
            sport_priority_exercises: vec!["heavy_bag_work".into(), "medicine_ball_slam".into()],
            ..RawValidationContext::default()
        };
        let context = ValidationContext::from_raw(&raw);
        let result = validate_plan(&balanced_week(), &context);
        let message = result
            .errors
            .iter()
            .find(|e| e.contains("boxing"))
            .expect("sport error");
        assert!(message.contains("heavy bag work"), "{message}");

        let mut plan = balanced_week();
        plan.weekly_plan[0].blocks[1] = single(
            &["Heavy-Bag Work (3 min rounds)", "Back Squat", "Romanian Deadlift", "Walking Lunge", "Farmer Carry", "Plank"],
            ExerciseCategory::Main,
        );
        let result = validate_plan(&plan, &context);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn library_priorities_fill_in_for_known_sports() {
        let context = ValidationContext {
            sport: Some("Boxing".into()),
            ..ValidationContext::default()
        }
        .with_library_priorities();
        assert!(context.sport_priority_exercises.iter().any(|e| e == "heavy_bag_work"));

        let mut profile = UserProfile::new("athletic", "intermediate", 4);
        profile.sport = Some("muay thai".into());
        profile.session_length = Some(SessionLength::Sixty);
        let context = ValidationContext::for_profile(&profile);
        assert_eq!(context.desired_frequency, Some(4));
        assert!(!context.sport_priority_exercises.is_empty());
    }

    #[test]
    fn raw_context_tolerates_numbers_and_garbage() {
        let raw: RawValidationContext = serde_json::from_str(
            r#"{"desiredFrequency": 4, "preferredSessionLength": "forever"}"#,
        )
        .unwrap();
        let context = ValidationContext::from_raw(&raw);
        assert_eq!(context.desired_frequency, Some(4));
        assert_eq!(context.preferred_session_length, None);
    }

    #[test]
    fn superset_rest_rule_only_warns() {
        let member = |name: &str, rest: u32| PlanExercise {
            metrics_template: MetricsTemplate::SetsReps {
                target_sets: 4,
                target_reps: TargetReps::Count(8),
                rest_period_s: Some(rest),
            },
            ..exercise(name, ExerciseCategory::Main)
        };
        let mut plan = chest_today();
        plan.weekly_plan[0].blocks[1] = WorkoutBlock::Superset {
            title: Some("A".into()),
            exercises: vec![member("Pull-ups", 60), member("Push-ups", 90)],
            rounds: 4,
            rest_between_rounds_s: None,
        };
        let result = validate_plan(&plan, &no_context());
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
        assert!(result.warnings[0].contains("Block 2 > Exercise 1 (Pull-ups)"));
    }

    #[test]
    fn structural_metric_errors() {
        let mut plan = chest_today();
        let mut broken = exercise("Run", ExerciseCategory::Main);
        broken.metrics_template = MetricsTemplate::DistanceTime {
            target_distance_km: None,
            target_distance_m: None,
            target_time_minutes: Some(20.0),
        };
        let mut zero_sets = exercise("Bench Press", ExerciseCategory::Main);
        zero_sets.metrics_template = MetricsTemplate::SetsReps {
            target_sets: 0,
            target_reps: TargetReps::Count(5),
            rest_period_s: None,
        };
        plan.weekly_plan[0].blocks.push(WorkoutBlock::Amrap {
            title: None,
            exercises: vec![broken, zero_sets],
            duration_minutes: 0,
        });
        let result = validate_plan(&plan, &no_context());
        assert!(result.errors.iter().any(|e| e.contains("amrap must have duration_minutes")));
        assert!(result.errors.iter().any(|e| e.contains("(Run): distance_time requires")));
        assert!(result.errors.iter().any(|e| e.contains("sets_reps requires target_sets")));
    }

    #[test]
    fn empty_block_is_an_error() {
        let mut plan = chest_today();
        plan.weekly_plan[0].blocks.push(single(&[], ExerciseCategory::Main));
        let result = validate_plan(&plan, &no_context());
        assert!(result.errors.iter().any(|e| e.contains("Block 4: single block has no exercises")));
    }

    #[test]
    fn validation_never_mutates() {
        let plan = balanced_week();
        let before = plan.clone();
        let _ = validate_plan(&plan, &no_context());
        assert_eq!(plan, before);
        let _ = rest_day(1);
    }
}
