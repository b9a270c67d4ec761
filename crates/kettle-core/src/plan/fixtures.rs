//! Plan builders shared by unit tests across the crate.

use super::model::{
    ExerciseCategory, MetricsTemplate, PlanDay, PlanExercise, TargetReps, WeeklyPlan, WorkoutBlock,
};

pub(crate) fn exercise(name: &str, category: ExerciseCategory) -> PlanExercise {
    PlanExercise {
        exercise_name: name.to_string(),
        category,
        notes: None,
        rpe: None,
        metrics_template: MetricsTemplate::SetsReps {
            target_sets: 3,
            target_reps: TargetReps::Count(10),
            rest_period_s: Some(60),
        },
    }
}

pub(crate) fn single(names: &[&str], category: ExerciseCategory) -> WorkoutBlock {
    WorkoutBlock::Single {
        title: None,
        exercises: names.iter().map(|n| exercise(n, category)).collect(),
    }
}

pub(crate) fn rest_day(day_of_week: u8) -> PlanDay {
    PlanDay {
        day_of_week,
        focus: "Rest".to_string(),
        notes: None,
        blocks: vec![],
    }
}

pub(crate) const WARMUP: [&str; 5] = [
    "Cat-Cow",
    "Arm Circles",
    "Band Pull-Apart",
    "Hip Circles",
    "Glute Bridge",
];

pub(crate) const COOLDOWN: [&str; 2] = ["Pec Stretch", "Child's Pose"];

/// A day with the standard warmup, `mains` as main work and a short cooldown.
pub(crate) fn training_day(day_of_week: u8, focus: &str, mains: &[&str]) -> PlanDay {
    PlanDay {
        day_of_week,
        focus: focus.to_string(),
        notes: None,
        blocks: vec![
            single(&WARMUP, ExerciseCategory::Warmup),
            single(mains, ExerciseCategory::Main),
            single(&COOLDOWN, ExerciseCategory::Cooldown),
        ],
    }
}

/// Fill the days `1..=7` not covered by `days` with rest days.
pub(crate) fn week(name: &str, days: Vec<PlanDay>) -> WeeklyPlan {
    let weekly_plan: Vec<PlanDay> = (1..=7)
        .map(|d| {
            days.iter()
                .find(|day| day.day_of_week == d)
                .cloned()
                .unwrap_or_else(|| rest_day(d))
        })
        .collect();
    WeeklyPlan {
        name: name.to_string(),
        weekly_plan,
        daily_routine: None,
    }
}

/// One chest session on Monday, rest the remaining days.
pub(crate) fn chest_today() -> WeeklyPlan {
    week(
        "Chest Day",
        vec![training_day(
            1,
            "Chest",
            &["Bench Press", "Incline Dumbbell Press", "Cable Fly", "Dips"],
        )],
    )
}

/// Four training days covering every movement pattern, six main lifts each.
pub(crate) fn balanced_week() -> WeeklyPlan {
    week(
        "Balanced Week",
        vec![
            training_day(
                1,
                "Lower",
                &[
                    "Back Squat",
                    "Romanian Deadlift",
                    "Walking Lunge",
                    "Leg Curl",
                    "Calf Raise",
                    "Plank",
                ],
            ),
            training_day(
                2,
                "Upper",
                &[
                    "Bench Press",
                    "Barbell Row",
                    "Overhead Press",
                    "Pull-up",
                    "Tricep Pushdown",
                    "Face Pull",
                ],
            ),
            training_day(
                4,
                "Full Body",
                &[
                    "Deadlift",
                    "Goblet Squat",
                    "Push-up",
                    "Farmer Carry",
                    "Pallof Press",
                    "Dead Bug",
                ],
            ),
            training_day(
                6,
                "Conditioning",
                &[
                    "Kettlebell Swing",
                    "Front Squat",
                    "Dumbbell Row",
                    "Suitcase Carry",
                    "Landmine Press",
                    "Hollow Hold",
                ],
            ),
        ],
    )
}
