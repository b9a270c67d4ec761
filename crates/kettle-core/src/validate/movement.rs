//! Movement-pattern classification by exercise name.

use std::collections::BTreeSet;
use std::fmt;

/// The six fundamental movement patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MovementPattern {
    Squat,
    Hinge,
    Push,
    Pull,
    Carry,
    Core,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 6] = [
        Self::Squat,
        Self::Hinge,
        Self::Push,
        Self::Pull,
        Self::Carry,
        Self::Core,
    ];

    /// Lowercase fragments that mark an exercise name as this pattern.
    fn cues(self) -> &'static [&'static str] {
        match self {
            Self::Squat => &["squat", "lunge", "leg press", "step up", "step-up", "pistol"],
            Self::Hinge => &[
                "deadlift",
                "rdl",
                "hip thrust",
                "good morning",
                "swing",
                "glute bridge",
                "hinge",
                "clean",
                "snatch",
            ],
            Self::Push => &["press", "push", "dip", "bench", "fly", "thruster"],
            Self::Pull => &["pull", "row", "chin", "curl", "lat "],
            Self::Carry => &["carry", "farmer", "suitcase", "yoke", "waiter walk"],
            Self::Core => &[
                "plank",
                "crunch",
                "sit-up",
                "sit up",
                "dead bug",
                "pallof",
                "hollow",
                "russian twist",
                "leg raise",
                "rollout",
                "woodchop",
                "bird dog",
                "toes to bar",
                "core",
            ],
        }
    }
}

impl fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Squat => "squat",
            Self::Hinge => "hinge",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Carry => "carry",
            Self::Core => "core",
        };
        f.write_str(s)
    }
}

/// Every pattern `name` plausibly trains. May be empty or contain several.
pub fn classify(name: &str) -> BTreeSet<MovementPattern> {
    let lower = name.to_lowercase();
    MovementPattern::ALL
        .into_iter()
        .filter(|pattern| pattern.cues().iter().any(|cue| lower.contains(cue)))
        .collect()
}

/// Patterns not trained by any of `names`.
pub fn missing_patterns<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<MovementPattern> {
    let covered: BTreeSet<MovementPattern> = names.into_iter().flat_map(classify).collect();
    MovementPattern::ALL
        .into_iter()
        .filter(|p| !covered.contains(p))
        .collect()
}
