//! Ordered format detection.
//!
//! Rules are evaluated top to bottom and the first match wins, so the more
//! specific multi-token cues sit above looser keywords they could overlap
//! with. Text matching no rule is [`WorkoutFormat::Standard`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The dominant notation pattern of a workout text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutFormat {
    Emom,
    Amrap,
    Rft,
    DeathBy,
    Ladder,
    Pyramid,
    Chipper,
    Superset,
    Tabata,
    Cluster,
    Density,
    Standard,
}

impl WorkoutFormat {
    /// One-line explanation of the format for model instructions.
    pub fn description(self) -> &'static str {
        match self {
            Self::Emom => {
                "Every minute (or every N minutes) on the minute: work starts at the top of each interval, rest is the remainder"
            }
            Self::Amrap => "As many rounds or reps as possible inside a fixed time box",
            Self::Rft => "A fixed amount of work completed for time, often over several rounds",
            Self::DeathBy => {
                "Death by: add one rep every minute until the athlete can no longer finish the reps inside the minute"
            }
            Self::Ladder => "Reps climb or descend by a fixed step from set to set",
            Self::Pyramid => "Reps or load rise to a peak and come back down",
            Self::Chipper => "One long list of movements worked through once, start to finish",
            Self::Superset => {
                "Letter-paired exercises (A1/A2, B1/B2) performed back to back with rest after the last one"
            }
            Self::Tabata => "20 seconds of work and 10 seconds of rest for 8 rounds",
            Self::Cluster => "Sets broken into small clusters with short intra-set rest",
            Self::Density => "As much quality volume as possible within a fixed block of time",
            Self::Standard => "Conventional straight sets and reps",
        }
    }
}

impl fmt::Display for WorkoutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Emom => "emom",
            Self::Amrap => "amrap",
            Self::Rft => "rft",
            Self::DeathBy => "death_by",
            Self::Ladder => "ladder",
            Self::Pyramid => "pyramid",
            Self::Chipper => "chipper",
            Self::Superset => "superset",
            Self::Tabata => "tabata",
            Self::Cluster => "cluster",
            Self::Density => "density",
            Self::Standard => "standard",
        };
        f.write_str(s)
    }
}

impl FromStr for WorkoutFormat {
    type Err = WorkoutFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emom" => Ok(Self::Emom),
            "amrap" => Ok(Self::Amrap),
            "rft" => Ok(Self::Rft),
            "death_by" => Ok(Self::DeathBy),
            "ladder" => Ok(Self::Ladder),
            "pyramid" => Ok(Self::Pyramid),
            "chipper" => Ok(Self::Chipper),
            "superset" => Ok(Self::Superset),
            "tabata" => Ok(Self::Tabata),
            "cluster" => Ok(Self::Cluster),
            "density" => Ok(Self::Density),
            "standard" => Ok(Self::Standard),
            other => Err(WorkoutFormatParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`WorkoutFormat`] string.
#[derive(Debug, Clone)]
pub struct WorkoutFormatParseError(pub String);

impl fmt::Display for WorkoutFormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid workout format: {:?}", self.0)
    }
}

impl std::error::Error for WorkoutFormatParseError {}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Detection rules in priority order.
static RULES: LazyLock<Vec<(WorkoutFormat, Regex)>> = LazyLock::new(|| {
    [
        (WorkoutFormat::Emom, r"\be\d*mom\b|\bevery\s+\d*\s*minutes?\s+on\s+the\s+minute\b"),
        (WorkoutFormat::Amrap, r"\bamr[ae]p\b|\bas\s+many\s+(?:rounds|reps)\s+as\s+possible\b"),
        (WorkoutFormat::Rft, r"\brft\b|\bfor\s+time\b"),
        (WorkoutFormat::DeathBy, r"\bdeath\s+by\b"),
        (WorkoutFormat::Ladder, r"\bladders?\b"),
        (WorkoutFormat::Pyramid, r"\bpyramids?\b"),
        (WorkoutFormat::Chipper, r"\bchipper\b"),
        (
            WorkoutFormat::Superset,
            r"(?s)\ba1\b.*\ba2\b|\bb1\b.*\bb2\b|\bc1\b.*\bc2\b|\bsuper\s*-?sets?\b",
        ),
        (WorkoutFormat::Tabata, r"\btabata\b"),
        (WorkoutFormat::Cluster, r"\bclusters?\b"),
        (WorkoutFormat::Density, r"\bdensity\b"),
    ]
    .into_iter()
    .map(|(format, pattern)| {
        let regex = Regex::new(&format!("(?i){pattern}"))
            .expect("format detection patterns are valid regexes");
        (format, regex)
    })
    .collect()
});

/// Classify the dominant notation of `text`. First matching rule wins.
pub fn detect_workout_format(text: &str) -> WorkoutFormat {
    RULES
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map_or(WorkoutFormat::Standard, |(format, _)| *format)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
