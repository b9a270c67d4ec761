//! User profiles for plan generation.
//!
//! A [`UserProfile`] carries the fields that shape a generated plan. Its
//! [`UserProfile::profile_key`] identifies equivalent profiles in the
//! generation audit log.

pub mod sports;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

pub use sports::{SportProfile, sport_profile, sports};

// ---------------------------------------------------------------------------
// Session length
// ---------------------------------------------------------------------------

/// Preferred strength-session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionLength {
    Thirty,
    FortyFive,
    Sixty,
    SeventyFive,
}

impl SessionLength {
    pub const ALL: [SessionLength; 4] = [
        Self::Thirty,
        Self::FortyFive,
        Self::Sixty,
        Self::SeventyFive,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::Thirty => 30,
            Self::FortyFive => 45,
            Self::Sixty => 60,
            Self::SeventyFive => 75,
        }
    }

    pub fn from_minutes(minutes: u32) -> Result<Self, SessionLengthParseError> {
        Self::ALL
            .into_iter()
            .find(|len| len.minutes() == minutes)
            .ok_or_else(|| SessionLengthParseError(minutes.to_string()))
    }

    /// Inclusive `[min, max]` count of main exercises for one training day.
    pub fn exercise_band(self) -> (usize, usize) {
        match self {
            Self::Thirty => (4, 6),
            Self::FortyFive => (6, 8),
            Self::Sixty => (8, 10),
            Self::SeventyFive => (9, 12),
        }
    }

    /// Supersets per session that fit the time box.
    pub fn superset_range(self) -> &'static str {
        match self {
            Self::Thirty => "0-1",
            Self::FortyFive => "1-2",
            Self::Sixty => "2-3",
            Self::SeventyFive => "2-4",
        }
    }

    /// Typical rest between sets, in seconds.
    pub fn rest_range_s(self) -> &'static str {
        match self {
            Self::Thirty | Self::FortyFive => "60-90",
            Self::Sixty | Self::SeventyFive => "90-120",
        }
    }
}

impl fmt::Display for SessionLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minutes())
    }
}

impl FromStr for SessionLength {
    type Err = SessionLengthParseError;

    /// Accepts `"45"`, `"45min"` and `"45 minutes"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
        digits
            .parse::<u32>()
            .map_err(|_| SessionLengthParseError(s.to_owned()))
            .and_then(Self::from_minutes)
            .map_err(|_| SessionLengthParseError(s.to_owned()))
    }
}

impl Serialize for SessionLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.minutes())
    }
}

impl<'de> Deserialize<'de> for SessionLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Minutes(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Minutes(n) => Self::from_minutes(n),
            Raw::Text(s) => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing an unsupported [`SessionLength`].
#[derive(Debug, Clone)]
pub struct SessionLengthParseError(pub String);

impl fmt::Display for SessionLengthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid session length: {:?} (expected 30, 45, 60 or 75)",
            self.0
        )
    }
}

impl std::error::Error for SessionLengthParseError {}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Everything the generator knows about the athlete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserProfile {
    /// `strength`, `aesthetic`, `athletic`, `health`, ...
    pub goal: String,
    /// `beginner`, `intermediate`, `advanced`.
    pub experience: String,
    /// Training days per week.
    pub frequency: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_length: Option<SessionLength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

fn norm(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

impl UserProfile {
    pub fn new(goal: impl Into<String>, experience: impl Into<String>, frequency: u8) -> Self {
        Self {
            goal: goal.into(),
            experience: experience.into(),
            frequency,
            sex: None,
            equipment: None,
            pain_points: Vec::new(),
            sport: None,
            session_length: None,
            additional_notes: None,
        }
    }

    pub fn goal(&self) -> String {
        norm(Some(&self.goal))
    }

    pub fn experience(&self) -> String {
        norm(Some(&self.experience))
    }

    /// The sport, when one is set and is not a "none" placeholder.
    pub fn sport(&self) -> Option<&str> {
        self.sport
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
    }

    /// Pain points with blanks removed.
    pub fn pain_points(&self) -> impl Iterator<Item = &str> {
        self.pain_points
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }

    /// Stable hex SHA-256 of the fields that shape a generation.
    pub fn profile_key(&self) -> String {
        let session = self
            .session_length
            .map(|s| s.to_string())
            .unwrap_or_default();
        let material = [
            self.goal(),
            self.experience(),
            self.frequency.to_string(),
            norm(self.sex.as_deref()),
            norm(self.sport()),
            session,
            norm(self.equipment.as_deref()),
        ]
        .join("|");
        hex::encode(Sha256::digest(material.as_bytes()))
    }

    /// A beginner with a strength or aesthetic goal, no pain points and no
    /// sport. These plans are served by the fast model.
    pub fn is_simple_case(&self) -> bool {
        let goal = self.goal();
        self.experience() == "beginner"
            && (goal == "strength" || goal == "aesthetic")
            && self.pain_points().next().is_none()
            && self.sport().is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
