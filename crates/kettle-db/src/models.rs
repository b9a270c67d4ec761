use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which generation attempts to include when listing the audit log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeFilter {
    #[default]
    All,
    Succeeded,
    Failed,
}

impl OutcomeFilter {
    /// The `success` value to match, or `None` for every row.
    pub fn success(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Succeeded => Some(true),
            Self::Failed => Some(false),
        }
    }
}

impl fmt::Display for OutcomeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for OutcomeFilter {
    type Err = OutcomeFilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "succeeded" | "success" => Ok(Self::Succeeded),
            "failed" | "failure" => Ok(Self::Failed),
            other => Err(OutcomeFilterParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`OutcomeFilter`] string.
#[derive(Debug, Clone)]
pub struct OutcomeFilterParseError(pub String);

impl fmt::Display for OutcomeFilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid outcome filter: {:?} (expected all, succeeded, or failed)",
            self.0
        )
    }
}

impl std::error::Error for OutcomeFilterParseError {}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One persisted generation cycle (a row in `generation_log`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationLog {
    pub id: Uuid,
    pub profile_key: String,
    pub user_id: Option<String>,
    pub success: bool,
    pub validation_errors: Json<Vec<String>>,
    pub attempt_count: i32,
    pub goal: String,
    pub experience: String,
    pub sport: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate acceptance figures over a set of generation cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SuccessRate {
    pub total: i64,
    pub succeeded: i64,
    pub average_attempts: Option<f64>,
}

impl SuccessRate {
    /// Accepted cycles as a fraction of all cycles, `None` when empty.
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.succeeded as f64 / self.total as f64)
    }
}
