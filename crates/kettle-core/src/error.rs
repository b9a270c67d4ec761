//! Errors escalated out of a plan-producing call.
//!
//! `Display` is what an end user sees. Technical context (HTTP status, body
//! excerpts, schema paths) stays in `detail` and goes to the log.

use thiserror::Error;

use crate::llm::{ModelError, UpstreamCategory};
use crate::plan::SchemaViolation;

#[derive(Debug, Clone, Error)]
pub enum PlanError {
    /// Model output was not JSON or did not match the plan schema. Never
    /// retried.
    #[error("The AI could not structure the plan. Please rephrase and try again.")]
    SchemaViolation { detail: String },

    /// The model service failed. Never retried at this layer.
    #[error("{category}")]
    Upstream {
        category: UpstreamCategory,
        detail: String,
    },

    /// Every attempt produced a well-formed plan that failed validation.
    #[error("Plan validation failed after {attempts} attempts: {}", .errors.join("; "))]
    ValidationExhausted { attempts: u32, errors: Vec<String> },
}

impl PlanError {
    /// Technical context for logs. For exhausted validation this is the
    /// final error list.
    pub fn detail(&self) -> String {
        match self {
            Self::SchemaViolation { detail } | Self::Upstream { detail, .. } => detail.clone(),
            Self::ValidationExhausted { errors, .. } => errors.join("; "),
        }
    }
}

impl From<SchemaViolation> for PlanError {
    fn from(err: SchemaViolation) -> Self {
        Self::SchemaViolation {
            detail: err.to_string(),
        }
    }
}

impl From<ModelError> for PlanError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Upstream { category, detail } => Self::Upstream { category, detail },
            // An empty or refused answer is output we cannot structure.
            ModelError::EmptyResponse { detail } | ModelError::SchemaRejected { detail } => {
                Self::SchemaViolation { detail }
            }
        }
    }
}
