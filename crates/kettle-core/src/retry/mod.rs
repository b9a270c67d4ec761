//! The bounded retry loop around a [`PlanAdapter`].
//!
//! ```text
//! Attempting -> Validating -> Accepted
//!                          -> Attempting (errors fed back)
//!                          -> Exhausted
//! ```
//!
//! Each attempt regenerates the whole plan. Validation errors from the
//! previous attempt are appended to the adapter's instructions verbatim.
//! Schema violations and upstream failures abort immediately. No partial
//! plan is ever returned.

pub mod audit;

use tracing::{info, warn};

use crate::adapter::PlanAdapter;
use crate::error::PlanError;
use crate::plan::WeeklyPlan;
use crate::validate::{ValidationContext, validate_plan};

pub use audit::{AuditContext, AuditRecord, AuditSink, PgAuditSink};

/// Attempts per call, the first one included.
pub const MAX_ATTEMPTS: u32 = 2;

/// An accepted plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    pub plan: WeeklyPlan,
    /// Attempts used, 1-based.
    pub attempts: u32,
    /// Validator warnings on the accepted plan.
    pub warnings: Vec<String>,
}

/// Where and how to record the outcome of a call.
pub struct Audit<'a> {
    pub sink: &'a dyn AuditSink,
    pub context: AuditContext,
}

/// Corrective instructions built from the previous attempt's errors.
pub fn feedback_for(errors: &[String]) -> String {
    let mut out = String::from("\n\nPREVIOUS ATTEMPT HAD ERRORS - FIX THESE:");
    for (i, error) in errors.iter().enumerate() {
        out.push_str(&format!("\n{}. {error}", i + 1));
    }
    out.push_str("\n\nRegenerate with these fixes applied.");
    out
}

/// Produce, validate and retry until the plan is accepted or
/// [`MAX_ATTEMPTS`] is reached.
///
/// When `audit` is given, one record is written on acceptance or
/// exhaustion. A failed write is logged and otherwise ignored.
pub async fn run_with_retry(
    adapter: &dyn PlanAdapter,
    context: &ValidationContext,
    audit: Option<&Audit<'_>>,
) -> Result<RetryOutcome, PlanError> {
    let mut feedback: Option<String> = None;
    let mut last_errors: Vec<String> = Vec::new();

    for attempt in 1..=MAX_ATTEMPTS {
        info!(adapter = adapter.name(), attempt, "attempting plan");
        let plan = adapter.produce(feedback.as_deref()).await?;

        let result = validate_plan(&plan, context);
        if result.valid {
            info!(
                adapter = adapter.name(),
                attempt,
                warnings = result.warnings.len(),
                "plan accepted"
            );
            record(audit, true, Vec::new(), attempt).await;
            return Ok(RetryOutcome {
                plan,
                attempts: attempt,
                warnings: result.warnings,
            });
        }

        warn!(
            adapter = adapter.name(),
            attempt,
            errors = result.errors.len(),
            "plan failed validation"
        );
        feedback = Some(feedback_for(&result.errors));
        last_errors = result.errors;
    }

    record(audit, false, last_errors.clone(), MAX_ATTEMPTS).await;
    Err(PlanError::ValidationExhausted {
        attempts: MAX_ATTEMPTS,
        errors: last_errors,
    })
}

async fn record(audit: Option<&Audit<'_>>, success: bool, errors: Vec<String>, attempts: u32) {
    let Some(audit) = audit else {
        return;
    };
    let record = AuditRecord {
        context: audit.context.clone(),
        success,
        validation_errors: errors,
        attempt_count: attempts,
    };
    if let Err(e) = audit.sink.record(&record).await {
        warn!(error = %e, "failed to write generation audit record (best-effort)");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
