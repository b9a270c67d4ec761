//! Audit records for generation cycles.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use kettle_db::queries::generation_log::{self, NewGenerationLog};

use crate::profile::UserProfile;

/// Who and what a generation cycle was for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub profile_key: String,
    pub user_id: Option<String>,
    pub goal: String,
    pub experience: String,
    pub sport: Option<String>,
}

impl AuditContext {
    pub fn for_profile(profile: &UserProfile, user_id: Option<String>) -> Self {
        Self {
            profile_key: profile.profile_key(),
            user_id,
            goal: profile.goal(),
            experience: profile.experience(),
            sport: profile.sport().map(str::to_owned),
        }
    }
}

/// The outcome of one generation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub context: AuditContext,
    pub success: bool,
    /// Errors of the final attempt; empty on success.
    pub validation_errors: Vec<String>,
    pub attempt_count: u32,
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<()>;
}

// Compile-time assertion: AuditSink must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn AuditSink) {}
};

/// Writes records to the `generation_log` table.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<&AuditRecord> for NewGenerationLog {
    fn from(record: &AuditRecord) -> Self {
        let context = &record.context;
        Self {
            profile_key: context.profile_key.clone(),
            user_id: context.user_id.clone(),
            success: record.success,
            validation_errors: record.validation_errors.clone(),
            attempt_count: i32::try_from(record.attempt_count).unwrap_or(i32::MAX),
            goal: context.goal.clone(),
            experience: context.experience.clone(),
            sport: context.sport.clone(),
        }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        let row = generation_log::insert_generation_log(&self.pool, &record.into()).await?;
        debug!(id = %row.id, success = row.success, "recorded generation cycle");
        Ok(())
    }
}
