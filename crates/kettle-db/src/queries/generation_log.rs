//! Database query functions for the `generation_log` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::models::{GenerationLog, OutcomeFilter, SuccessRate};

/// Parameters for inserting a generation log row.
#[derive(Debug, Clone)]
pub struct NewGenerationLog {
    pub profile_key: String,
    pub user_id: Option<String>,
    pub success: bool,
    pub validation_errors: Vec<String>,
    pub attempt_count: i32,
    pub goal: String,
    pub experience: String,
    pub sport: Option<String>,
}

/// Insert a generation log row. Returns the row with server-generated
/// defaults (id, created_at).
pub async fn insert_generation_log(pool: &PgPool, new: &NewGenerationLog) -> Result<GenerationLog> {
    let row = sqlx::query_as::<_, GenerationLog>(
        "INSERT INTO generation_log \
         (profile_key, user_id, success, validation_errors, attempt_count, goal, experience, sport) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(&new.profile_key)
    .bind(&new.user_id)
    .bind(new.success)
    .bind(Json(&new.validation_errors))
    .bind(new.attempt_count)
    .bind(&new.goal)
    .bind(&new.experience)
    .bind(&new.sport)
    .fetch_one(pool)
    .await
    .with_context(|| {
        format!(
            "failed to insert generation log for profile {}",
            new.profile_key
        )
    })?;

    Ok(row)
}

/// Most recent generation cycles first, optionally filtered by outcome.
pub async fn list_recent(
    pool: &PgPool,
    filter: OutcomeFilter,
    limit: i64,
) -> Result<Vec<GenerationLog>> {
    let rows = sqlx::query_as::<_, GenerationLog>(
        "SELECT * FROM generation_log \
         WHERE ($1::boolean IS NULL OR success = $1) \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(filter.success())
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list generation log ({filter})"))?;

    Ok(rows)
}

/// Generation cycles for one profile key, most recent first.
pub async fn list_for_profile(
    pool: &PgPool,
    profile_key: &str,
    limit: i64,
) -> Result<Vec<GenerationLog>> {
    let rows = sqlx::query_as::<_, GenerationLog>(
        "SELECT * FROM generation_log \
         WHERE profile_key = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(profile_key)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list generation log for profile {profile_key}"))?;

    Ok(rows)
}

/// Acceptance figures for cycles created at or after `since` (all rows when
/// `None`).
pub async fn success_rate(pool: &PgPool, since: Option<DateTime<Utc>>) -> Result<SuccessRate> {
    let rate = sqlx::query_as::<_, SuccessRate>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE success) AS succeeded, \
                AVG(attempt_count)::float8 AS average_attempts \
         FROM generation_log \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1)",
    )
    .bind(since)
    .fetch_one(pool)
    .await
    .context("failed to compute generation success rate")?;

    Ok(rate)
}
