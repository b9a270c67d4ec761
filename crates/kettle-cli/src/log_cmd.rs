//! `kettle log` command: show recent generation cycles from the audit log.

use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use kettle_db::models::{GenerationLog, OutcomeFilter};
use kettle_db::queries::generation_log;

/// Run the log command.
pub async fn run_log(
    pool: &PgPool,
    profile_key: Option<&str>,
    outcome: OutcomeFilter,
    limit: i64,
    since_days: Option<i64>,
) -> Result<()> {
    let rows: Vec<GenerationLog> = match profile_key {
        Some(key) => generation_log::list_for_profile(pool, key, limit)
            .await?
            .into_iter()
            .filter(|row| outcome.success().is_none_or(|s| s == row.success))
            .collect(),
        None => generation_log::list_recent(pool, outcome, limit).await?,
    };

    if rows.is_empty() {
        println!("No generation cycles recorded.");
        return Ok(());
    }

    println!("Generation cycles ({}):", rows.len());
    for row in &rows {
        println!("  {}", summarize_row(row));
        for error in row.validation_errors.0.iter().take(3) {
            println!("      {}", truncate(error, 100));
        }
        if row.validation_errors.0.len() > 3 {
            println!("      ... and {} more", row.validation_errors.0.len() - 3);
        }
    }

    let since = since_days.map(|days| Utc::now() - Duration::days(days));
    let rate = generation_log::success_rate(pool, since).await?;
    if let Some(ratio) = rate.ratio() {
        let window = since_days.map_or("all time".to_string(), |d| format!("last {d} days"));
        println!();
        println!(
            "Accepted ({window}): {}/{} ({:.0}%), average attempts {:.2}",
            rate.succeeded,
            rate.total,
            ratio * 100.0,
            rate.average_attempts.unwrap_or_default()
        );
    }

    Ok(())
}

/// One-line summary of a generation cycle.
fn summarize_row(row: &GenerationLog) -> String {
    let time = row.created_at.format("%Y-%m-%d %H:%M:%S");
    let outcome = if row.success { "accepted" } else { "failed" };
    let sport = row
        .sport
        .as_deref()
        .map(|s| format!(" sport={s}"))
        .unwrap_or_default();
    format!(
        "[{time}] {outcome} after {} attempt(s): goal={} exp={}{sport} key={}",
        row.attempt_count,
        row.goal,
        row.experience,
        &row.profile_key[..row.profile_key.len().min(12)]
    )
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max.saturating_sub(3)) {
        Some((idx, _)) if text.chars().count() > max => format!("{}...", &text[..idx]),
        _ => text.to_string(),
    }
}
