use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/kettle-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Audit writes are one small insert per generation cycle.
const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a connection pool for the audit database.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.redacted_url()))
}

/// Run all pending embedded migrations against the pool.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!(migrations = MIGRATOR.iter().count(), "audit schema up to date");
    Ok(())
}

/// Quote a database name for `CREATE DATABASE`, which takes no bind
/// parameters. Accepts ASCII letters, digits, `_` and `-`.
fn quoted_database_name(name: &str) -> Result<String> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("database name {name:?} contains invalid characters");
    }
    Ok(format!("\"{name}\""))
}

/// Create the audit database through the `postgres` maintenance database
/// when it is missing. Returns whether it was created.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config
        .database_name()
        .context("could not determine database name from URL")?;
    let quoted = quoted_database_name(db_name)?;

    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.maintenance_url())
        .await
        .context("failed to connect to the maintenance database")?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint_pool)
            .await
            .context("failed to query pg_database")?;

    let created = if exists {
        false
    } else {
        maint_pool
            .execute(format!("CREATE DATABASE {quoted}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "audit database created");
        true
    };

    maint_pool.close().await;
    Ok(created)
}

/// What `kettle db-init` reports about a migrated audit database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStatus {
    pub applied_migrations: i64,
    pub generation_log_rows: i64,
    pub latest_entry: Option<DateTime<Utc>>,
}

pub async fn database_status(pool: &PgPool) -> Result<DatabaseStatus> {
    let applied_migrations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await
            .context("failed to read migration history")?;

    let (generation_log_rows, latest_entry): (i64, Option<DateTime<Utc>>) =
        sqlx::query_as("SELECT COUNT(*), MAX(created_at) FROM generation_log")
            .fetch_one(pool)
            .await
            .context("failed to summarize generation_log")?;

    Ok(DatabaseStatus {
        applied_migrations,
        generation_log_rows,
        latest_entry,
    })
}
