//! Integration tests for the `generation_log` table.
//!
//! Each test runs against its own migrated database from
//! `kettle-test-utils` and drops it afterwards.

use kettle_db::models::OutcomeFilter;
use kettle_db::pool;
use kettle_db::queries::generation_log::{
    self, NewGenerationLog, insert_generation_log, list_for_profile, list_recent,
};
use kettle_test_utils::{create_test_db, drop_test_db};

fn sample(profile_key: &str, success: bool) -> NewGenerationLog {
    NewGenerationLog {
        profile_key: profile_key.to_string(),
        user_id: Some("user-7".to_string()),
        success,
        validation_errors: if success {
            vec![]
        } else {
            vec!["Day 1 (Push): 3 warmup exercises (expected 5-7)".to_string()]
        },
        attempt_count: if success { 1 } else { 2 },
        goal: "strength".to_string(),
        experience: "beginner".to_string(),
        sport: None,
    }
}

#[tokio::test]
async fn migrations_create_generation_log_table() {
    let (pool, db_name) = create_test_db().await;

    let status = pool::database_status(&pool).await.unwrap();
    assert_eq!(status.applied_migrations, 1);
    assert_eq!(status.generation_log_rows, 0);
    assert_eq!(status.latest_entry, None);

    let row = insert_generation_log(&pool, &sample("abc123", true))
        .await
        .unwrap();
    let status = pool::database_status(&pool).await.unwrap();
    assert_eq!(status.generation_log_rows, 1);
    assert_eq!(status.latest_entry, Some(row.created_at));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn insert_returns_row_with_defaults() {
    let (pool, db_name) = create_test_db().await;

    let row = insert_generation_log(&pool, &sample("abc123", false))
        .await
        .unwrap();
    assert_eq!(row.profile_key, "abc123");
    assert!(!row.success);
    assert_eq!(row.attempt_count, 2);
    assert_eq!(row.validation_errors.0.len(), 1);
    assert_eq!(row.user_id.as_deref(), Some("user-7"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_recent_filters_by_outcome() {
    let (pool, db_name) = create_test_db().await;

    insert_generation_log(&pool, &sample("a", true)).await.unwrap();
    insert_generation_log(&pool, &sample("b", false)).await.unwrap();
    insert_generation_log(&pool, &sample("c", true)).await.unwrap();

    let all = list_recent(&pool, OutcomeFilter::All, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    // Newest first.
    assert_eq!(all[0].profile_key, "c");

    let failed = list_recent(&pool, OutcomeFilter::Failed, 10).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].profile_key, "b");

    let limited = list_recent(&pool, OutcomeFilter::Succeeded, 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_for_profile_and_success_rate() {
    let (pool, db_name) = create_test_db().await;

    insert_generation_log(&pool, &sample("same", true)).await.unwrap();
    insert_generation_log(&pool, &sample("same", false)).await.unwrap();
    insert_generation_log(&pool, &sample("other", true)).await.unwrap();

    let rows = list_for_profile(&pool, "same", 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.profile_key == "same"));

    let rate = generation_log::success_rate(&pool, None).await.unwrap();
    assert_eq!(rate.total, 3);
    assert_eq!(rate.succeeded, 2);
    let avg = rate.average_attempts.unwrap();
    assert!((avg - 4.0 / 3.0).abs() < 1e-9, "unexpected average {avg}");

    let future = chrono::Utc::now() + chrono::Duration::days(1);
    let none = generation_log::success_rate(&pool, Some(future)).await.unwrap();
    assert_eq!(none.total, 0);
    assert_eq!(none.ratio(), None);

    pool.close().await;
    drop_test_db(&db_name).await;
}
