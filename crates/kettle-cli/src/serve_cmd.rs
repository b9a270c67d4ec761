//! `kettle serve`: the pure pipeline operations and the audit log over HTTP.

use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use kettle_core::dictionary::Dictionary;
use kettle_core::normalize::{identify_colloquial_terms, resolve_abbreviations};
use kettle_core::notation::{detect_workout_format, scan_notation};
use kettle_core::plan::decode_plan;
use kettle_core::validate::{RawValidationContext, ValidationContext, validate_plan};
use kettle_db::models::OutcomeFilter;
use kettle_db::queries::generation_log;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub plan: Value,
    #[serde(default)]
    pub context: RawValidationContext,
}

#[derive(Debug, Deserialize)]
pub struct AttemptsQuery {
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub profile_key: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/api/normalize", post(normalize))
        .route("/api/detect", post(detect))
        .route("/api/validate", post(validate))
        .route("/api/attempts", get(list_attempts))
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("kettle serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("kettle serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[tracing::instrument(skip_all)]
async fn normalize(Json(req): Json<TextRequest>) -> Json<Value> {
    let dict = Dictionary::builtin();
    Json(json!({
        "normalized": resolve_abbreviations(dict, &req.text),
        "colloquial": identify_colloquial_terms(dict, &req.text),
    }))
}

#[tracing::instrument(skip_all)]
async fn detect(Json(req): Json<TextRequest>) -> Json<Value> {
    let format = detect_workout_format(&req.text);
    let cues = scan_notation(&req.text);
    Json(json!({
        "format": format,
        "description": format.description(),
        "cues": cues,
    }))
}

#[tracing::instrument(skip_all)]
async fn validate(Json(req): Json<ValidateRequest>) -> Result<axum::response::Response, AppError> {
    let plan = decode_plan(req.plan).map_err(|e| AppError::bad_request(e.to_string()))?;
    let context = ValidationContext::from_raw(&req.context).with_library_priorities();
    Ok(Json(validate_plan(&plan, &context)).into_response())
}

#[tracing::instrument(skip(pool))]
async fn list_attempts(
    State(pool): State<PgPool>,
    Query(query): Query<AttemptsQuery>,
) -> Result<axum::response::Response, AppError> {
    let outcome: OutcomeFilter = match query.outcome.as_deref() {
        Some(s) => s.parse().map_err(|e| AppError::bad_request(format!("{e}")))?,
        None => OutcomeFilter::All,
    };
    let limit = query.limit.clamp(1, 500);

    let rows = match query.profile_key.as_deref() {
        Some(key) => generation_log::list_for_profile(&pool, key, limit)
            .await
            .map_err(AppError::internal)?
            .into_iter()
            .filter(|row| outcome.success().is_none_or(|s| s == row.success))
            .collect::<Vec<_>>(),
        None => generation_log::list_recent(&pool, outcome, limit)
            .await
            .map_err(AppError::internal)?,
    };

    Ok(Json(rows).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use kettle_db::queries::generation_log::{NewGenerationLog, insert_generation_log};
    use kettle_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    /// A pool that never connects; enough for the handlers that do not
    /// touch the database.
    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost:1/unused")
            .unwrap()
    }

    async fn post_json(pool: PgPool, uri: &str, body: Value) -> axum::response::Response {
        let app = super::build_router(pool);
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn get(pool: PgPool, uri: &str) -> axum::response::Response {
        let app = super::build_router(pool);
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn three_day_plan() -> Value {
        let warmups: Vec<Value> = ["Cat-Cow", "Arm Circles", "Hip Circles", "Band Pull-Apart", "Glute Bridge"]
            .iter()
            .map(|n| {
                json!({"exercise_name": n, "category": "warmup",
                       "metrics_template": {"type": "sets_reps", "target_sets": 1, "target_reps": 10}})
            })
            .collect();
        let mains = |names: &[&str]| -> Vec<Value> {
            names
                .iter()
                .map(|n| {
                    json!({"exercise_name": n, "category": "main",
                           "metrics_template": {"type": "sets_reps_weight", "target_sets": 3, "target_reps": "8-10"}})
                })
                .collect()
        };
        let day = |d: u8, focus: &str, names: &[&str]| {
            json!({"day_of_week": d, "focus": focus, "blocks": [
                {"type": "single", "exercises": warmups.clone()},
                {"type": "single", "exercises": mains(names)}
            ]})
        };
        json!({
            "name": "Three days",
            "weeklyPlan": [
                day(1, "Push", &["Bench Press", "Overhead Press", "Dips", "Push-up"]),
                {"day_of_week": 2, "focus": "Rest", "blocks": []},
                day(3, "Pull", &["Pull-up", "Barbell Row", "Face Pull", "Farmer Carry"]),
                {"day_of_week": 4, "focus": "Rest", "blocks": []},
                day(5, "Legs", &["Back Squat", "Deadlift", "Lunge", "Plank"]),
                {"day_of_week": 6, "focus": "Rest", "blocks": []},
                {"day_of_week": 7, "focus": "Rest", "blocks": []}
            ]
        })
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn normalize_expands_shorthand() {
        let resp = post_json(lazy_pool(), "/api/normalize", json!({"text": "E3MOM 12"})).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["normalized"], "Every 3 Minutes on the Minute 12");
    }

    #[tokio::test]
    async fn detect_reports_format_and_cues() {
        let resp = post_json(
            lazy_pool(),
            "/api/detect",
            json!({"text": "A1: Pull-ups 0s / A2: Push-ups 90s, 4 Rounds"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["format"], "superset");
        assert!(json["cues"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[tokio::test]
    async fn validate_accepts_string_context() {
        let resp = post_json(
            lazy_pool(),
            "/api/validate",
            json!({
                "plan": three_day_plan(),
                "context": {"desiredFrequency": "5", "preferredSessionLength": "30"}
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["valid"], false);
        let errors = json["errors"].as_array().unwrap();
        assert!(
            errors.iter().any(|e| {
                let e = e.as_str().unwrap_or_default();
                e.contains("3 training days") && e.contains("requested 5")
            }),
            "{errors:?}"
        );
    }

    #[tokio::test]
    async fn validate_flags_missing_sport_priorities() {
        let resp = post_json(
            lazy_pool(),
            "/api/validate",
            json!({
                "plan": three_day_plan(),
                "context": {"sport": "boxing", "sportPriorityExercises": ["heavy_bag_work", "medicine_ball_slam"]}
            }),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"].as_array().unwrap().len(), 1, "{json}");
    }

    #[tokio::test]
    async fn validate_rejects_malformed_plan() {
        let resp = post_json(lazy_pool(), "/api/validate", json!({"plan": {"name": 3}})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn attempts_rejects_unknown_outcome() {
        let resp = get(lazy_pool(), "/api/attempts?outcome=maybe").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn attempts_lists_rows() {
        let (pool, db_name) = create_test_db().await;

        for success in [true, false] {
            insert_generation_log(
                &pool,
                &NewGenerationLog {
                    profile_key: "abc".into(),
                    user_id: None,
                    success,
                    validation_errors: if success { vec![] } else { vec!["Weekly plan is empty".into()] },
                    attempt_count: 2,
                    goal: "strength".into(),
                    experience: "beginner".into(),
                    sport: None,
                },
            )
            .await
            .unwrap();
        }

        let resp = get(pool.clone(), "/api/attempts").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);

        let resp = get(pool.clone(), "/api/attempts?outcome=failed&profile_key=abc").await;
        let json = body_json(resp).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["success"], false);

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
