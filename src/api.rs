//! Read-only query API over the store.
//!
//! Serves whatever the fetch cycles have persisted; never writes, never
//! scrapes. An empty store is a 404 on `/api/latest`, not a trigger.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::store::Store;

const DEFAULT_PAST_DAYS: u64 = 60;
const MAX_PAST_DAYS: u64 = 365;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/latest", get(latest))
        .route("/api/latest-day", get(latest_day))
        .route("/api/past", get(past))
        .route("/api/by-date", get(by_date))
        .route("/debug/db", get(debug_db))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Storage-level failures become opaque 500s; details go to the log.
fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!(error = %err, "read api storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "storage failure" })),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn latest(State(state): State<AppState>) -> Response {
    match state.store.latest().await {
        Ok(Some(row)) => Json(row).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no data yet" })),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}

/// One slot of the fixed eight-section daily board.
#[derive(serde::Serialize)]
struct DaySection {
    number: usize,
    field1: String,
    field2: String,
    time: String,
}

/// Split a two-part payload like `"88-12"` into its fields; anything
/// else (including three-part payloads) renders as placeholders.
fn split_result_pair(text: &str) -> (String, String) {
    let parts: Vec<&str> = text.split('-').collect();
    match parts.as_slice() {
        [a, b] => (a.trim().to_string(), b.trim().to_string()),
        _ => ("-".to_string(), "-".to_string()),
    }
}

/// Today's draws as exactly eight sections, the shape the downstream
/// content system renders verbatim. Missing slots are padded with `-`.
async fn latest_day(State(state): State<AppState>) -> Response {
    let today = Utc::now().date_naive();
    let rows = match state.store.by_date(today).await {
        Ok(rows) => rows,
        Err(err) => return internal_error(err),
    };

    let sections: Vec<DaySection> = (0..8)
        .map(|i| match rows.get(i) {
            Some(row) => {
                let (field1, field2) = split_result_pair(&row.result_text);
                DaySection {
                    number: i + 1,
                    field1,
                    field2,
                    time: row
                        .draw_time
                        .clone()
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| "-".to_string()),
                }
            }
            None => DaySection {
                number: i + 1,
                field1: "-".to_string(),
                field2: "-".to_string(),
                time: "-".to_string(),
            },
        })
        .collect();

    Json(json!({
        "success": true,
        "date": today.format("%Y-%m-%d").to_string(),
        "dateFormatted": today.format("%A, %d %B %Y").to_string(),
        "sections": sections,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct PastParams {
    days: Option<u64>,
}

async fn past(State(state): State<AppState>, Query(params): Query<PastParams>) -> Response {
    let days = params.days.unwrap_or(DEFAULT_PAST_DAYS).clamp(1, MAX_PAST_DAYS);
    let to = Utc::now().date_naive();
    let from = to
        .checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN);
    match state.store.range(from, to).await {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => internal_error(err),
    }
}

#[derive(Deserialize)]
struct ByDateParams {
    date: Option<String>,
}

async fn by_date(State(state): State<AppState>, Query(params): Query<ByDateParams>) -> Response {
    let raw = params.date.unwrap_or_default();
    let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "date must be YYYY-MM-DD" })),
        )
            .into_response();
    };
    match state.store.by_date(date).await {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => internal_error(err),
    }
}

/// Lightweight debug endpoint: DB location and row count.
async fn debug_db(State(state): State<AppState>) -> Response {
    match state.store.row_count().await {
        Ok(rows) => Json(json!({
            "db_path": state.store.db_path().map(|p| p.display().to_string()),
            "rows": rows,
        }))
        .into_response(),
        Err(err) => internal_error(err),
    }
}
