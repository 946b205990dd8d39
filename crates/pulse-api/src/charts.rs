use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, warn};

use pulse_db::models::ChartRow;
use pulse_db::queries::ReplaceResult;
use pulse_types::api::{Claims, ChartRequest};
use pulse_types::models::{Chart, DataPoint};

use crate::{AppState, error::ApiError};

const NAME_AND_SERIES_REQUIRED: ApiError = ApiError::BadRequest("Name and series required");

pub async fn list_charts(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.list_charts())
        .await
        .map_err(join_error)??;

    let charts: Vec<Chart> = rows.into_iter().map(chart_response).collect();
    Ok(Json(charts))
}

pub async fn create_chart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ChartRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let (name, series) = chart_body(payload)?;

    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || db.create_chart(&name, &series))
        .await
        .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(chart_response(row))))
}

pub async fn update_chart(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ChartRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let (name, series) = chart_body(payload)?;

    let db = state.db.clone();
    let outcome = tokio::task::spawn_blocking(move || db.replace_chart(id, &name, &series))
        .await
        .map_err(join_error)??;

    match outcome {
        ReplaceResult::Replaced(row) => Ok(Json(chart_response(row))),
        ReplaceResult::Missing => Err(ApiError::ChartNotFound),
        ReplaceResult::Contended => Err(ApiError::Conflict),
    }
}

pub async fn delete_chart(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.db.clone();
    let deleted = tokio::task::spawn_blocking(move || db.delete_chart(id))
        .await
        .map_err(join_error)??;

    if !deleted {
        return Err(ApiError::ChartNotFound);
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

/// Authorization comes before body validation and existence checks, so a
/// non-admin sees 403 even for a nonexistent chart or a malformed body.
fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

fn chart_body(
    payload: Result<Json<ChartRequest>, JsonRejection>,
) -> Result<(String, Vec<DataPoint>), ApiError> {
    let Json(req) = payload.map_err(|_| NAME_AND_SERIES_REQUIRED)?;
    let name = req.name.filter(|n| !n.is_empty()).ok_or(NAME_AND_SERIES_REQUIRED)?;
    let series = req.series.ok_or(NAME_AND_SERIES_REQUIRED)?;
    Ok((name, series))
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}"))
}

fn chart_response(row: ChartRow) -> Chart {
    Chart {
        id: row.id,
        name: row.name,
        series: row.series,
        created_at: parse_store_timestamp(&row.created_at, row.id),
        updated_at: parse_store_timestamp(&row.updated_at, row.id),
    }
}

fn parse_store_timestamp(raw: &str, chart_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // a timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on chart {}: {}", raw, chart_id, e);
            DateTime::default()
        })
}
