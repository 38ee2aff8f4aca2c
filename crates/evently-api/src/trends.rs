use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use evently_db::models::TrendRow;
use evently_types::models::Claims;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, run_blocking};

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

pub async fn top_trends(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<TrendQuery>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.min(100);
    let rows = run_blocking(&state, move |s| s.docs.top_trends(query.kind.as_deref(), limit)).await?;
    let trends = rows
        .into_iter()
        .map(TrendRow::into_trend)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(trends))
}

pub async fn bump_trend(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    if kind.trim().is_empty() || name.trim().is_empty() {
        return Err(ApiError::bad_request("type and name are required"));
    }
    let (k, n) = (kind.clone(), name.clone());
    let count = run_blocking(&state, move |s| s.docs.bump_trend(&k, &n)).await?;
    Ok(Json(json!({ "type": kind, "name": name, "count": count })))
}
