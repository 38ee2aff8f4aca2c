use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use evently_db::models::BadgeRow;
use evently_types::api::AwardBadgeRequest;
use evently_types::models::{Claims, Role};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, run_blocking};

pub async fn list_badges(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let rows = run_blocking(&state, move |s| s.docs.list_badges(&user_id.to_string())).await?;
    let badges = rows
        .into_iter()
        .map(BadgeRow::into_badge)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(badges))
}

/// Admin only. Badges are append-only; awarding the same name twice keeps both.
pub async fn award_badge(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<AwardBadgeRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    if claims.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("badge name must not be empty"));
    }

    let badge_id = Uuid::new_v4();
    let row = run_blocking(&state, move |s| {
        let uid = user_id.to_string();
        if s.db.get_user_by_id(&uid)?.is_none() {
            return Ok(None);
        }
        let row = s.docs.award_badge(
            &badge_id.to_string(),
            &uid,
            &name,
            &req.description,
            req.image_url.as_deref(),
        )?;
        Ok(Some(row))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    info!("Badge {} awarded to {} by {}", badge_id, user_id, claims.sub);
    Ok((StatusCode::CREATED, Json(row.into_badge()?)))
}
