use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use uuid::Uuid;

use evently_types::api::UploadResponse;
use evently_types::models::Claims;

use crate::error::{ApiError, ApiResult};
use crate::uploads::MAX_UPLOAD_SIZE;
use crate::{AppState, run_blocking};

#[derive(Debug, Deserialize)]
pub struct AvatarQuery {
    pub filename: String,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user_id = claims.sub.to_string();
    let user = run_blocking(&state, move |s| s.db.get_user_by_id(&user_id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into_user()?))
}

/// POST /api/users/me/avatar?filename=<name> with the raw image as body.
/// Stores the file under the uploads directory and points the profile at it.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(query), _): WithRejection<Query<AvatarQuery>, ApiError>,
    bytes: Bytes,
) -> ApiResult<impl IntoResponse> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("empty upload"));
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let path = state.uploads.save(&query.filename, &bytes).await?;

    let user_id: Uuid = claims.sub;
    let image = path.clone();
    let updated = run_blocking(&state, move |s| s.db.set_user_image(&user_id.to_string(), &image))
        .await?;
    if !updated {
        return Err(ApiError::NotFound);
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { path })))
}
