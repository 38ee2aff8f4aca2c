use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::debug;
use uuid::Uuid;

use evently_types::api::{AffectedResponse, SendMessageRequest, UpdateMessageRequest};
use evently_types::models::Claims;

use crate::AppState;
use crate::actions;
use crate::error::{ApiError, ApiResult};

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let message =
        actions::send_private_message(&state, claims.sub, req.recipient_id, req.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let messages = actions::list_private_messages(&state, claims.sub).await?;
    Ok(Json(messages))
}

/// PATCH /api/messages/{id}: always 200 with `{ "count" }`. A zero count does
/// not say whether the message is missing or belongs to someone else.
pub async fn update_message(
    State(state): State<AppState>,
    WithRejection(Path(message_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateMessageRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let count = actions::update_private_message(&state, message_id, claims.sub, req.content).await?;
    debug!("update message {} by {}: {} row(s)", message_id, claims.sub, count);
    Ok(Json(AffectedResponse { count }))
}

/// DELETE /api/messages/{id}: same response shape as [`update_message`].
pub async fn delete_message(
    State(state): State<AppState>,
    WithRejection(Path(message_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let count = actions::delete_private_message(&state, message_id, claims.sub).await?;
    debug!("delete message {} by {}: {} row(s)", message_id, claims.sub, count);
    Ok(Json(AffectedResponse { count }))
}
