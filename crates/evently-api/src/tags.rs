use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use evently_types::api::CreateTagRequest;

use crate::AppState;
use crate::actions;

fn failure(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": message })),
    )
        .into_response()
}

/// GET /api/tags: every tag, unpaginated.
pub async fn list_tags(State(state): State<AppState>) -> Response {
    match actions::list_tags(&state).await {
        Ok(tags) => Json(tags).into_response(),
        Err(e) => {
            error!("Failed to fetch tags: {}", e);
            failure("Failed to fetch tags")
        }
    }
}

/// POST /api/tags: 201 with the created tag. Any failure, including a body
/// without `name`, is a 500 with `{ "message" }`.
pub async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<CreateTagRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            error!("Failed to create tag: {}", rejection.body_text());
            return failure("Failed to create tag");
        }
    };

    match actions::create_tag(&state, req.name).await {
        Ok(tag) => (StatusCode::CREATED, Json(tag)).into_response(),
        Err(e) => {
            error!("Failed to create tag: {}", e);
            failure("Failed to create tag")
        }
    }
}
