use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use evently_types::api::{ForgotPasswordRequest, ResetPasswordRequest};

use crate::AppState;
use crate::actions::{self, ResetOutcome};

const FORGOT_OK: &str = "If an account exists for that email, a reset link has been sent";
const RESET_OK: &str = "Password has been reset";

fn respond(outcome: ResetOutcome, ok_message: &str, failure_status: StatusCode) -> Response {
    if outcome.success {
        (StatusCode::OK, Json(json!({ "message": ok_message }))).into_response()
    } else {
        let error = outcome.error.unwrap_or_else(|| "Unknown error".to_string());
        (failure_status, Json(json!({ "error": error }))).into_response()
    }
}

/// POST /api/forgot-password: 200 `{message}` or 500 `{error}`.
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(req)) => actions::initialize_password_reset(&state, &req.email).await,
        Err(_) => ResetOutcome {
            success: false,
            error: Some("Invalid request body".into()),
        },
    };
    respond(outcome, FORGOT_OK, StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /api/reset-password: 200 `{message}` or 400 `{error}`.
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(req)) => actions::reset_password(&state, &req.token, &req.password).await,
        Err(_) => ResetOutcome {
            success: false,
            error: Some("Invalid request body".into()),
        },
    };
    respond(outcome, RESET_OK, StatusCode::BAD_REQUEST)
}
