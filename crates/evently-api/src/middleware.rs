use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use evently_types::models::Claims;
use evently_types::routes::{GuardDecision, guard};

use crate::AppState;
use crate::auth::{SESSION_COOKIE, decode_token};
use crate::error::ApiError;

/// Bearer token from the Authorization header, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

fn session_claims(state: &AppState, headers: &HeaderMap) -> Option<Claims> {
    session_token(headers).and_then(|token| decode_token(&state.jwt_secret, &token))
}

/// Validate the session and expose its [`Claims`] to handlers as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = session_claims(&state, req.headers()).ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Page-level redirects driven by the route classification lists.
/// API paths always pass; `require_auth` covers them.
pub async fn route_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let logged_in = session_claims(&state, req.headers()).is_some();
    match guard(req.uri().path(), logged_in) {
        GuardDecision::Allow => next.run(req).await,
        GuardDecision::Redirect(to) => Redirect::to(to).into_response(),
    }
}
