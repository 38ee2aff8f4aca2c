use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use evently_db::models::EventRow;
use evently_types::api::CreateEventRequest;
use evently_types::models::{Claims, Event};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, run_blocking};

const LIST_LIMIT: u32 = 100;

/// GET /api/events: upcoming events first, past events after them.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let rows = run_blocking(&state, move |s| s.db.list_events(now, LIST_LIMIT)).await?;
    let events = rows
        .into_iter()
        .map(EventRow::into_event)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(events))
}

/// Every successful view bumps the `("event", id)` trend counter.
pub async fn get_event(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let id = event_id.to_string();
    let row = run_blocking(&state, move |s| {
        let row = s.db.get_event(&id)?;
        if row.is_some() {
            if let Err(e) = s.docs.bump_trend("event", &id) {
                warn!("Failed to bump trend for event {}: {}", id, e);
            }
        }
        Ok(row)
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(row.into_event()?))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateEventRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    if req.price_cents < 0 {
        return Err(ApiError::bad_request("price must not be negative"));
    }

    let event = Event {
        id: Uuid::new_v4(),
        organizer_id: claims.sub,
        title,
        description: req.description,
        location: req.location,
        starts_at: req.starts_at,
        price_cents: req.price_cents,
        created_at: Utc::now(),
    };

    let stored = event.clone();
    run_blocking(&state, move |s| {
        s.db.insert_event(
            &stored.id.to_string(),
            &stored.organizer_id.to_string(),
            &stored.title,
            &stored.description,
            stored.location.as_deref(),
            stored.starts_at,
            stored.price_cents,
        )
    })
    .await?;

    info!("Event {} created by {}", event.id, claims.sub);
    Ok((StatusCode::CREATED, Json(event)))
}
