//! Event directory handler: register or update an event's capacity.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};

use crate::api::dto::{EventResponse, UpsertEventRequest};
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, GatewayError};

/// `PUT /events/{event_id}` — Create or update an event.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid identifier or storage failure.
#[utoipa::path(
    put,
    path = "/api/v1/events/{event_id}",
    tag = "Events",
    summary = "Register an event",
    description = "Creates the event or replaces its capacity. The capacity is stored as given and validated when a lottery draw reads it.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
    ),
    request_body = UpsertEventRequest,
    responses(
        (status = 200, description = "Event stored", body = EventResponse),
        (status = 400, description = "Invalid event identifier", body = ErrorResponse),
    )
)]
pub async fn upsert_event(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
    Json(req): Json<UpsertEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::parse(event_id)?;
    state
        .waitlist_service
        .upsert_event(event_id, req.capacity)
        .await?;
    Ok(Json(EventResponse {
        event_id,
        capacity: req.capacity,
    }))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events/{event_id}", put(upsert_event))
}
