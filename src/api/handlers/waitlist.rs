//! Waitlist lifecycle handlers: create, get summary, delete.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::CreateWaitlistRequest;
use crate::app_state::AppState;
use crate::domain::{EventId, WaitlistSummary};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events/{event_id}/waitlist` — Open a waitlist for an event.
///
/// # Errors
///
/// Returns [`GatewayError`] if the event is unknown, already has a
/// waitlist, or the size is zero.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/waitlist",
    tag = "Waitlists",
    summary = "Create a waitlist",
    description = "Creates an empty, open waitlist for an existing event. `max_waitlist_size` falls back to the server default.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
    ),
    request_body = CreateWaitlistRequest,
    responses(
        (status = 201, description = "Waitlist created", body = WaitlistSummary),
        (status = 400, description = "Invalid identifier or size", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Waitlist already exists", body = ErrorResponse),
    )
)]
pub async fn create_waitlist(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::parse(event_id)?;
    // an empty body means "use the defaults"
    let req = if body.is_empty() {
        CreateWaitlistRequest::default()
    } else {
        serde_json::from_slice::<CreateWaitlistRequest>(&body)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?
    };
    let summary = state
        .waitlist_service
        .create_waitlist(event_id, req.max_waitlist_size)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// `GET /events/{event_id}/waitlist` — Waitlist summary.
///
/// # Errors
///
/// Returns [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/waitlist",
    tag = "Waitlists",
    summary = "Get waitlist summary",
    description = "Returns the draw phase and per-status entry counts, all taken from one snapshot.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
    ),
    responses(
        (status = 200, description = "Waitlist summary", body = WaitlistSummary),
        (status = 404, description = "Waitlist not found", body = ErrorResponse),
    )
)]
pub async fn get_waitlist(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::parse(event_id)?;
    let summary = state.waitlist_service.summary(event_id).await?;
    Ok(Json(summary))
}

/// `DELETE /events/{event_id}/waitlist` — Remove a waitlist.
///
/// # Errors
///
/// Returns [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}/waitlist",
    tag = "Waitlists",
    summary = "Delete a waitlist",
    description = "Removes the waitlist and all of its entries.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
    ),
    responses(
        (status = 204, description = "Waitlist deleted"),
        (status = 404, description = "Waitlist not found", body = ErrorResponse),
    )
)]
pub async fn delete_waitlist(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::parse(event_id)?;
    state.waitlist_service.remove_waitlist(event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Waitlist routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/events/{event_id}/waitlist",
        post(create_waitlist)
            .get(get_waitlist)
            .delete(delete_waitlist),
    )
}
