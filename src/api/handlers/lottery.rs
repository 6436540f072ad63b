//! Lottery draw handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::DrawOutcome;

/// `POST /events/{event_id}/lottery/draw` — Run a lottery draw.
///
/// # Errors
///
/// Returns [`GatewayError`] if the waitlist is missing, the event is already
/// full, nobody is waiting, or the capacity is malformed.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/lottery/draw",
    tag = "Lottery",
    summary = "Draw entrants",
    description = "Selects uniformly at random among WAITING entrants to fill the free slots (capacity minus SELECTED and ACCEPTED). Can be called again after declines.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
    ),
    responses(
        (status = 200, description = "Draw committed", body = DrawOutcome),
        (status = 404, description = "Event or waitlist not found", body = ErrorResponse),
        (status = 409, description = "Already full or no waiting entrants", body = ErrorResponse),
        (status = 500, description = "Event capacity is malformed", body = ErrorResponse),
        (status = 503, description = "Write contention", body = ErrorResponse),
    )
)]
pub async fn draw(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::parse(event_id)?;
    let outcome = state.waitlist_service.draw(event_id).await?;
    Ok(Json(outcome))
}

/// Lottery routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events/{event_id}/lottery/draw", post(draw))
}
