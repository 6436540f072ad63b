//! Entrant handlers: join, leave, list, inspect, respond, cancel.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    CancelResponse, EntrantListQuery, EntrantListResponse, JoinResponse, LeaveResponse,
    RespondRequest, RespondResponse,
};
use crate::app_state::AppState;
use crate::domain::{EventId, JoinOutcome, UserId, WaitlistEntry};
use crate::error::{ErrorResponse, GatewayError};

fn parse_ids(event_id: u64, user_id: u64) -> Result<(EventId, UserId), GatewayError> {
    Ok((EventId::parse(event_id)?, UserId::parse(user_id)?))
}

/// `GET /events/{event_id}/waitlist/entrants` — List entrants.
///
/// # Errors
///
/// Returns [`GatewayError`] on an unknown status filter or missing waitlist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/waitlist/entrants",
    tag = "Entrants",
    summary = "List entrants",
    description = "Returns entrants in join order, optionally filtered by status, with pagination.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
        EntrantListQuery,
    ),
    responses(
        (status = 200, description = "Paginated entrant list", body = EntrantListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 404, description = "Waitlist not found", body = ErrorResponse),
    )
)]
pub async fn list_entrants(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
    Query(query): Query<EntrantListQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::parse(event_id)?;
    let status = query.status_filter()?;
    let entrants = state.waitlist_service.entrants(event_id, status).await?;
    let (data, pagination) = query.pagination().paginate(entrants);
    Ok(Json(EntrantListResponse {
        event_id,
        data,
        pagination,
    }))
}

/// `PUT /events/{event_id}/waitlist/entrants/{user_id}` — Join.
///
/// # Errors
///
/// Returns [`GatewayError`] if the waitlist is missing or full.
#[utoipa::path(
    put,
    path = "/api/v1/events/{event_id}/waitlist/entrants/{user_id}",
    tag = "Entrants",
    summary = "Join a waitlist",
    description = "Adds the user as a WAITING entrant. Joining twice is a no-op reported as `already_joined`.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
        ("user_id" = u64, Path, description = "User identifier"),
    ),
    responses(
        (status = 201, description = "Joined", body = JoinResponse),
        (status = 200, description = "Already on the waitlist", body = JoinResponse),
        (status = 404, description = "Waitlist not found", body = ErrorResponse),
        (status = 409, description = "Waitlist full", body = ErrorResponse),
        (status = 503, description = "Write contention", body = ErrorResponse),
    )
)]
pub async fn join(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(u64, u64)>,
) -> Result<impl IntoResponse, GatewayError> {
    let (event_id, user_id) = parse_ids(event_id, user_id)?;
    let outcome = state.waitlist_service.join(event_id, user_id).await?;
    let status = match outcome {
        JoinOutcome::Joined => StatusCode::CREATED,
        JoinOutcome::AlreadyJoined => StatusCode::OK,
    };
    Ok((
        status,
        Json(JoinResponse {
            event_id,
            user_id,
            outcome,
        }),
    ))
}

/// `DELETE /events/{event_id}/waitlist/entrants/{user_id}` — Leave.
///
/// # Errors
///
/// Returns [`GatewayError`] if the waitlist is missing.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}/waitlist/entrants/{user_id}",
    tag = "Entrants",
    summary = "Leave a waitlist",
    description = "Removes a WAITING entrant. Users past WAITING are left in place and must decline instead.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
        ("user_id" = u64, Path, description = "User identifier"),
    ),
    responses(
        (status = 200, description = "Leave result", body = LeaveResponse),
        (status = 404, description = "Waitlist not found", body = ErrorResponse),
    )
)]
pub async fn leave(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(u64, u64)>,
) -> Result<impl IntoResponse, GatewayError> {
    let (event_id, user_id) = parse_ids(event_id, user_id)?;
    let result = state.waitlist_service.leave(event_id, user_id).await?;
    Ok(Json(LeaveResponse {
        event_id,
        user_id,
        result,
    }))
}

/// `GET /events/{event_id}/waitlist/entrants/{user_id}` — One entrant.
///
/// # Errors
///
/// Returns [`GatewayError`] if the waitlist or the entry is missing.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/waitlist/entrants/{user_id}",
    tag = "Entrants",
    summary = "Get an entrant",
    description = "Returns the user's entry and current status.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
        ("user_id" = u64, Path, description = "User identifier"),
    ),
    responses(
        (status = 200, description = "Entry", body = WaitlistEntry),
        (status = 404, description = "Waitlist or entrant not found", body = ErrorResponse),
    )
)]
pub async fn get_entrant(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(u64, u64)>,
) -> Result<impl IntoResponse, GatewayError> {
    let (event_id, user_id) = parse_ids(event_id, user_id)?;
    let entry = state.waitlist_service.entrant(event_id, user_id).await?;
    Ok(Json(entry))
}

/// `POST /events/{event_id}/waitlist/entrants/{user_id}/response` — Accept or decline.
///
/// # Errors
///
/// Returns [`GatewayError`] if the entry is missing or not `SELECTED`.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/waitlist/entrants/{user_id}/response",
    tag = "Entrants",
    summary = "Respond to a selection",
    description = "Moves a SELECTED entrant to ACCEPTED or DECLINED. A decline runs a refill draw unless `redraw` is false; the refill result never undoes the decline.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
        ("user_id" = u64, Path, description = "User identifier"),
    ),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Response recorded", body = RespondResponse),
        (status = 404, description = "Waitlist or entrant not found", body = ErrorResponse),
        (status = 409, description = "Entrant is not SELECTED", body = ErrorResponse),
    )
)]
pub async fn respond(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(u64, u64)>,
    Json(req): Json<RespondRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let (event_id, user_id) = parse_ids(event_id, user_id)?;
    let service = &state.waitlist_service;
    let (status, refill) = if req.redraw {
        let outcome = service
            .respond_and_refill(event_id, user_id, req.decision)
            .await?;
        (outcome.status, outcome.refill)
    } else {
        let status = service.respond(event_id, user_id, req.decision).await?;
        (status, None)
    };
    Ok(Json(RespondResponse {
        event_id,
        user_id,
        status,
        refill,
    }))
}

/// `POST /events/{event_id}/waitlist/entrants/{user_id}/cancel` — Organizer cancel.
///
/// # Errors
///
/// Returns [`GatewayError`] if the entry is missing or already terminal.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/waitlist/entrants/{user_id}/cancel",
    tag = "Entrants",
    summary = "Cancel an entrant",
    description = "Organizer action. A WAITING entrant is removed; a SELECTED entrant becomes DECLINED.",
    params(
        ("event_id" = u64, Path, description = "Event identifier"),
        ("user_id" = u64, Path, description = "User identifier"),
    ),
    responses(
        (status = 200, description = "Entrant cancelled", body = CancelResponse),
        (status = 404, description = "Waitlist or entrant not found", body = ErrorResponse),
        (status = 409, description = "Entrant already in a terminal status", body = ErrorResponse),
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(u64, u64)>,
) -> Result<impl IntoResponse, GatewayError> {
    let (event_id, user_id) = parse_ids(event_id, user_id)?;
    let outcome = state
        .waitlist_service
        .cancel_entrant(event_id, user_id)
        .await?;
    Ok(Json(CancelResponse {
        event_id,
        user_id,
        outcome,
    }))
}

/// Entrant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/waitlist/entrants", get(list_entrants))
        .route(
            "/events/{event_id}/waitlist/entrants/{user_id}",
            put(join).delete(leave).get(get_entrant),
        )
        .route(
            "/events/{event_id}/waitlist/entrants/{user_id}/response",
            post(respond),
        )
        .route(
            "/events/{event_id}/waitlist/entrants/{user_id}/cancel",
            post(cancel),
        )
}
