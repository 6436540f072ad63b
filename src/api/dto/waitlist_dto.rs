//! Event, waitlist, and entrant request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, PaginationParams, default_page, default_per_page};
use crate::domain::{
    Decision, EntrantStatus, EventId, JoinOutcome, LeaveOutcome, UserId, WaitlistEntry,
};
use crate::error::GatewayError;
use crate::service::{CancelOutcome, RefillOutcome};

/// Request body for `PUT /events/{event_id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertEventRequest {
    /// Number of entrants the event can admit. Stored as given.
    pub capacity: i64,
}

/// Response body for `PUT /events/{event_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResponse {
    /// Event identifier.
    pub event_id: EventId,
    /// Stored capacity.
    pub capacity: i64,
}

/// Request body for `POST /events/{event_id}/waitlist`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateWaitlistRequest {
    /// Size ceiling. Defaults to the server's configured value.
    #[serde(default)]
    pub max_waitlist_size: Option<u32>,
}

/// Query parameters for `GET /events/{event_id}/waitlist/entrants`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EntrantListQuery {
    /// Only return entrants in this status (`waiting`, `selected`,
    /// `accepted`, `declined`).
    #[serde(default)]
    pub status: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl EntrantListQuery {
    /// Parses the optional status filter.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an unknown status.
    pub fn status_filter(&self) -> Result<Option<EntrantStatus>, GatewayError> {
        self.status.as_deref().map(str::parse).transpose()
    }

    /// Extracts the pagination part of the query.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Response body for the entrant list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntrantListResponse {
    /// Event whose waitlist was listed.
    pub event_id: EventId,
    /// Entrants on this page, in join order.
    pub data: Vec<WaitlistEntry>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for a join.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinResponse {
    /// Event joined.
    pub event_id: EventId,
    /// Joining user.
    pub user_id: UserId,
    /// Whether a new entry was created.
    pub outcome: JoinOutcome,
}

/// Response body for a leave.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveResponse {
    /// Event left.
    pub event_id: EventId,
    /// Leaving user.
    pub user_id: UserId,
    /// What happened.
    pub result: LeaveOutcome,
}

/// Request body for an entrant response.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// `accept` or `decline`.
    pub decision: Decision,
    /// After a decline, draw again to fill the freed slot. Defaults to `true`.
    #[serde(default = "default_redraw")]
    pub redraw: bool,
}

fn default_redraw() -> bool {
    true
}

/// Response body for an entrant response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RespondResponse {
    /// Event concerned.
    pub event_id: EventId,
    /// Responding user.
    pub user_id: UserId,
    /// The entrant's new status.
    pub status: EntrantStatus,
    /// Refill draw result, present only when a draw was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refill: Option<RefillOutcome>,
}

/// Response body for an organizer cancellation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelResponse {
    /// Event concerned.
    pub event_id: EventId,
    /// Cancelled user.
    pub user_id: UserId,
    /// What happened to the entry.
    pub outcome: CancelOutcome,
}
