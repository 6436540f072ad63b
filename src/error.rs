//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Only [`GatewayError::VersionConflict`] is retried inside the core; every
//! other variant is returned to the immediate caller unchanged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EntrantStatus, EventId, UserId};
use crate::persistence::Version;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "waitlist for event 7 is full (max 1)",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`GatewayError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 / 503                    |
/// | 4000–4999 | Waitlist rules  | 409 Conflict                 |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No event with this ID is known to the event source.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The event exists but has no waitlist.
    #[error("waitlist not found for event {0}")]
    WaitlistNotFound(EventId),

    /// The user has no entry on the waitlist.
    #[error("user {user_id} is not on the waitlist for event {event_id}")]
    EntrantNotFound {
        /// Event whose waitlist was searched.
        event_id: EventId,
        /// Missing user.
        user_id: UserId,
    },

    /// A waitlist already exists for the event.
    #[error("waitlist already exists for event {0}")]
    WaitlistExists(EventId),

    /// A concurrent writer changed the waitlist between read and write.
    #[error("version conflict on waitlist {event_id}: expected {expected}, found {found}")]
    VersionConflict {
        /// Event whose waitlist was written.
        event_id: EventId,
        /// Version the writer read.
        expected: Version,
        /// Version found at write time.
        found: Version,
    },

    /// Join attempted on a full waitlist.
    #[error("waitlist for event {event_id} is full (max {max_waitlist_size})")]
    CapacityExceeded {
        /// Event whose waitlist is full.
        event_id: EventId,
        /// Configured ceiling.
        max_waitlist_size: u32,
    },

    /// Draw attempted when every capacity slot is already taken.
    #[error("event {event_id} is full: {occupied} of {capacity} slots taken")]
    AlreadyFull {
        /// Event being drawn.
        event_id: EventId,
        /// Event capacity.
        capacity: u64,
        /// `SELECTED` + `ACCEPTED` entries.
        occupied: usize,
    },

    /// Draw attempted with nobody `WAITING`.
    #[error("no waiting entrants to draw for event {0}")]
    NoWaitingEntrants(EventId),

    /// Status change that is not an edge of the entrant state machine.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EntrantStatus,
        /// Requested status.
        to: EntrantStatus,
    },

    /// Event data is unusable (e.g. non-positive capacity). Never retried.
    #[error("malformed event {event_id}: {reason}")]
    MalformedEvent {
        /// Offending event.
        event_id: EventId,
        /// What is wrong with it.
        reason: String,
    },

    /// Version conflicts persisted past the retry budget.
    #[error("waitlist {event_id} is under contention; gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Event whose waitlist was contended.
        event_id: EventId,
        /// Attempts made, including the first.
        attempts: u32,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::WaitlistNotFound(_) => 2002,
            Self::EntrantNotFound { .. } => 2003,
            Self::WaitlistExists(_) => 2004,
            Self::VersionConflict { .. } => 2005,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::MalformedEvent { .. } => 3002,
            Self::RetriesExhausted { .. } => 3003,
            Self::CapacityExceeded { .. } => 4001,
            Self::AlreadyFull { .. } => 4002,
            Self::NoWaitingEntrants(_) => 4003,
            Self::InvalidTransition { .. } => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::WaitlistNotFound(_) | Self::EntrantNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::WaitlistExists(_)
            | Self::VersionConflict { .. }
            | Self::CapacityExceeded { .. }
            | Self::AlreadyFull { .. }
            | Self::NoWaitingEntrants(_)
            | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::MalformedEvent { .. } | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` if the whole read-compute-write cycle should be re-run.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let details = match &self {
            Self::InvalidTransition { from, .. } => Some(format!("current status: {from}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
