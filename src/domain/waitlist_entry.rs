//! A single entrant on a waitlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EntrantStatus, UserId};

/// One `(user_id, status)` pair plus bookkeeping timestamps.
///
/// Entries are created in [`EntrantStatus::Waiting`] and only move along the
/// edges of the status state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WaitlistEntry {
    /// Entrant identity, unique within the waitlist.
    pub user_id: UserId,
    /// Current status.
    pub status: EntrantStatus,
    /// When the entrant joined.
    pub joined_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Creates a fresh `WAITING` entry stamped with `now`.
    #[must_use]
    pub fn waiting(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            status: EntrantStatus::Waiting,
            joined_at: now,
            updated_at: now,
        }
    }
}
