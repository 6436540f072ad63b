//! Entrant status state machine.
//!
//! ```text
//! WAITING  --(draw selects)-->     SELECTED
//! SELECTED --(entrant accept)-->   ACCEPTED   [terminal]
//! SELECTED --(entrant decline)-->  DECLINED   [terminal]
//! WAITING  --(leave)-->            removed    [terminal]
//! ```
//!
//! Removal is not a status: a WAITING entry that leaves is deleted from the
//! waitlist. Every other edge is encoded in [`EntrantStatus::can_transition_to`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Status of a single waitlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntrantStatus {
    /// Joined, not yet drawn.
    Waiting,
    /// Drawn by the lottery, awaiting the entrant's response.
    Selected,
    /// Confirmed a selection. Permanently occupies a capacity slot.
    Accepted,
    /// Turned down a selection. The slot is free for a redraw.
    Declined,
}

impl EntrantStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Waiting,
        Self::Selected,
        Self::Accepted,
        Self::Declined,
    ];

    /// Returns `true` if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }

    /// Returns `true` if an entry in this status counts against event
    /// capacity (pending or confirmed).
    #[must_use]
    pub const fn occupies_slot(self) -> bool {
        matches!(self, Self::Selected | Self::Accepted)
    }

    /// Returns `true` if `self -> next` is an edge of the state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Selected)
                | (Self::Selected, Self::Accepted)
                | (Self::Selected, Self::Declined)
        )
    }

    /// Validates `self -> next`, returning `next` on success.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidTransition`] for any edge not in the
    /// state machine.
    pub fn transition(self, next: Self) -> Result<Self, GatewayError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(GatewayError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Selected => "selected",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for EntrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntrantStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "selected" | "chosen" => Ok(Self::Selected),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown entrant status: {other}"
            ))),
        }
    }
}

/// An entrant's answer to a lottery selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Confirm participation.
    Accept,
    /// Give up the slot.
    Decline,
}

impl Decision {
    /// Status the entry moves to when this decision is applied.
    #[must_use]
    pub const fn target_status(self) -> EntrantStatus {
        match self {
            Self::Accept => EntrantStatus::Accepted,
            Self::Decline => EntrantStatus::Declined,
        }
    }
}
