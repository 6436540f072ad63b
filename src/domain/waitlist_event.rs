//! Domain events reflecting committed waitlist mutations.
//!
//! Every successful write publishes one or more [`WaitlistEvent`]s through the
//! [`super::EventBus`]. Events are published only after the versioned write
//! succeeded, so subscribers never observe a change that was rolled back by a
//! conflict. Notifiers subscribe to [`WaitlistEvent::EntrantSelected`] and
//! [`WaitlistEvent::EntrantDeclined`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, UserId};

/// Why an entry became `DECLINED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    /// The entrant declined the invitation.
    EntrantDeclined,
    /// The organizer cancelled the entrant.
    OrganizerCancelled,
}

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WaitlistEvent {
    /// A waitlist was created for an event.
    WaitlistCreated {
        /// Owning event.
        event_id: EventId,
        /// Configured size ceiling.
        max_waitlist_size: u32,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A waitlist was removed together with its event.
    WaitlistRemoved {
        /// Owning event.
        event_id: EventId,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An entrant joined as `WAITING`.
    EntrantJoined {
        /// Owning event.
        event_id: EventId,
        /// Entrant.
        user_id: UserId,
        /// Entry count after the join.
        entry_count: usize,
        /// Join timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A `WAITING` entrant was removed.
    EntrantLeft {
        /// Owning event.
        event_id: EventId,
        /// Entrant.
        user_id: UserId,
        /// Entry count after the removal.
        entry_count: usize,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An entrant was promoted to `SELECTED` by a draw.
    EntrantSelected {
        /// Owning event.
        event_id: EventId,
        /// Entrant.
        user_id: UserId,
        /// Selection timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A `SELECTED` entrant accepted.
    EntrantAccepted {
        /// Owning event.
        event_id: EventId,
        /// Entrant.
        user_id: UserId,
        /// Acceptance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A `SELECTED` entrant became `DECLINED`, freeing a slot.
    EntrantDeclined {
        /// Owning event.
        event_id: EventId,
        /// Entrant.
        user_id: UserId,
        /// Who caused the decline.
        reason: DeclineReason,
        /// Decline timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A draw committed.
    LotteryDrawn {
        /// Owning event.
        event_id: EventId,
        /// Number of entrants promoted by this draw.
        selected_count: usize,
        /// Entrants still `WAITING` after the draw.
        remaining_waiting: usize,
        /// Draw timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl WaitlistEvent {
    /// Returns the event ID associated with this event.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::WaitlistCreated { event_id, .. }
            | Self::WaitlistRemoved { event_id, .. }
            | Self::EntrantJoined { event_id, .. }
            | Self::EntrantLeft { event_id, .. }
            | Self::EntrantSelected { event_id, .. }
            | Self::EntrantAccepted { event_id, .. }
            | Self::EntrantDeclined { event_id, .. }
            | Self::LotteryDrawn { event_id, .. } => *event_id,
        }
    }

    /// Returns the entrant this event concerns, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::EntrantJoined { user_id, .. }
            | Self::EntrantLeft { user_id, .. }
            | Self::EntrantSelected { user_id, .. }
            | Self::EntrantAccepted { user_id, .. }
            | Self::EntrantDeclined { user_id, .. } => Some(*user_id),
            Self::WaitlistCreated { .. }
            | Self::WaitlistRemoved { .. }
            | Self::LotteryDrawn { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::WaitlistCreated { .. } => "waitlist_created",
            Self::WaitlistRemoved { .. } => "waitlist_removed",
            Self::EntrantJoined { .. } => "entrant_joined",
            Self::EntrantLeft { .. } => "entrant_left",
            Self::EntrantSelected { .. } => "entrant_selected",
            Self::EntrantAccepted { .. } => "entrant_accepted",
            Self::EntrantDeclined { .. } => "entrant_declined",
            Self::LotteryDrawn { .. } => "lottery_drawn",
        }
    }

    /// Returns `true` for the events a downstream notifier acts on.
    #[must_use]
    pub const fn is_notifiable(&self) -> bool {
        matches!(
            self,
            Self::EntrantSelected { .. } | Self::EntrantDeclined { .. }
        )
    }
}
