//! Per-event waitlist aggregate.
//!
//! [`Waitlist`] owns the entries of one event, its size ceiling and its draw
//! phase. All mutations are pure methods on the aggregate; the services load a
//! snapshot, call one of these methods, and write the result back under a
//! version check. Nothing here touches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EntrantStatus, EventId, UserId, WaitlistEntry};
use crate::error::GatewayError;

/// Size ceiling used when a waitlist is created without an explicit limit.
pub const DEFAULT_MAX_WAITLIST_SIZE: u32 = 1_000_000;

/// Whether the lottery has run for this waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawPhase {
    /// No draw has happened yet.
    Open,
    /// At least one draw has selected entrants. Never reverts.
    Drawn,
}

impl DrawPhase {
    /// Returns the phase as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Drawn => "drawn",
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    /// A new `WAITING` entry was inserted.
    Joined,
    /// The user was already on the waitlist; nothing changed.
    AlreadyJoined,
}

/// Result of a leave. Leave never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LeaveOutcome {
    /// The `WAITING` entry was removed.
    Removed,
    /// The user was not on the waitlist.
    NotPresent,
    /// The user is past `WAITING` and must decline instead.
    NotWaiting {
        /// The entry's current status.
        status: EntrantStatus,
    },
}

impl LeaveOutcome {
    /// Returns `true` if the waitlist was modified.
    #[must_use]
    pub const fn is_removed(self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// Capacity-bounded waitlist for a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waitlist {
    /// Owning event.
    pub event_id: EventId,
    /// Maximum number of entries.
    pub max_waitlist_size: u32,
    /// Draw phase.
    pub phase: DrawPhase,
    entries: Vec<WaitlistEntry>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl Waitlist {
    /// Creates an empty, open waitlist.
    #[must_use]
    pub fn new(event_id: EventId, max_waitlist_size: u32, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            max_waitlist_size,
            phase: DrawPhase::Open,
            entries: Vec::new(),
            created_at: now,
            last_modified_at: now,
        }
    }

    /// Rebuilds a waitlist from stored parts, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the stored entries hold
    /// a duplicate user or exceed `max_waitlist_size`.
    pub fn restore(
        event_id: EventId,
        max_waitlist_size: u32,
        phase: DrawPhase,
        entries: Vec<WaitlistEntry>,
        created_at: DateTime<Utc>,
        last_modified_at: DateTime<Utc>,
    ) -> Result<Self, GatewayError> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        if let Some(dup) = entries.iter().find(|e| !seen.insert(e.user_id)) {
            return Err(GatewayError::PersistenceError(format!(
                "waitlist {event_id} stores user {} twice",
                dup.user_id
            )));
        }
        if entries.len() > max_waitlist_size as usize {
            return Err(GatewayError::PersistenceError(format!(
                "waitlist {event_id} stores {} entries over a limit of {max_waitlist_size}",
                entries.len()
            )));
        }
        Ok(Self {
            event_id,
            max_waitlist_size,
            phase,
            entries,
            created_at,
            last_modified_at,
        })
    }

    /// Entries in join order.
    #[must_use]
    pub fn entries(&self) -> &[WaitlistEntry] {
        &self.entries
    }

    /// Number of entries, regardless of status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if another join would exceed `max_waitlist_size`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_waitlist_size as usize
    }

    /// Looks up the entry for `user_id`.
    #[must_use]
    pub fn entry(&self, user_id: UserId) -> Option<&WaitlistEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    /// Returns `true` if `user_id` has an entry in any status.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.entry(user_id).is_some()
    }

    /// Number of entries currently in `status`.
    #[must_use]
    pub fn count(&self, status: EntrantStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Number of entries holding a capacity slot (`SELECTED` + `ACCEPTED`).
    #[must_use]
    pub fn occupied_slots(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status.occupies_slot())
            .count()
    }

    /// Users still `WAITING`, in join order.
    #[must_use]
    pub fn waiting_users(&self) -> Vec<UserId> {
        self.entries
            .iter()
            .filter(|e| e.status == EntrantStatus::Waiting)
            .map(|e| e.user_id)
            .collect()
    }

    /// Inserts `user_id` as `WAITING` if there is room.
    ///
    /// A user already present in any status yields
    /// [`JoinOutcome::AlreadyJoined`] and leaves the aggregate untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CapacityExceeded`] if the waitlist is full.
    pub fn admit(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, GatewayError> {
        if self.contains(user_id) {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        if self.is_full() {
            return Err(GatewayError::CapacityExceeded {
                event_id: self.event_id,
                max_waitlist_size: self.max_waitlist_size,
            });
        }
        self.entries.push(WaitlistEntry::waiting(user_id, now));
        self.last_modified_at = now;
        Ok(JoinOutcome::Joined)
    }

    /// Removes `user_id` if it is still `WAITING`.
    pub fn withdraw(&mut self, user_id: UserId, now: DateTime<Utc>) -> LeaveOutcome {
        let Some(pos) = self.entries.iter().position(|e| e.user_id == user_id) else {
            return LeaveOutcome::NotPresent;
        };
        let status = self
            .entries
            .get(pos)
            .map_or(EntrantStatus::Waiting, |e| e.status);
        if status != EntrantStatus::Waiting {
            return LeaveOutcome::NotWaiting { status };
        }
        self.entries.remove(pos);
        self.last_modified_at = now;
        LeaveOutcome::Removed
    }

    /// Moves the entry for `user_id` to `next`, returning its previous status.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EntrantNotFound`] if the user has no entry.
    /// - [`GatewayError::InvalidTransition`] if `current -> next` is not an
    ///   edge of the status state machine.
    pub fn transition(
        &mut self,
        user_id: UserId,
        next: EntrantStatus,
        now: DateTime<Utc>,
    ) -> Result<EntrantStatus, GatewayError> {
        let event_id = self.event_id;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.user_id == user_id)
            .ok_or(GatewayError::EntrantNotFound { event_id, user_id })?;
        let previous = entry.status;
        entry.status = previous.transition(next)?;
        entry.updated_at = now;
        self.last_modified_at = now;
        Ok(previous)
    }

    /// Promotes each of `users` from `WAITING` to `SELECTED` and marks the
    /// waitlist as drawn.
    ///
    /// Either every promotion applies or the aggregate is left unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first [`Waitlist::transition`] failure.
    pub fn promote(&mut self, users: &[UserId], now: DateTime<Utc>) -> Result<(), GatewayError> {
        let mut next = self.clone();
        for user_id in users {
            next.transition(*user_id, EntrantStatus::Selected, now)?;
        }
        next.phase = DrawPhase::Drawn;
        next.last_modified_at = now;
        *self = next;
        Ok(())
    }

    /// Builds a count-only view of this waitlist.
    #[must_use]
    pub fn summary(&self) -> WaitlistSummary {
        WaitlistSummary::from(self)
    }
}

/// Count-only view of a waitlist for list and detail endpoints.
///
/// `entry_count` is always derived from the same snapshot as the per-status
/// counts, so it always equals their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WaitlistSummary {
    /// Owning event.
    pub event_id: EventId,
    /// Draw phase.
    pub phase: DrawPhase,
    /// Maximum number of entries.
    pub max_waitlist_size: u32,
    /// Total entries, any status.
    pub entry_count: usize,
    /// Entries in `WAITING`.
    pub waiting: usize,
    /// Entries in `SELECTED`.
    pub selected: usize,
    /// Entries in `ACCEPTED`.
    pub accepted: usize,
    /// Entries in `DECLINED`.
    pub declined: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl From<&Waitlist> for WaitlistSummary {
    fn from(waitlist: &Waitlist) -> Self {
        Self {
            event_id: waitlist.event_id,
            phase: waitlist.phase,
            max_waitlist_size: waitlist.max_waitlist_size,
            entry_count: waitlist.len(),
            waiting: waitlist.count(EntrantStatus::Waiting),
            selected: waitlist.count(EntrantStatus::Selected),
            accepted: waitlist.count(EntrantStatus::Accepted),
            declined: waitlist.count(EntrantStatus::Declined),
            created_at: waitlist.created_at,
            last_modified_at: waitlist.last_modified_at,
        }
    }
}
