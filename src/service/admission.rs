//! Join and leave under the waitlist size ceiling.

use std::sync::Arc;

use chrono::Utc;

use super::retry::{RetryPolicy, retry_on_conflict};
use crate::domain::{EventBus, EventId, JoinOutcome, LeaveOutcome, UserId, WaitlistEvent};
use crate::error::GatewayError;
use crate::persistence::WaitlistStore;

/// Admits entrants to, and removes them from, an event's waitlist.
///
/// The size check and the insert happen on one snapshot and are committed by
/// a single versioned write, so concurrent joins can never push the waitlist
/// past `max_waitlist_size`.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    store: Arc<dyn WaitlistStore>,
    event_bus: EventBus,
    retry: RetryPolicy,
}

impl AdmissionController {
    /// Creates a new `AdmissionController`.
    #[must_use]
    pub fn new(store: Arc<dyn WaitlistStore>, event_bus: EventBus, retry: RetryPolicy) -> Self {
        Self {
            store,
            event_bus,
            retry,
        }
    }

    /// Adds `user_id` to the waitlist as `WAITING`.
    ///
    /// A user already present in any status gets
    /// [`JoinOutcome::AlreadyJoined`] and nothing is written.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::CapacityExceeded`] if the waitlist is full.
    /// - [`GatewayError::RetriesExhausted`] under sustained contention.
    pub async fn join(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<JoinOutcome, GatewayError> {
        let (outcome, event) = retry_on_conflict(&self.retry, event_id, || {
            self.try_join(event_id, user_id)
        })
        .await?;

        match event {
            Some(event) => {
                let _ = self.event_bus.publish(event);
                tracing::info!(%event_id, %user_id, "entrant joined");
            }
            None => tracing::debug!(%event_id, %user_id, "entrant already joined"),
        }
        Ok(outcome)
    }

    async fn try_join(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<(JoinOutcome, Option<WaitlistEvent>), GatewayError> {
        let (mut waitlist, version) = self.store.read(event_id).await?;
        let now = Utc::now();
        let outcome = waitlist.admit(user_id, now)?;
        if outcome == JoinOutcome::AlreadyJoined {
            return Ok((outcome, None));
        }
        self.store.write(&waitlist, version).await?;
        Ok((
            outcome,
            Some(WaitlistEvent::EntrantJoined {
                event_id,
                user_id,
                entry_count: waitlist.len(),
                timestamp: now,
            }),
        ))
    }

    /// Removes `user_id` if still `WAITING`.
    ///
    /// Leaving never fails on membership: an absent user or one past
    /// `WAITING` is reported through [`LeaveOutcome`] and nothing is written.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::RetriesExhausted`] under sustained contention.
    pub async fn leave(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<LeaveOutcome, GatewayError> {
        let (outcome, event) = retry_on_conflict(&self.retry, event_id, || {
            self.try_leave(event_id, user_id)
        })
        .await?;

        match event {
            Some(event) => {
                let _ = self.event_bus.publish(event);
                tracing::info!(%event_id, %user_id, "entrant left");
            }
            None => tracing::debug!(%event_id, %user_id, ?outcome, "leave was a no-op"),
        }
        Ok(outcome)
    }

    async fn try_leave(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<(LeaveOutcome, Option<WaitlistEvent>), GatewayError> {
        let (mut waitlist, version) = self.store.read(event_id).await?;
        let now = Utc::now();
        let outcome = waitlist.withdraw(user_id, now);
        if !outcome.is_removed() {
            return Ok((outcome, None));
        }
        self.store.write(&waitlist, version).await?;
        Ok((
            outcome,
            Some(WaitlistEvent::EntrantLeft {
                event_id,
                user_id,
                entry_count: waitlist.len(),
                timestamp: now,
            }),
        ))
    }
}
