//! Lottery draw: uniform selection of `WAITING` entrants into free slots.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use utoipa::ToSchema;

use super::retry::{RetryPolicy, retry_on_conflict};
use crate::domain::{EntrantStatus, EventBus, EventId, UserId, WaitlistEvent};
use crate::error::GatewayError;
use crate::persistence::{EventDirectory, WaitlistStore};

/// Result of a committed draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DrawOutcome {
    /// Event that was drawn.
    pub event_id: EventId,
    /// Users promoted to `SELECTED` by this draw, in draw order.
    pub selected: Vec<UserId>,
    /// Event capacity at draw time.
    pub capacity: u64,
    /// `SELECTED` + `ACCEPTED` entries after the draw.
    pub occupied_slots: usize,
    /// Entries still `WAITING` after the draw.
    pub remaining_waiting: usize,
}

/// Picks `count` users uniformly at random, without replacement.
///
/// Fisher–Yates shuffles the whole candidate list and keeps the prefix, so
/// every subset of size `count` is equally likely. Asking for more than
/// there are candidates returns all of them.
pub fn select_uniform<R: Rng + ?Sized>(
    mut candidates: Vec<UserId>,
    count: usize,
    rng: &mut R,
) -> Vec<UserId> {
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates
}

/// Fills free capacity slots from the `WAITING` pool.
///
/// A draw only ever promotes `WAITING` entries. Existing `SELECTED` and
/// `ACCEPTED` entries are never revoked or re-randomized, so repeating a
/// draw after a decline fills exactly the freed slots.
#[derive(Debug, Clone)]
pub struct LotteryEngine {
    store: Arc<dyn WaitlistStore>,
    events: Arc<dyn EventDirectory>,
    event_bus: EventBus,
    retry: RetryPolicy,
}

impl LotteryEngine {
    /// Creates a new `LotteryEngine`.
    #[must_use]
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        events: Arc<dyn EventDirectory>,
        event_bus: EventBus,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            events,
            event_bus,
            retry,
        }
    }

    /// Reads the event's capacity and rejects non-positive values.
    async fn capacity(&self, event_id: EventId) -> Result<u64, GatewayError> {
        let raw = self.events.capacity(event_id).await?;
        match u64::try_from(raw) {
            Ok(capacity) if capacity > 0 => Ok(capacity),
            _ => Err(GatewayError::MalformedEvent {
                event_id,
                reason: format!("capacity must be positive, got {raw}"),
            }),
        }
    }

    /// Selects up to `capacity - occupied` `WAITING` entrants uniformly at
    /// random and marks them `SELECTED`.
    ///
    /// Capacity is read once. A version conflict re-runs the selection on a
    /// fresh snapshot.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EventNotFound`] if the event does not exist.
    /// - [`GatewayError::MalformedEvent`] if its capacity is not positive.
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::AlreadyFull`] if every slot is taken.
    /// - [`GatewayError::NoWaitingEntrants`] if nobody is `WAITING`.
    /// - [`GatewayError::RetriesExhausted`] under sustained contention.
    pub async fn draw(&self, event_id: EventId) -> Result<DrawOutcome, GatewayError> {
        let capacity = self.capacity(event_id).await?;
        let (outcome, events) = retry_on_conflict(&self.retry, event_id, || {
            self.try_draw(event_id, capacity)
        })
        .await?;

        let _ = self.event_bus.publish_all(events);
        tracing::info!(
            %event_id,
            selected = outcome.selected.len(),
            remaining_waiting = outcome.remaining_waiting,
            "lottery drawn"
        );
        Ok(outcome)
    }

    async fn try_draw(
        &self,
        event_id: EventId,
        capacity: u64,
    ) -> Result<(DrawOutcome, Vec<WaitlistEvent>), GatewayError> {
        let (mut waitlist, version) = self.store.read(event_id).await?;

        let occupied = waitlist.occupied_slots();
        let occupied_u64 = u64::try_from(occupied).unwrap_or(u64::MAX);
        if occupied_u64 >= capacity {
            return Err(GatewayError::AlreadyFull {
                event_id,
                capacity,
                occupied,
            });
        }
        let slots_available = usize::try_from(capacity - occupied_u64).unwrap_or(usize::MAX);

        let waiting = waitlist.waiting_users();
        if waiting.is_empty() {
            return Err(GatewayError::NoWaitingEntrants(event_id));
        }
        let number_to_draw = slots_available.min(waiting.len());
        let selected = {
            let mut rng = rand::thread_rng();
            select_uniform(waiting, number_to_draw, &mut rng)
        };

        let now = Utc::now();
        waitlist.promote(&selected, now)?;
        self.store.write(&waitlist, version).await?;

        let outcome = DrawOutcome {
            event_id,
            selected,
            capacity,
            occupied_slots: waitlist.occupied_slots(),
            remaining_waiting: waitlist.count(EntrantStatus::Waiting),
        };
        let mut events: Vec<WaitlistEvent> = outcome
            .selected
            .iter()
            .map(|user_id| WaitlistEvent::EntrantSelected {
                event_id,
                user_id: *user_id,
                timestamp: now,
            })
            .collect();
        events.push(WaitlistEvent::LotteryDrawn {
            event_id,
            selected_count: outcome.selected.len(),
            remaining_waiting: outcome.remaining_waiting,
            timestamp: now,
        });
        Ok((outcome, events))
    }
}
