//! Entrant responses and organizer overrides.
//!
//! ```text
//! WAITING  --(draw selects)-->     SELECTED
//! SELECTED --(entrant accept)-->   ACCEPTED   [terminal]
//! SELECTED --(entrant decline)-->  DECLINED   [terminal, frees a slot]
//! WAITING  --(leave)-->            [removed]
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::lottery::{DrawOutcome, LotteryEngine};
use super::retry::{RetryPolicy, retry_on_conflict};
use crate::domain::{
    DeclineReason, Decision, EntrantStatus, EventBus, EventId, LeaveOutcome, UserId,
    WaitlistEvent,
};
use crate::error::GatewayError;
use crate::persistence::WaitlistStore;

/// What an organizer cancellation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// A `WAITING` entry was removed.
    Removed,
    /// A `SELECTED` entry became `DECLINED`, freeing its slot.
    Declined,
}

/// Result of the draw that follows a decline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RefillOutcome {
    /// The freed slot was drawn.
    Drawn {
        /// Users promoted by the refill.
        selected: Vec<UserId>,
    },
    /// Nobody was left `WAITING`.
    NoWaitingEntrants,
    /// No slot was free by the time the draw ran.
    AlreadyFull,
    /// The draw failed. The decline itself is committed.
    Failed {
        /// Why the draw failed.
        reason: String,
    },
}

impl From<Result<DrawOutcome, GatewayError>> for RefillOutcome {
    fn from(result: Result<DrawOutcome, GatewayError>) -> Self {
        match result {
            Ok(outcome) => Self::Drawn {
                selected: outcome.selected,
            },
            Err(GatewayError::NoWaitingEntrants(_)) => Self::NoWaitingEntrants,
            Err(GatewayError::AlreadyFull { .. }) => Self::AlreadyFull,
            Err(err) => Self::Failed {
                reason: err.to_string(),
            },
        }
    }
}

/// Result of [`StatusTransitionService::respond_and_refill`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RespondOutcome {
    /// The entrant's new status.
    pub status: EntrantStatus,
    /// Refill draw result. `None` when no draw was attempted.
    pub refill: Option<RefillOutcome>,
}

/// Applies entrant decisions and organizer overrides.
///
/// `respond` never draws by itself. A caller that wants the freed slot
/// refilled uses [`StatusTransitionService::respond_and_refill`].
#[derive(Debug, Clone)]
pub struct StatusTransitionService {
    store: Arc<dyn WaitlistStore>,
    lottery: LotteryEngine,
    event_bus: EventBus,
    retry: RetryPolicy,
}

impl StatusTransitionService {
    /// Creates a new `StatusTransitionService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        lottery: LotteryEngine,
        event_bus: EventBus,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            lottery,
            event_bus,
            retry,
        }
    }

    /// Records a `SELECTED` entrant's decision.
    ///
    /// Not idempotent: a second response finds a terminal status and fails.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::EntrantNotFound`] if the user has no entry.
    /// - [`GatewayError::InvalidTransition`] unless the entry is `SELECTED`.
    /// - [`GatewayError::RetriesExhausted`] under sustained contention.
    pub async fn respond(
        &self,
        event_id: EventId,
        user_id: UserId,
        decision: Decision,
    ) -> Result<EntrantStatus, GatewayError> {
        let target = decision.target_status();
        let event = retry_on_conflict(&self.retry, event_id, || async move {
            let (mut waitlist, version) = self.store.read(event_id).await?;
            let now = Utc::now();
            waitlist.transition(user_id, target, now)?;
            self.store.write(&waitlist, version).await?;
            Ok(match decision {
                Decision::Accept => WaitlistEvent::EntrantAccepted {
                    event_id,
                    user_id,
                    timestamp: now,
                },
                Decision::Decline => WaitlistEvent::EntrantDeclined {
                    event_id,
                    user_id,
                    reason: DeclineReason::EntrantDeclined,
                    timestamp: now,
                },
            })
        })
        .await?;

        let _ = self.event_bus.publish(event);
        tracing::info!(%event_id, %user_id, status = %target, "entrant responded");
        Ok(target)
    }

    /// Records a decision and, after a decline, draws again to fill the
    /// freed slot.
    ///
    /// The response and the refill are separate writes. A refill that finds
    /// nothing to do, or fails, is reported in [`RespondOutcome::refill`]
    /// and does not undo the response.
    ///
    /// # Errors
    ///
    /// Same as [`StatusTransitionService::respond`].
    pub async fn respond_and_refill(
        &self,
        event_id: EventId,
        user_id: UserId,
        decision: Decision,
    ) -> Result<RespondOutcome, GatewayError> {
        let status = self.respond(event_id, user_id, decision).await?;
        if decision == Decision::Accept {
            return Ok(RespondOutcome {
                status,
                refill: None,
            });
        }

        let refill = RefillOutcome::from(self.lottery.draw(event_id).await);
        if let RefillOutcome::Failed { reason } = &refill {
            tracing::warn!(%event_id, %user_id, reason = %reason, "refill draw failed after decline");
        }
        Ok(RespondOutcome {
            status,
            refill: Some(refill),
        })
    }

    /// Cancels an entrant on the organizer's behalf.
    ///
    /// A `WAITING` entry is removed as if the entrant had left. A `SELECTED`
    /// entry becomes `DECLINED`. Terminal statuses cannot be cancelled.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::EntrantNotFound`] if the user has no entry.
    /// - [`GatewayError::InvalidTransition`] for `ACCEPTED` or `DECLINED`.
    /// - [`GatewayError::RetriesExhausted`] under sustained contention.
    pub async fn cancel_entrant(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<CancelOutcome, GatewayError> {
        let (outcome, event) = retry_on_conflict(&self.retry, event_id, || async move {
            let (mut waitlist, version) = self.store.read(event_id).await?;
            let now = Utc::now();
            let status = waitlist
                .entry(user_id)
                .map(|e| e.status)
                .ok_or(GatewayError::EntrantNotFound { event_id, user_id })?;

            let (outcome, event) = match status {
                EntrantStatus::Waiting => {
                    if waitlist.withdraw(user_id, now) != LeaveOutcome::Removed {
                        return Err(GatewayError::Internal(format!(
                            "waiting entrant {user_id} could not be removed"
                        )));
                    }
                    (
                        CancelOutcome::Removed,
                        WaitlistEvent::EntrantLeft {
                            event_id,
                            user_id,
                            entry_count: waitlist.len(),
                            timestamp: now,
                        },
                    )
                }
                _ => {
                    waitlist.transition(user_id, EntrantStatus::Declined, now)?;
                    (
                        CancelOutcome::Declined,
                        WaitlistEvent::EntrantDeclined {
                            event_id,
                            user_id,
                            reason: DeclineReason::OrganizerCancelled,
                            timestamp: now,
                        },
                    )
                }
            };
            self.store.write(&waitlist, version).await?;
            Ok((outcome, event))
        })
        .await?;

        let _ = self.event_bus.publish(event);
        tracing::info!(%event_id, %user_id, ?outcome, "entrant cancelled by organizer");
        Ok(outcome)
    }
}
