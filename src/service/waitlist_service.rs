//! Waitlist service: lifecycle, queries, and the entry point for every
//! waitlist operation.

use std::sync::Arc;

use chrono::Utc;

use super::admission::AdmissionController;
use super::lottery::{DrawOutcome, LotteryEngine};
use super::retry::RetryPolicy;
use super::status_transition::{CancelOutcome, RespondOutcome, StatusTransitionService};
use crate::domain::{
    Decision, EntrantStatus, EventBus, EventId, JoinOutcome, LeaveOutcome, UserId, Waitlist,
    WaitlistEntry, WaitlistEvent, WaitlistSummary,
};
use crate::error::GatewayError;
use crate::persistence::{EventDirectory, WaitlistStore};

/// Orchestration layer for all waitlist operations.
///
/// Stateless coordinator: owns handles to the [`WaitlistStore`] and
/// [`EventDirectory`] ports and to the [`EventBus`]. Mutations are delegated
/// to [`AdmissionController`], [`LotteryEngine`] and
/// [`StatusTransitionService`]; each follows the pattern read snapshot →
/// apply domain rule → versioned write → emit events.
#[derive(Debug, Clone)]
pub struct WaitlistService {
    store: Arc<dyn WaitlistStore>,
    events: Arc<dyn EventDirectory>,
    event_bus: EventBus,
    admission: AdmissionController,
    lottery: LotteryEngine,
    transitions: StatusTransitionService,
    default_max_waitlist_size: u32,
}

impl WaitlistService {
    /// Wires the three waitlist components over shared ports.
    #[must_use]
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        events: Arc<dyn EventDirectory>,
        event_bus: EventBus,
        retry: RetryPolicy,
        default_max_waitlist_size: u32,
    ) -> Self {
        let admission = AdmissionController::new(Arc::clone(&store), event_bus.clone(), retry);
        let lottery = LotteryEngine::new(
            Arc::clone(&store),
            Arc::clone(&events),
            event_bus.clone(),
            retry,
        );
        let transitions =
            StatusTransitionService::new(Arc::clone(&store), lottery.clone(), event_bus.clone(), retry);
        Self {
            store,
            events,
            event_bus,
            admission,
            lottery,
            transitions,
            default_max_waitlist_size,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the admission component.
    #[must_use]
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Returns the lottery component.
    #[must_use]
    pub fn lottery(&self) -> &LotteryEngine {
        &self.lottery
    }

    /// Returns the status transition component.
    #[must_use]
    pub fn transitions(&self) -> &StatusTransitionService {
        &self.transitions
    }

    // -- events ---------------------------------------------------------

    /// Creates an event or updates its capacity.
    ///
    /// The value is stored as given. A non-positive capacity is only
    /// rejected when a draw reads it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    pub async fn upsert_event(&self, event_id: EventId, capacity: i64) -> Result<(), GatewayError> {
        self.events.upsert_event(event_id, capacity).await?;
        tracing::info!(%event_id, capacity, "event capacity set");
        Ok(())
    }

    // -- lifecycle ------------------------------------------------------

    /// Creates an empty, open waitlist for an existing event.
    ///
    /// `max_waitlist_size` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the size is zero.
    /// - [`GatewayError::EventNotFound`] if the event does not exist.
    /// - [`GatewayError::WaitlistExists`] if the event already has one.
    pub async fn create_waitlist(
        &self,
        event_id: EventId,
        max_waitlist_size: Option<u32>,
    ) -> Result<WaitlistSummary, GatewayError> {
        let max_waitlist_size = max_waitlist_size.unwrap_or(self.default_max_waitlist_size);
        if max_waitlist_size == 0 {
            return Err(GatewayError::InvalidRequest(
                "max_waitlist_size must be positive".to_string(),
            ));
        }
        // existence check only; capacity is validated at draw time
        let _ = self.events.capacity(event_id).await?;

        let now = Utc::now();
        let waitlist = Waitlist::new(event_id, max_waitlist_size, now);
        self.store.create(&waitlist).await?;

        let _ = self.event_bus.publish(WaitlistEvent::WaitlistCreated {
            event_id,
            max_waitlist_size,
            timestamp: now,
        });
        tracing::info!(%event_id, max_waitlist_size, "waitlist created");
        Ok(waitlist.summary())
    }

    /// Deletes the waitlist of an event.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WaitlistNotFound`] if there is none.
    pub async fn remove_waitlist(&self, event_id: EventId) -> Result<(), GatewayError> {
        self.store.remove(event_id).await?;
        let _ = self.event_bus.publish(WaitlistEvent::WaitlistRemoved {
            event_id,
            timestamp: Utc::now(),
        });
        tracing::info!(%event_id, "waitlist removed");
        Ok(())
    }

    // -- queries --------------------------------------------------------

    /// Returns a snapshot of the waitlist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WaitlistNotFound`] if there is none.
    pub async fn waitlist(&self, event_id: EventId) -> Result<Waitlist, GatewayError> {
        let (waitlist, _) = self.store.read(event_id).await?;
        Ok(waitlist)
    }

    /// Returns per-status counts from one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WaitlistNotFound`] if there is none.
    pub async fn summary(&self, event_id: EventId) -> Result<WaitlistSummary, GatewayError> {
        Ok(self.waitlist(event_id).await?.summary())
    }

    /// Lists entries in join order, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WaitlistNotFound`] if there is none.
    pub async fn entrants(
        &self,
        event_id: EventId,
        status: Option<EntrantStatus>,
    ) -> Result<Vec<WaitlistEntry>, GatewayError> {
        let waitlist = self.waitlist(event_id).await?;
        Ok(waitlist
            .entries()
            .iter()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect())
    }

    /// Returns the entry of one user.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if there is no waitlist.
    /// - [`GatewayError::EntrantNotFound`] if the user has no entry.
    pub async fn entrant(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<WaitlistEntry, GatewayError> {
        self.waitlist(event_id)
            .await?
            .entry(user_id)
            .cloned()
            .ok_or(GatewayError::EntrantNotFound { event_id, user_id })
    }

    // -- mutations ------------------------------------------------------

    /// See [`AdmissionController::join`].
    ///
    /// # Errors
    ///
    /// See [`AdmissionController::join`].
    pub async fn join(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<JoinOutcome, GatewayError> {
        self.admission.join(event_id, user_id).await
    }

    /// See [`AdmissionController::leave`].
    ///
    /// # Errors
    ///
    /// See [`AdmissionController::leave`].
    pub async fn leave(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<LeaveOutcome, GatewayError> {
        self.admission.leave(event_id, user_id).await
    }

    /// See [`LotteryEngine::draw`].
    ///
    /// # Errors
    ///
    /// See [`LotteryEngine::draw`].
    pub async fn draw(&self, event_id: EventId) -> Result<DrawOutcome, GatewayError> {
        self.lottery.draw(event_id).await
    }

    /// See [`StatusTransitionService::respond`].
    ///
    /// # Errors
    ///
    /// See [`StatusTransitionService::respond`].
    pub async fn respond(
        &self,
        event_id: EventId,
        user_id: UserId,
        decision: Decision,
    ) -> Result<EntrantStatus, GatewayError> {
        self.transitions.respond(event_id, user_id, decision).await
    }

    /// See [`StatusTransitionService::respond_and_refill`].
    ///
    /// # Errors
    ///
    /// See [`StatusTransitionService::respond`].
    pub async fn respond_and_refill(
        &self,
        event_id: EventId,
        user_id: UserId,
        decision: Decision,
    ) -> Result<RespondOutcome, GatewayError> {
        self.transitions
            .respond_and_refill(event_id, user_id, decision)
            .await
    }

    /// See [`StatusTransitionService::cancel_entrant`].
    ///
    /// # Errors
    ///
    /// See [`StatusTransitionService::cancel_entrant`].
    pub async fn cancel_entrant(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<CancelOutcome, GatewayError> {
        self.transitions.cancel_entrant(event_id, user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::persistence::{InMemoryPersistence, Version};

    fn service_over(store: Arc<InMemoryPersistence>, retry: RetryPolicy) -> WaitlistService {
        let waitlists = Arc::clone(&store) as Arc<dyn WaitlistStore>;
        let events: Arc<dyn EventDirectory> = store;
        WaitlistService::new(waitlists, events, EventBus::new(64), retry, 3)
    }

    fn service() -> WaitlistService {
        let store = InMemoryPersistence::new().with_event(EventId::new(1), 2);
        service_over(Arc::new(store), RetryPolicy::immediate(8))
    }

    /// Store whose first `conflicts` writes lose the version race.
    #[derive(Debug)]
    struct ContendedStore {
        inner: InMemoryPersistence,
        conflicts: AtomicU32,
    }

    #[async_trait]
    impl WaitlistStore for ContendedStore {
        async fn create(&self, waitlist: &Waitlist) -> Result<Version, GatewayError> {
            self.inner.create(waitlist).await
        }

        async fn read(&self, event_id: EventId) -> Result<(Waitlist, Version), GatewayError> {
            self.inner.read(event_id).await
        }

        async fn write(
            &self,
            waitlist: &Waitlist,
            expected: Version,
        ) -> Result<Version, GatewayError> {
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(GatewayError::VersionConflict {
                    event_id: waitlist.event_id,
                    expected,
                    found: expected.next(),
                });
            }
            self.inner.write(waitlist, expected).await
        }

        async fn remove(&self, event_id: EventId) -> Result<(), GatewayError> {
            self.inner.remove(event_id).await
        }
    }

    async fn contended(conflicts: u32, retry: RetryPolicy) -> WaitlistService {
        let store = Arc::new(ContendedStore {
            inner: InMemoryPersistence::new(),
            conflicts: AtomicU32::new(0),
        });
        let _ = store
            .create(&Waitlist::new(EventId::new(1), 10, Utc::now()))
            .await;
        store.conflicts.store(conflicts, Ordering::SeqCst);
        let events: Arc<dyn EventDirectory> =
            Arc::new(InMemoryPersistence::new().with_event(EventId::new(1), 1));
        WaitlistService::new(store, events, EventBus::new(64), retry, 10)
    }

    #[tokio::test]
    async fn create_uses_default_size() {
        let svc = service();
        let Ok(summary) = svc.create_waitlist(EventId::new(1), None).await else {
            panic!("create should succeed");
        };
        assert_eq!(summary.max_waitlist_size, 3);
        assert_eq!(summary.entry_count, 0);
    }

    #[tokio::test]
    async fn create_rejects_zero_size_and_duplicates() {
        let svc = service();
        let zero = svc.create_waitlist(EventId::new(1), Some(0)).await;
        assert!(matches!(zero, Err(GatewayError::InvalidRequest(_))));

        let _ = svc.create_waitlist(EventId::new(1), Some(5)).await;
        let dup = svc.create_waitlist(EventId::new(1), Some(5)).await;
        assert!(matches!(dup, Err(GatewayError::WaitlistExists(_))));
    }

    #[tokio::test]
    async fn create_requires_event() {
        let svc = service();
        let result = svc.create_waitlist(EventId::new(42), None).await;
        assert!(matches!(result, Err(GatewayError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn entrants_filter_by_status() {
        let svc = service();
        let _ = svc.create_waitlist(EventId::new(1), Some(10)).await;
        for n in 1..=4 {
            let _ = svc.join(EventId::new(1), UserId::new(n)).await;
        }
        let _ = svc.draw(EventId::new(1)).await;

        let Ok(all) = svc.entrants(EventId::new(1), None).await else {
            panic!("entrants should load");
        };
        assert_eq!(all.len(), 4);
        // join order is preserved
        let ids: Vec<u64> = all.iter().map(|e| e.user_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let Ok(selected) = svc
            .entrants(EventId::new(1), Some(EntrantStatus::Selected))
            .await
        else {
            panic!("entrants should load");
        };
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn entrant_lookup() {
        let svc = service();
        let _ = svc.create_waitlist(EventId::new(1), None).await;
        let _ = svc.join(EventId::new(1), UserId::new(5)).await;

        let Ok(entry) = svc.entrant(EventId::new(1), UserId::new(5)).await else {
            panic!("entrant should exist");
        };
        assert_eq!(entry.status, EntrantStatus::Waiting);

        let missing = svc.entrant(EventId::new(1), UserId::new(6)).await;
        assert!(matches!(missing, Err(GatewayError::EntrantNotFound { .. })));
    }

    #[tokio::test]
    async fn remove_waitlist_then_operations_fail() {
        let svc = service();
        let _ = svc.create_waitlist(EventId::new(1), None).await;
        assert!(svc.remove_waitlist(EventId::new(1)).await.is_ok());

        let join = svc.join(EventId::new(1), UserId::new(1)).await;
        assert!(matches!(join, Err(GatewayError::WaitlistNotFound(_))));
        let again = svc.remove_waitlist(EventId::new(1)).await;
        assert!(matches!(again, Err(GatewayError::WaitlistNotFound(_))));
    }

    #[tokio::test]
    async fn join_survives_version_conflicts() {
        let svc = contended(3, RetryPolicy::immediate(8)).await;
        let result = svc.join(EventId::new(1), UserId::new(1)).await;
        assert_eq!(result.ok(), Some(JoinOutcome::Joined));

        let Ok(summary) = svc.summary(EventId::new(1)).await else {
            panic!("summary should load");
        };
        assert_eq!(summary.entry_count, 1);
    }

    #[tokio::test]
    async fn draw_gives_up_after_retry_budget() {
        let store = Arc::new(ContendedStore {
            inner: InMemoryPersistence::new(),
            conflicts: AtomicU32::new(u32::MAX),
        });
        let mut waitlist = Waitlist::new(EventId::new(1), 10, Utc::now());
        let _ = waitlist.admit(UserId::new(1), Utc::now());
        let _ = store.create(&waitlist).await;
        let events: Arc<dyn EventDirectory> =
            Arc::new(InMemoryPersistence::new().with_event(EventId::new(1), 1));
        let svc = WaitlistService::new(store, events, EventBus::new(8), RetryPolicy::immediate(2), 10);
        let mut rx = svc.event_bus().subscribe();

        let result = svc.draw(EventId::new(1)).await;
        let Err(GatewayError::RetriesExhausted { attempts, .. }) = result else {
            panic!("expected RetriesExhausted, got {result:?}");
        };
        assert_eq!(attempts, 3);
        // nothing committed, nothing published
        assert!(rx.try_recv().is_err());
        let Ok(entry) = svc.entrant(EventId::new(1), UserId::new(1)).await else {
            panic!("entrant should exist");
        };
        assert_eq!(entry.status, EntrantStatus::Waiting);
    }
}
