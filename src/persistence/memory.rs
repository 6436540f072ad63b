//! In-memory persistence with per-event fine-grained locking.
//!
//! [`InMemoryPersistence`] keeps every waitlist in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::RwLock`]. Reads of the
//! same waitlist run concurrently, writes to different waitlists run
//! concurrently, and the version check of a write happens under the entry's
//! write lock.
//!
//! Removing a waitlist leaves a tombstone holding its last version, so a
//! waitlist recreated for the same event continues the version sequence
//! instead of starting over.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventDirectory, Version, WaitlistStore};
use crate::domain::{EventId, Waitlist};
use crate::error::GatewayError;

#[derive(Debug)]
struct StoredWaitlist {
    waitlist: Waitlist,
    version: Version,
    detached: bool,
}

/// Process-local store for waitlists and event capacities.
///
/// # Concurrency
///
/// - Multiple tasks may read the same waitlist concurrently.
/// - Writes to different waitlists are concurrent.
/// - Writes to the same waitlist are serialized, and each one is a
///   compare-and-swap on the stored [`Version`].
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    waitlists: RwLock<HashMap<EventId, Arc<RwLock<StoredWaitlist>>>>,
    // last version of each removed waitlist; locked after `waitlists`
    retired: RwLock<HashMap<EventId, Version>>,
    events: RwLock<HashMap<EventId, i64>>,
}

impl InMemoryPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an event with the given capacity. Intended for tests and demos.
    #[must_use]
    pub fn with_event(mut self, event_id: EventId, capacity: i64) -> Self {
        self.events.get_mut().insert(event_id, capacity);
        self
    }

    /// Returns the number of stored waitlists.
    pub async fn len(&self) -> usize {
        self.waitlists.read().await.len()
    }

    /// Returns `true` if no waitlist is stored.
    pub async fn is_empty(&self) -> bool {
        self.waitlists.read().await.is_empty()
    }

    async fn slot(&self, event_id: EventId) -> Result<Arc<RwLock<StoredWaitlist>>, GatewayError> {
        let map = self.waitlists.read().await;
        map.get(&event_id)
            .map(Arc::clone)
            .ok_or(GatewayError::WaitlistNotFound(event_id))
    }
}

#[async_trait]
impl WaitlistStore for InMemoryPersistence {
    async fn create(&self, waitlist: &Waitlist) -> Result<Version, GatewayError> {
        let event_id = waitlist.event_id;
        let mut map = self.waitlists.write().await;
        if map.contains_key(&event_id) {
            return Err(GatewayError::WaitlistExists(event_id));
        }
        let version = self
            .retired
            .read()
            .await
            .get(&event_id)
            .map_or(Version::INITIAL, |last| last.next());
        map.insert(
            event_id,
            Arc::new(RwLock::new(StoredWaitlist {
                waitlist: waitlist.clone(),
                version,
                detached: false,
            })),
        );
        Ok(version)
    }

    async fn read(&self, event_id: EventId) -> Result<(Waitlist, Version), GatewayError> {
        let slot = self.slot(event_id).await?;
        let stored = slot.read().await;
        Ok((stored.waitlist.clone(), stored.version))
    }

    async fn write(
        &self,
        waitlist: &Waitlist,
        expected: Version,
    ) -> Result<Version, GatewayError> {
        let event_id = waitlist.event_id;
        let slot = self.slot(event_id).await?;
        let mut stored = slot.write().await;
        if stored.detached {
            return Err(GatewayError::WaitlistNotFound(event_id));
        }
        if stored.version != expected {
            return Err(GatewayError::VersionConflict {
                event_id,
                expected,
                found: stored.version,
            });
        }
        stored.waitlist = waitlist.clone();
        stored.version = expected.next();
        Ok(stored.version)
    }

    async fn remove(&self, event_id: EventId) -> Result<(), GatewayError> {
        let mut map = self.waitlists.write().await;
        let slot = map
            .remove(&event_id)
            .ok_or(GatewayError::WaitlistNotFound(event_id))?;
        // writers that cloned the slot before removal queue on this lock
        let mut stored = slot.write().await;
        stored.detached = true;
        self.retired.write().await.insert(event_id, stored.version);
        Ok(())
    }
}

#[async_trait]
impl EventDirectory for InMemoryPersistence {
    async fn capacity(&self, event_id: EventId) -> Result<i64, GatewayError> {
        self.events
            .read()
            .await
            .get(&event_id)
            .copied()
            .ok_or(GatewayError::EventNotFound(event_id))
    }

    async fn upsert_event(&self, event_id: EventId, capacity: i64) -> Result<(), GatewayError> {
        self.events.write().await.insert(event_id, capacity);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::Utc;

    fn waitlist(event_id: u64) -> Waitlist {
        Waitlist::new(EventId::new(event_id), 10, Utc::now())
    }

    #[tokio::test]
    async fn create_and_read() {
        let store = InMemoryPersistence::new();
        let result = store.create(&waitlist(1)).await;
        assert_eq!(result.ok(), Some(Version::INITIAL));

        let Ok((loaded, version)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        assert_eq!(loaded.event_id, EventId::new(1));
        assert_eq!(version, Version::INITIAL);
    }

    #[tokio::test]
    async fn create_twice_is_rejected() {
        let store = InMemoryPersistence::new();
        let _ = store.create(&waitlist(1)).await;
        let result = store.create(&waitlist(1)).await;
        assert!(matches!(result, Err(GatewayError::WaitlistExists(_))));
    }

    #[tokio::test]
    async fn read_missing_returns_not_found() {
        let store = InMemoryPersistence::new();
        let result = store.read(EventId::new(9)).await;
        assert!(matches!(result, Err(GatewayError::WaitlistNotFound(_))));
    }

    #[tokio::test]
    async fn write_bumps_version() {
        let store = InMemoryPersistence::new();
        let _ = store.create(&waitlist(1)).await;
        let Ok((mut wl, version)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        let _ = wl.admit(UserId::new(3), Utc::now());

        let written = store.write(&wl, version).await;
        assert_eq!(written.ok(), Some(Version::new(2)));

        let Ok((reloaded, _)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        assert!(reloaded.contains(UserId::new(3)));
    }

    #[tokio::test]
    async fn stale_write_conflicts() {
        let store = InMemoryPersistence::new();
        let _ = store.create(&waitlist(1)).await;
        let Ok((first, v1)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        let Ok((second, v2)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };

        assert!(store.write(&first, v1).await.is_ok());
        let result = store.write(&second, v2).await;
        let Err(GatewayError::VersionConflict {
            expected, found, ..
        }) = result
        else {
            panic!("expected VersionConflict, got {result:?}");
        };
        assert_eq!(expected, Version::INITIAL);
        assert_eq!(found, Version::new(2));
    }

    #[tokio::test]
    async fn remove_then_write_is_not_found() {
        let store = InMemoryPersistence::new();
        let _ = store.create(&waitlist(1)).await;
        let Ok((wl, version)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        assert!(store.remove(EventId::new(1)).await.is_ok());
        assert!(store.is_empty().await);

        let result = store.write(&wl, version).await;
        assert!(matches!(result, Err(GatewayError::WaitlistNotFound(_))));
        let again = store.remove(EventId::new(1)).await;
        assert!(matches!(again, Err(GatewayError::WaitlistNotFound(_))));
    }

    #[tokio::test]
    async fn recreated_waitlist_rejects_stale_write() {
        let store = InMemoryPersistence::new();
        let _ = store.create(&Waitlist::new(EventId::new(1), 5, Utc::now())).await;
        let Ok((mut stale, stale_version)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        let _ = stale.admit(UserId::new(9), Utc::now());

        assert!(store.remove(EventId::new(1)).await.is_ok());
        let recreated = store
            .create(&Waitlist::new(EventId::new(1), 100, Utc::now()))
            .await;
        let Ok(fresh_version) = recreated else {
            panic!("recreate failed: {recreated:?}");
        };
        assert!(fresh_version > stale_version);

        let result = store.write(&stale, stale_version).await;
        assert!(matches!(result, Err(GatewayError::VersionConflict { .. })));

        let Ok((current, version)) = store.read(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        assert_eq!(version, fresh_version);
        assert_eq!(current.max_waitlist_size, 100);
        assert!(!current.contains(UserId::new(9)));
    }

    #[tokio::test]
    async fn removal_detaches_the_slot() {
        let store = InMemoryPersistence::new();
        let _ = store.create(&waitlist(1)).await;
        let Ok(slot) = store.slot(EventId::new(1)).await else {
            panic!("waitlist should exist");
        };
        assert!(store.remove(EventId::new(1)).await.is_ok());

        let stored = slot.read().await;
        assert!(stored.detached);
        assert_eq!(stored.version, Version::INITIAL);
    }

    #[tokio::test]
    async fn event_capacity_lookup() {
        let store = InMemoryPersistence::new().with_event(EventId::new(4), 2);
        assert_eq!(store.capacity(EventId::new(4)).await.ok(), Some(2));

        let missing = store.capacity(EventId::new(5)).await;
        assert!(matches!(missing, Err(GatewayError::EventNotFound(_))));

        assert!(store.upsert_event(EventId::new(4), 0).await.is_ok());
        assert_eq!(store.capacity(EventId::new(4)).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn len_and_is_empty() {
        let store = InMemoryPersistence::new();
        assert!(store.is_empty().await);
        let _ = store.create(&waitlist(1)).await;
        let _ = store.create(&waitlist(2)).await;
        assert_eq!(store.len().await, 2);
    }
}
