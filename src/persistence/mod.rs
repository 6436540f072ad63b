//! Persistence layer: versioned waitlist storage and the event source.
//!
//! Two ports are defined here:
//!
//! - [`WaitlistStore`]: read a waitlist together with its [`Version`], and
//!   write it back only if the version is unchanged. Every mutating
//!   operation in [`crate::service`] is a read-modify-write over this port.
//! - [`EventDirectory`]: read-only (to the core) source of event capacity.
//!
//! Two adapters implement both ports: [`memory::InMemoryPersistence`] for
//! tests and local runs, and [`postgres::PostgresPersistence`] backed by
//! `sqlx::PgPool`.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EventId, Waitlist};
use crate::error::GatewayError;

pub use memory::InMemoryPersistence;
pub use postgres::PostgresPersistence;

/// Optimistic-concurrency token for a stored waitlist.
///
/// Strictly increases on every successful write. Versions of one event never
/// repeat, including across removing and recreating its waitlist, so a
/// snapshot read before a removal can never win a compare-and-swap against
/// the recreated waitlist. The in-memory store counts up by one from
/// [`Version::INITIAL`]; PostgreSQL draws versions from a sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version of the first waitlist ever created for an event.
    pub const INITIAL: Self = Self(1);

    /// Wraps a raw version number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Versioned storage for [`Waitlist`] aggregates.
///
/// # Concurrency
///
/// [`WaitlistStore::write`] is a compare-and-swap: it succeeds only if the
/// stored version still equals `expected`. Implementations must make the
/// check and the replacement a single atomic step.
#[async_trait]
pub trait WaitlistStore: Send + Sync + fmt::Debug {
    /// Stores a new waitlist and returns its first version, which is above
    /// every version of any earlier waitlist of the same event.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistExists`] if the event already has one.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    async fn create(&self, waitlist: &Waitlist) -> Result<Version, GatewayError>;

    /// Loads a snapshot of the waitlist and its current version.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    async fn read(&self, event_id: EventId) -> Result<(Waitlist, Version), GatewayError>;

    /// Replaces the stored waitlist if its version is still `expected`,
    /// returning the new version.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::VersionConflict`] if another writer got there first.
    /// - [`GatewayError::WaitlistNotFound`] if the waitlist was removed.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    async fn write(&self, waitlist: &Waitlist, expected: Version)
    -> Result<Version, GatewayError>;

    /// Deletes the waitlist of an event.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::WaitlistNotFound`] if the event has no waitlist.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    async fn remove(&self, event_id: EventId) -> Result<(), GatewayError>;
}

/// Source of event capacity.
///
/// The core only calls [`EventDirectory::capacity`]. The write side exists
/// so the component that owns events can publish capacity changes.
#[async_trait]
pub trait EventDirectory: Send + Sync + fmt::Debug {
    /// Returns the raw stored capacity. Callers validate positivity.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EventNotFound`] if the event does not exist.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    async fn capacity(&self, event_id: EventId) -> Result<i64, GatewayError>;

    /// Creates the event or updates its capacity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn upsert_event(&self, event_id: EventId, capacity: i64) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_increments() {
        assert_eq!(Version::INITIAL.next(), Version::new(2));
        assert!(Version::new(3) > Version::INITIAL);
    }

    #[test]
    fn version_display() {
        assert_eq!(Version::new(12).to_string(), "v12");
    }
}
