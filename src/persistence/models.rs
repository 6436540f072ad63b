//! Database models for events and waitlists.

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use super::Version;
use crate::domain::{DrawPhase, EventId, Waitlist, WaitlistEntry};
use crate::error::GatewayError;

/// A row from the `waitlists` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WaitlistRecord {
    /// Owning event.
    pub event_id: i64,
    /// Size ceiling.
    pub max_waitlist_size: i64,
    /// Draw phase as stored (`"open"` or `"drawn"`).
    pub phase: String,
    /// Entries in join order, as JSONB.
    pub entries: Json<Vec<WaitlistEntry>>,
    /// Denormalized entry count, checked against `entries` on load.
    pub entry_count: i64,
    /// Optimistic-concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl WaitlistRecord {
    /// Converts the row into a domain aggregate and its version.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if any column is out of
    /// range or the stored entries violate the waitlist invariants.
    pub fn into_domain(self) -> Result<(Waitlist, Version), GatewayError> {
        let event_id = EventId::new(from_db_u64(self.event_id, "event_id")?);
        let max_waitlist_size = u32::try_from(self.max_waitlist_size).map_err(|_| {
            GatewayError::PersistenceError(format!(
                "waitlist {event_id} has max_waitlist_size {} out of range",
                self.max_waitlist_size
            ))
        })?;
        let phase = parse_phase(&self.phase)?;
        let entries = self.entries.0;
        if usize::try_from(self.entry_count).ok() != Some(entries.len()) {
            return Err(GatewayError::PersistenceError(format!(
                "waitlist {event_id} entry_count {} disagrees with {} stored entries",
                self.entry_count,
                entries.len()
            )));
        }
        let version = to_version(self.version)?;
        let waitlist = Waitlist::restore(
            event_id,
            max_waitlist_size,
            phase,
            entries,
            self.created_at,
            self.last_modified_at,
        )?;
        Ok((waitlist, version))
    }
}

/// Converts an unsigned domain value into a `BIGINT` column value.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the value exceeds `i64::MAX`.
pub fn to_db_i64(value: u64, column: &str) -> Result<i64, GatewayError> {
    i64::try_from(value)
        .map_err(|_| GatewayError::InvalidRequest(format!("{column} {value} is out of range")))
}

/// Converts a `version` column value into a [`Version`].
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the stored value is negative.
pub fn to_version(value: i64) -> Result<Version, GatewayError> {
    from_db_u64(value, "version").map(Version::new)
}

fn from_db_u64(value: i64, column: &str) -> Result<u64, GatewayError> {
    u64::try_from(value).map_err(|_| {
        GatewayError::PersistenceError(format!("stored {column} {value} is negative"))
    })
}

fn parse_phase(raw: &str) -> Result<DrawPhase, GatewayError> {
    match raw {
        "open" => Ok(DrawPhase::Open),
        "drawn" => Ok(DrawPhase::Drawn),
        other => Err(GatewayError::PersistenceError(format!(
            "unknown draw phase '{other}'"
        ))),
    }
}
