//! PostgreSQL implementation of the persistence layer.
//!
//! Each waitlist is one row whose `entries` column holds the full entry list
//! as JSONB. A write is a single `UPDATE ... WHERE version = $expected`, so
//! the version check and the replacement are one atomic statement.
//!
//! Versions are drawn from the `waitlist_version_seq` sequence on insert and
//! on every update. A waitlist deleted and created again therefore never
//! reuses a version that a stale reader may still hold.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use super::models::{WaitlistRecord, to_db_i64, to_version};
use super::{EventDirectory, Version, WaitlistStore};
use crate::domain::{EventId, Waitlist};
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }

    async fn current_version(&self, event_id: i64) -> Result<Option<i64>, GatewayError> {
        let version =
            sqlx::query_scalar::<_, i64>("SELECT version FROM waitlists WHERE event_id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(version)
    }
}

fn entry_count(waitlist: &Waitlist) -> Result<i64, GatewayError> {
    i64::try_from(waitlist.len())
        .map_err(|_| GatewayError::Internal("entry count overflows BIGINT".to_string()))
}

#[async_trait]
impl WaitlistStore for PostgresPersistence {
    async fn create(&self, waitlist: &Waitlist) -> Result<Version, GatewayError> {
        let event_id = to_db_i64(waitlist.event_id.get(), "event_id")?;
        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO waitlists \
             (event_id, max_waitlist_size, phase, entries, entry_count, created_at, last_modified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (event_id) DO NOTHING RETURNING version",
        )
        .bind(event_id)
        .bind(i64::from(waitlist.max_waitlist_size))
        .bind(waitlist.phase.as_str())
        .bind(Json(waitlist.entries()))
        .bind(entry_count(waitlist)?)
        .bind(waitlist.created_at)
        .bind(waitlist.last_modified_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(version) => to_version(version),
            None => Err(GatewayError::WaitlistExists(waitlist.event_id)),
        }
    }

    async fn read(&self, event_id: EventId) -> Result<(Waitlist, Version), GatewayError> {
        let record = sqlx::query_as::<_, WaitlistRecord>(
            "SELECT event_id, max_waitlist_size, phase, entries, entry_count, version, \
             created_at, last_modified_at FROM waitlists WHERE event_id = $1",
        )
        .bind(to_db_i64(event_id.get(), "event_id")?)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GatewayError::WaitlistNotFound(event_id))?;

        record.into_domain()
    }

    async fn write(
        &self,
        waitlist: &Waitlist,
        expected: Version,
    ) -> Result<Version, GatewayError> {
        let event_id = waitlist.event_id;
        let db_event_id = to_db_i64(event_id.get(), "event_id")?;
        let updated = sqlx::query_scalar::<_, i64>(
            "UPDATE waitlists SET max_waitlist_size = $2, phase = $3, entries = $4, \
             entry_count = $5, last_modified_at = $6, version = nextval('waitlist_version_seq') \
             WHERE event_id = $1 AND version = $7 RETURNING version",
        )
        .bind(db_event_id)
        .bind(i64::from(waitlist.max_waitlist_size))
        .bind(waitlist.phase.as_str())
        .bind(Json(waitlist.entries()))
        .bind(entry_count(waitlist)?)
        .bind(waitlist.last_modified_at)
        .bind(to_db_i64(expected.get(), "version")?)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = updated {
            return to_version(version);
        }

        // Zero rows matched: either the row is gone or its version moved on.
        match self.current_version(db_event_id).await? {
            None => Err(GatewayError::WaitlistNotFound(event_id)),
            Some(found) => Err(GatewayError::VersionConflict {
                event_id,
                expected,
                found: to_version(found)?,
            }),
        }
    }

    async fn remove(&self, event_id: EventId) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM waitlists WHERE event_id = $1")
            .bind(to_db_i64(event_id.get(), "event_id")?)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::WaitlistNotFound(event_id));
        }
        Ok(())
    }
}

#[async_trait]
impl EventDirectory for PostgresPersistence {
    async fn capacity(&self, event_id: EventId) -> Result<i64, GatewayError> {
        sqlx::query_scalar::<_, i64>("SELECT capacity FROM events WHERE event_id = $1")
            .bind(to_db_i64(event_id.get(), "event_id")?)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(GatewayError::EventNotFound(event_id))
    }

    async fn upsert_event(&self, event_id: EventId, capacity: i64) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO events (event_id, capacity) VALUES ($1, $2) \
             ON CONFLICT (event_id) DO UPDATE SET capacity = EXCLUDED.capacity, updated_at = now()",
        )
        .bind(to_db_i64(event_id.get(), "event_id")?)
        .bind(capacity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
