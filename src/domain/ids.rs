//! Type-safe event and user identifiers.
//!
//! [`EventId`] and [`UserId`] are newtype wrappers around a positive `u64`
//! so that an event identity can never be passed where a user identity is
//! expected. Zero is reserved and rejected at every API boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Identifier of an event (and of the waitlist it owns, 1:1).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct EventId(u64);

/// Identifier of an entrant, unique within a single waitlist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(u64);

impl EventId {
    /// Wraps a raw identifier without validation.
    ///
    /// Use [`EventId::parse`] for untrusted input.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Validates and wraps a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `raw` is zero.
    pub fn parse(raw: u64) -> Result<Self, GatewayError> {
        if raw == 0 {
            return Err(GatewayError::InvalidRequest(
                "event_id must be positive".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl UserId {
    /// Wraps a raw identifier without validation.
    ///
    /// Use [`UserId::parse`] for untrusted input.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Validates and wraps a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `raw` is zero.
    pub fn parse(raw: u64) -> Result<Self, GatewayError> {
        if raw == 0 {
            return Err(GatewayError::InvalidRequest(
                "user_id must be positive".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EventId> for u64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}
