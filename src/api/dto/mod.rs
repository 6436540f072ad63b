//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers are serialized as plain JSON numbers. Domain value types
//! ([`crate::domain::WaitlistEntry`], [`crate::domain::WaitlistSummary`],
//! [`crate::service::DrawOutcome`]) are returned directly where their shape
//! already fits the wire.

pub mod common_dto;
pub mod waitlist_dto;

pub use common_dto::*;
pub use waitlist_dto::*;
