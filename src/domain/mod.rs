//! Domain layer: identifiers, entrant state machine, waitlist aggregate, and
//! event system.
//!
//! Everything in this module is storage-agnostic. The services in
//! [`crate::service`] combine these types with the persistence ports.

pub mod entrant_status;
pub mod event_bus;
pub mod ids;
pub mod waitlist;
pub mod waitlist_entry;
pub mod waitlist_event;

pub use entrant_status::{Decision, EntrantStatus};
pub use event_bus::EventBus;
pub use ids::{EventId, UserId};
pub use waitlist::{
    DEFAULT_MAX_WAITLIST_SIZE, DrawPhase, JoinOutcome, LeaveOutcome, Waitlist, WaitlistSummary,
};
pub use waitlist_entry::WaitlistEntry;
pub use waitlist_event::{DeclineReason, WaitlistEvent};
