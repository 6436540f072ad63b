//! Service layer: business logic orchestration.
//!
//! [`AdmissionController`], [`LotteryEngine`] and [`StatusTransitionService`]
//! each run their mutation as a versioned read-modify-write against the
//! persistence port, re-run through [`retry::retry_on_conflict`] when a
//! concurrent writer wins. [`WaitlistService`] wires them together and adds
//! the waitlist lifecycle and queries. Committed changes are published on the
//! [`super::domain::EventBus`].

pub mod admission;
pub mod lottery;
pub mod retry;
pub mod status_transition;
pub mod waitlist_service;

pub use admission::AdmissionController;
pub use lottery::{DrawOutcome, LotteryEngine, select_uniform};
pub use retry::RetryPolicy;
pub use status_transition::{
    CancelOutcome, RefillOutcome, RespondOutcome, StatusTransitionService,
};
pub use waitlist_service::WaitlistService;
