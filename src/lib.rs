//! # waitlist-gateway
//!
//! REST API and WebSocket gateway for capacity-bounded event waitlists.
//!
//! Users join a per-event waitlist. An organizer runs a lottery that selects
//! uniformly at random among waiting entrants until the event's capacity is
//! filled. Selected entrants accept or decline, and a decline frees a slot
//! that a refill draw hands to someone still waiting.
//!
//! Every mutation is an optimistic read-modify-write: the service reads a
//! versioned snapshot, applies a pure domain rule, and writes back only if the
//! version is unchanged, re-running the cycle on conflict.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── WaitlistService (service/)
//!     │     ├── AdmissionController
//!     │     ├── LotteryEngine
//!     │     └── StatusTransitionService
//!     ├── EventBus (domain/)
//!     │
//!     └── WaitlistStore + EventDirectory (persistence/)
//!           ├── InMemoryPersistence
//!           └── PostgresPersistence
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
