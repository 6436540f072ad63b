//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams committed [`crate::domain::WaitlistEvent`]s
//! to clients that subscribed to the matching event IDs. Notifiers listen
//! here for `entrant_selected` and `entrant_declined`.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
