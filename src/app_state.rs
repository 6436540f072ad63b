//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::WaitlistService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Waitlist service for all business logic.
    pub waitlist_service: Arc<WaitlistService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Storage backend name reported by `/health`.
    pub storage: &'static str,
}

impl AppState {
    /// Builds state around a service, sharing its event bus.
    #[must_use]
    pub fn new(waitlist_service: Arc<WaitlistService>, storage: &'static str) -> Self {
        let event_bus = waitlist_service.event_bus().clone();
        Self {
            waitlist_service,
            event_bus,
            storage,
        }
    }
}
