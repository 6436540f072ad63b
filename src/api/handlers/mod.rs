//! REST endpoint handlers organized by resource.

pub mod entrants;
pub mod events;
pub mod lottery;
pub mod system;
pub mod waitlist;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(events::routes())
        .merge(waitlist::routes())
        .merge(entrants::routes())
        .merge(lottery::routes())
}
