//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{EventSelector, WsCommand, WsMessage, WsMessageType, WsRequest};
use super::subscription::SubscriptionManager;
use crate::domain::{EventId, UserId, WaitlistEvent};
use crate::service::WaitlistService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<WaitlistEvent>,
    waitlist_service: Arc<WaitlistService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &waitlist_service).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(waitlist_event) => {
                        if subs.matches(&waitlist_event) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&waitlist_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits selectors into concrete event IDs and a wildcard flag.
/// Zero IDs and unknown patterns are dropped.
fn resolve_selectors(selectors: &[EventSelector]) -> (Vec<EventId>, bool) {
    let mut ids = Vec::with_capacity(selectors.len());
    let mut wildcard = false;
    for selector in selectors {
        match selector {
            EventSelector::Event(raw) => {
                if let Ok(id) = EventId::parse(*raw) {
                    ids.push(id);
                }
            }
            other => wildcard |= other.is_wildcard(),
        }
    }
    (ids, wildcard)
}

/// Parses user IDs, dropping zeros.
fn resolve_users(raw: &[u64]) -> Vec<UserId> {
    raw.iter()
        .filter_map(|id| UserId::parse(*id).ok())
        .collect()
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    waitlist_service: &WaitlistService,
) -> Option<String> {
    let request = match serde_json::from_str::<WsRequest>(text) {
        Ok(request) => request,
        Err(err) => {
            let msg = if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                WsMessage::error("", 404, &format!("unknown command: {err}"))
            } else {
                WsMessage::error("", 400, "malformed JSON")
            };
            return serde_json::to_string(&msg).ok();
        }
    };

    let response = match request.command {
        WsCommand::Subscribe {
            event_ids,
            user_ids,
            notifications_only,
        } => {
            let (ids, wildcard) = resolve_selectors(&event_ids);
            let users = resolve_users(&user_ids);
            subs.subscribe(&ids, wildcard);
            subs.follow_users(&users);
            if let Some(enabled) = notifications_only {
                subs.set_notifications_only(enabled);
            }
            WsMessage::new(
                request.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                    "user_count": subs.user_count(),
                    "notifications_only": subs.is_notifications_only(),
                }),
            )
        }
        WsCommand::Unsubscribe {
            event_ids,
            user_ids,
        } => {
            let (ids, wildcard) = resolve_selectors(&event_ids);
            subs.unsubscribe(&ids, wildcard);
            subs.unfollow_users(&resolve_users(&user_ids));
            WsMessage::new(
                request.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                    "user_count": subs.user_count(),
                }),
            )
        }
        WsCommand::GetWaitlist { event_id } => {
            let summary = match EventId::parse(event_id) {
                Ok(id) => waitlist_service.summary(id).await,
                Err(err) => Err(err),
            };
            match summary {
                Ok(summary) => WsMessage::new(
                    request.id,
                    WsMessageType::Response,
                    serde_json::to_value(&summary).unwrap_or_default(),
                ),
                Err(err) => WsMessage::error(request.id, err.error_code(), &err.to_string()),
            }
        }
    };
    serde_json::to_string(&response).ok()
}
