//! WebSocket notification tests: a subscriber receives the committed events
//! of the waitlists it asked for, and nothing else.

#![allow(clippy::panic, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use waitlist_gateway::api;
use waitlist_gateway::app_state::AppState;
use waitlist_gateway::domain::{Decision, EventBus, EventId, UserId};
use waitlist_gateway::persistence::{EventDirectory, InMemoryPersistence, WaitlistStore};
use waitlist_gateway::service::{RetryPolicy, WaitlistService};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WATCHED: EventId = EventId::new(11);
const OTHER: EventId = EventId::new(12);

async fn spawn_gateway() -> (String, Arc<WaitlistService>) {
    let store = Arc::new(
        InMemoryPersistence::new()
            .with_event(WATCHED, 1)
            .with_event(OTHER, 1),
    );
    let waitlists = Arc::clone(&store) as Arc<dyn WaitlistStore>;
    let events: Arc<dyn EventDirectory> = store;
    let service = Arc::new(WaitlistService::new(
        waitlists,
        events,
        EventBus::new(256),
        RetryPolicy::immediate(16),
        100,
    ));
    let app = api::app(
        AppState::new(Arc::clone(&service), "memory"),
        Duration::from_secs(5),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to random port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("ws://{addr}/ws"), service)
}

/// Reads the next text frame as JSON, failing after two seconds.
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("JSON frame");
        }
    }
}

async fn subscribe(ws: &mut Client, event_id: EventId) {
    let request = format!(
        r#"{{"id":"sub-1","command":"subscribe","event_ids":[{}]}}"#,
        event_id.get()
    );
    ws.send(Message::text(request)).await.expect("send subscribe");
    let response = next_json(ws).await;
    assert_eq!(response["type"], "response");
    assert_eq!(response["id"], "sub-1");
    assert_eq!(response["payload"]["count"], 1);
}

#[tokio::test]
async fn subscriber_is_told_who_was_selected() {
    let (url, service) = spawn_gateway().await;
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");
    subscribe(&mut ws, WATCHED).await;

    service
        .create_waitlist(OTHER, None)
        .await
        .expect("create other");
    service
        .join(OTHER, UserId::new(1))
        .await
        .expect("join other");
    service
        .create_waitlist(WATCHED, None)
        .await
        .expect("create watched");
    service
        .join(WATCHED, UserId::new(5))
        .await
        .expect("join watched");

    let created = next_json(&mut ws).await;
    assert_eq!(created["type"], "event");
    assert_eq!(created["payload"]["event_type"], "waitlist_created");
    assert_eq!(created["payload"]["event_id"], WATCHED.get());

    let joined = next_json(&mut ws).await;
    assert_eq!(joined["payload"]["event_type"], "entrant_joined");
    assert_eq!(joined["payload"]["user_id"], 5);

    let outcome = service.draw(WATCHED).await.expect("draw");
    assert_eq!(outcome.selected, vec![UserId::new(5)]);

    let selected = next_json(&mut ws).await;
    assert_eq!(selected["payload"]["event_type"], "entrant_selected");
    assert_eq!(selected["payload"]["user_id"], 5);

    let drawn = next_json(&mut ws).await;
    assert_eq!(drawn["payload"]["event_type"], "lottery_drawn");
    assert_eq!(drawn["payload"]["selected_count"], 1);
}

#[tokio::test]
async fn decline_is_published_with_reason() {
    let (url, service) = spawn_gateway().await;
    service
        .create_waitlist(WATCHED, None)
        .await
        .expect("create watched");
    service
        .join(WATCHED, UserId::new(3))
        .await
        .expect("join watched");
    service.draw(WATCHED).await.expect("draw");

    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");
    subscribe(&mut ws, WATCHED).await;

    service
        .respond(WATCHED, UserId::new(3), Decision::Decline)
        .await
        .expect("decline");

    let declined = next_json(&mut ws).await;
    assert_eq!(declined["payload"]["event_type"], "entrant_declined");
    assert_eq!(declined["payload"]["user_id"], 3);
    assert_eq!(declined["payload"]["reason"], "entrant_declined");
}

#[tokio::test]
async fn get_waitlist_command_returns_summary() {
    let (url, service) = spawn_gateway().await;
    service
        .create_waitlist(WATCHED, Some(4))
        .await
        .expect("create watched");

    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");
    ws.send(Message::text(
        r#"{"id":"q","command":"get_waitlist","event_id":11}"#,
    ))
    .await
    .expect("send query");
    let response = next_json(&mut ws).await;
    assert_eq!(response["type"], "response");
    assert_eq!(response["payload"]["max_waitlist_size"], 4);
    assert_eq!(response["payload"]["phase"], "open");

    ws.send(Message::text(
        r#"{"id":"q2","command":"get_waitlist","event_id":12}"#,
    ))
    .await
    .expect("send missing query");
    let missing = next_json(&mut ws).await;
    assert_eq!(missing["type"], "error");
    assert_eq!(missing["payload"]["code"], 2002);
}

#[tokio::test]
async fn user_filter_delivers_only_that_users_notifications() {
    let (url, service) = spawn_gateway().await;
    service
        .create_waitlist(WATCHED, None)
        .await
        .expect("create watched");

    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");
    ws.send(Message::text(
        r#"{"id":"n","command":"subscribe","event_ids":["*"],"user_ids":[8],"notifications_only":true}"#,
    ))
    .await
    .expect("send subscribe");
    let response = next_json(&mut ws).await;
    assert_eq!(response["payload"]["user_count"], 1);
    assert_eq!(response["payload"]["notifications_only"], true);

    service
        .join(WATCHED, UserId::new(8))
        .await
        .expect("join followed user");
    let outcome = service.draw(WATCHED).await.expect("draw");
    assert_eq!(outcome.selected, vec![UserId::new(8)]);
    service
        .respond(WATCHED, UserId::new(8), Decision::Decline)
        .await
        .expect("decline");
    service
        .join(WATCHED, UserId::new(9))
        .await
        .expect("join other user");
    let refill = service.draw(WATCHED).await.expect("refill draw");
    assert_eq!(refill.selected, vec![UserId::new(9)]);

    // joins, lottery_drawn and user 9's selection are all filtered out
    let selected = next_json(&mut ws).await;
    assert_eq!(selected["payload"]["event_type"], "entrant_selected");
    assert_eq!(selected["payload"]["user_id"], 8);

    let declined = next_json(&mut ws).await;
    assert_eq!(declined["payload"]["event_type"], "entrant_declined");
    assert_eq!(declined["payload"]["user_id"], 8);

    let nothing_else = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(nothing_else.is_err(), "unexpected frame: {nothing_else:?}");
}
