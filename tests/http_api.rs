//! REST API tests: the full router served on an ephemeral port and driven
//! with `reqwest`.

#![allow(clippy::panic, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use waitlist_gateway::api;
use waitlist_gateway::app_state::AppState;
use waitlist_gateway::domain::EventBus;
use waitlist_gateway::persistence::{EventDirectory, InMemoryPersistence, WaitlistStore};
use waitlist_gateway::service::{RetryPolicy, WaitlistService};

/// Starts the gateway over an empty in-memory store and returns its base URL.
async fn spawn_gateway() -> String {
    let store = Arc::new(InMemoryPersistence::new());
    let waitlists = Arc::clone(&store) as Arc<dyn WaitlistStore>;
    let events: Arc<dyn EventDirectory> = store;
    let service = Arc::new(WaitlistService::new(
        waitlists,
        events,
        EventBus::new(256),
        RetryPolicy::immediate(16),
        1_000,
    ));
    let app = api::app(AppState::new(service, "memory"), Duration::from_secs(5));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to random port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

async fn body(resp: reqwest::Response) -> Value {
    resp.json::<Value>().await.expect("JSON body")
}

async fn setup_event(client: &reqwest::Client, base: &str, event_id: u64, capacity: i64) {
    let resp = client
        .put(format!("{base}/api/v1/events/{event_id}"))
        .json(&json!({ "capacity": capacity }))
        .send()
        .await
        .expect("upsert event");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/api/v1/events/{event_id}/waitlist"))
        .json(&json!({ "max_waitlist_size": 10 }))
        .send()
        .await
        .expect("create waitlist");
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn health_reports_storage_backend() {
    let base = spawn_gateway().await;
    let resp = reqwest::get(format!("{base}/health"))
        .await
        .expect("health request");
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["storage"], "memory");
}

#[tokio::test]
async fn join_draw_and_decline_over_http() {
    let base = spawn_gateway().await;
    let client = reqwest::Client::new();
    setup_event(&client, &base, 7, 1).await;
    let entrants = format!("{base}/api/v1/events/7/waitlist/entrants");

    let resp = client
        .put(format!("{entrants}/1"))
        .send()
        .await
        .expect("join");
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body(resp).await["outcome"], "joined");

    let resp = client
        .put(format!("{entrants}/1"))
        .send()
        .await
        .expect("join again");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["outcome"], "already_joined");

    let resp = client
        .put(format!("{entrants}/2"))
        .send()
        .await
        .expect("second join");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base}/api/v1/events/7/lottery/draw"))
        .send()
        .await
        .expect("draw");
    assert_eq!(resp.status(), StatusCode::OK);
    let draw = body(resp).await;
    let Some(selected) = draw["selected"].as_array() else {
        panic!("selected must be an array: {draw}");
    };
    assert_eq!(selected.len(), 1);
    let winner = selected[0].as_u64().expect("numeric user id");
    let other = if winner == 1 { 2 } else { 1 };

    let resp = client
        .get(format!("{entrants}?status=selected"))
        .send()
        .await
        .expect("list selected");
    assert_eq!(resp.status(), StatusCode::OK);
    let list = body(resp).await;
    assert_eq!(list["pagination"]["total"], 1);
    assert_eq!(list["data"][0]["user_id"], winner);

    let resp = client
        .post(format!("{entrants}/{winner}/response"))
        .json(&json!({ "decision": "decline" }))
        .send()
        .await
        .expect("decline");
    assert_eq!(resp.status(), StatusCode::OK);
    let declined = body(resp).await;
    assert_eq!(declined["status"], "declined");
    assert_eq!(declined["refill"]["result"], "drawn");
    assert_eq!(declined["refill"]["selected"][0], other);

    let resp = client
        .get(format!("{entrants}/{other}"))
        .send()
        .await
        .expect("get entrant");
    assert_eq!(body(resp).await["status"], "selected");

    let resp = client
        .get(format!("{base}/api/v1/events/7/waitlist"))
        .send()
        .await
        .expect("summary");
    let summary = body(resp).await;
    assert_eq!(summary["phase"], "drawn");
    assert_eq!(summary["entry_count"], 2);
    assert_eq!(summary["declined"], 1);
    assert_eq!(summary["selected"], 1);
}

#[tokio::test]
async fn errors_carry_codes_and_statuses() {
    let base = spawn_gateway().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/events/404/waitlist"))
        .send()
        .await
        .expect("create for unknown event");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(resp).await["error"]["code"], 2001);

    let resp = client
        .put(format!("{base}/api/v1/events/0/waitlist/entrants/1"))
        .send()
        .await
        .expect("zero event id");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await["error"]["code"], 1001);

    setup_event(&client, &base, 3, 2).await;

    let resp = client
        .post(format!("{base}/api/v1/events/3/waitlist"))
        .send()
        .await
        .expect("duplicate waitlist");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body(resp).await["error"]["code"], 2004);

    let resp = client
        .post(format!("{base}/api/v1/events/3/lottery/draw"))
        .send()
        .await
        .expect("draw on empty waitlist");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body(resp).await["error"]["code"], 4003);

    let resp = client
        .post(format!("{base}/api/v1/events/3/waitlist/entrants/9/response"))
        .json(&json!({ "decision": "accept" }))
        .send()
        .await
        .expect("respond for unknown user");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(resp).await["error"]["code"], 2003);

    let resp = client
        .get(format!("{base}/api/v1/events/3/waitlist/entrants?status=lost"))
        .send()
        .await
        .expect("bad status filter");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn organizer_cancel_and_waitlist_removal() {
    let base = spawn_gateway().await;
    let client = reqwest::Client::new();
    setup_event(&client, &base, 5, 3).await;
    let entrants = format!("{base}/api/v1/events/5/waitlist/entrants");

    client
        .put(format!("{entrants}/1"))
        .send()
        .await
        .expect("join");
    let resp = client
        .post(format!("{entrants}/1/cancel"))
        .send()
        .await
        .expect("cancel waiting");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["outcome"], "removed");

    let resp = client
        .get(format!("{entrants}/1"))
        .send()
        .await
        .expect("get removed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .delete(format!("{base}/api/v1/events/5/waitlist"))
        .send()
        .await
        .expect("delete waitlist");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base}/api/v1/events/5/waitlist"))
        .send()
        .await
        .expect("get deleted");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(resp).await["error"]["code"], 2002);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let base = spawn_gateway().await;
    let resp = reqwest::get(format!("{base}/openapi.json"))
        .await
        .expect("openapi request");
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body(resp).await;
    assert!(doc["paths"]["/api/v1/events/{event_id}/lottery/draw"].is_object());
}
