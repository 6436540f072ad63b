//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level server → client message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Echoes the client's request ID; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds an envelope stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// A client request: optional correlation ID plus a command.
///
/// ```json
/// {"id": "1", "command": "subscribe", "event_ids": [1, 2]}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WsRequest {
    /// Client-chosen correlation ID, echoed in the response.
    #[serde(default)]
    pub id: String,
    /// The command to run.
    #[serde(flatten)]
    pub command: WsCommand,
}

/// Event selector in a subscription list: a numeric ID or `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EventSelector {
    /// One event.
    Event(u64),
    /// A pattern; only `"*"` (all events) is recognised.
    Pattern(String),
}

impl EventSelector {
    /// Returns `true` for the `"*"` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Pattern(p) if p == "*")
    }
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events of specific waitlists.
    ///
    /// ```json
    /// {"command": "subscribe", "event_ids": ["*"], "user_ids": [42], "notifications_only": true}
    /// ```
    Subscribe {
        /// Event IDs to subscribe to. Use `["*"]` for all events.
        #[serde(default)]
        event_ids: Vec<EventSelector>,
        /// Only deliver events about these users.
        #[serde(default)]
        user_ids: Vec<u64>,
        /// Only deliver `entrant_selected` and `entrant_declined`. Left
        /// unchanged when absent.
        #[serde(default)]
        notifications_only: Option<bool>,
    },
    /// Unsubscribe from events of specific waitlists or users.
    Unsubscribe {
        /// Event IDs to unsubscribe from. `"*"` clears the wildcard.
        #[serde(default)]
        event_ids: Vec<EventSelector>,
        /// Users to stop following.
        #[serde(default)]
        user_ids: Vec<u64>,
    },
    /// Fetch the current per-status counts of a waitlist.
    GetWaitlist {
        /// Target event.
        event_id: u64,
    },
}
