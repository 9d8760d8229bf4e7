//! Wire messages of the Phoenix-based realtime protocol

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A full message received or sent over the WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub event: ChannelEvent,
    #[serde(default)]
    pub payload: Value,
    /// String reference; the server sends `null` for pushes
    #[serde(rename = "ref", default)]
    pub message_ref: Value,
}

impl RealtimeMessage {
    pub fn new(topic: &str, event: ChannelEvent, payload: Value, message_ref: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event,
            payload,
            message_ref: Value::String(message_ref.to_string()),
        }
    }

    /// The reference as a string, if one was sent
    pub fn ref_str(&self) -> Option<&str> {
        self.message_ref.as_str()
    }

    /// Reply status (`ok` / `error`) of a `phx_reply`
    pub fn reply_status(&self) -> Option<&str> {
        self.payload.get("status").and_then(Value::as_str)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Channel events, including the Phoenix control events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelEvent {
    #[serde(rename = "phx_join")]
    Join,
    #[serde(rename = "phx_leave")]
    Leave,
    #[serde(rename = "phx_reply")]
    Reply,
    #[serde(rename = "phx_error")]
    Error,
    #[serde(rename = "phx_close")]
    Close,
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(rename = "postgres_changes")]
    PostgresChanges,
    // Row events as sent by older realtime servers
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "system")]
    System,
    #[serde(other)]
    Unknown,
}

impl ChannelEvent {
    /// Whether the event reports a change to watched rows
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            ChannelEvent::PostgresChanges
                | ChannelEvent::Insert
                | ChannelEvent::Update
                | ChannelEvent::Delete
        )
    }
}

/// Summary of one database change delivered to a channel callback
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePayload {
    /// `INSERT`, `UPDATE` or `DELETE`
    pub event_type: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    /// New row for inserts and updates, old row for deletes
    pub record: Value,
}

impl ChangePayload {
    /// Extract the change from a message payload in either the current
    /// (`payload.data`) or the legacy (flat payload) layout
    pub fn from_payload(payload: &Value) -> Self {
        let data = payload.get("data").unwrap_or(payload);
        let text = |key: &str| data.get(key).and_then(Value::as_str).map(String::from);

        let record = data
            .get("record")
            .filter(|v| !v.is_null())
            .or_else(|| data.get("old_record"))
            .cloned()
            .unwrap_or(Value::Null);

        Self {
            event_type: text("type").or_else(|| text("eventType")),
            schema: text("schema"),
            table: text("table"),
            record,
        }
    }
}
