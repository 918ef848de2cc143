//! WebSocket event DTOs.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

/// Events sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    NewMessage(NewMessagePayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMessagePayload {
    pub message: String,
}

/// Events sent to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    CountUpdate(CountUpdatePayload),
    NewMessage(RelayedMessagePayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountUpdatePayload {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelayedMessagePayload {
    pub message: String,
    pub id: String,
    /// RFC 3339, UTC, millisecond precision
    pub created_at: String,
    pub port: u16,
}
