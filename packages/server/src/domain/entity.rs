//! Domain entities

use chrono::{DateTime, Utc};
use kairo_shared::time::Clock;
use uuid::Uuid;

use super::value_object::ConnectionCount;

/// Chat message as relayed to local clients
///
/// Every instance stamps its own envelope when the text arrives from the
/// broker, so the same text carries a different `id`, `created_at` and
/// `origin_port` on each instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEnvelope {
    /// Raw payload as published by the sending instance
    pub message: String,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Port of the instance that built this envelope (diagnostic)
    pub origin_port: u16,
}

impl RelayEnvelope {
    /// Build a fresh envelope for `message` on this instance
    pub fn stamp(message: impl Into<String>, clock: &dyn Clock, origin_port: u16) -> Self {
        Self {
            message: message.into(),
            id: Uuid::new_v4(),
            created_at: clock.now(),
            origin_port,
        }
    }
}

/// Event pushed to every client connected to this instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    CountUpdate(ConnectionCount),
    NewMessage(RelayEnvelope),
}
