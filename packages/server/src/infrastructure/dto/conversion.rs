//! Conversion logic between domain events and DTOs.

use kairo_shared::time::to_rfc3339_millis;

use crate::domain::{OutboundEvent, RelayEnvelope};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<RelayEnvelope> for dto::RelayedMessagePayload {
    fn from(envelope: RelayEnvelope) -> Self {
        Self {
            created_at: to_rfc3339_millis(&envelope.created_at),
            message: envelope.message,
            id: envelope.id.to_string(),
            port: envelope.origin_port,
        }
    }
}

impl From<OutboundEvent> for dto::ServerEvent {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::CountUpdate(count) => {
                dto::ServerEvent::CountUpdate(dto::CountUpdatePayload {
                    count: count.value(),
                })
            }
            OutboundEvent::NewMessage(envelope) => dto::ServerEvent::NewMessage(envelope.into()),
        }
    }
}
