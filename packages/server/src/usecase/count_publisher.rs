//! Publishing of post-operation counter values.

use crate::domain::{Broker, ConnectionCount, RelayChannel};

/// Publish `count` on the count-updates channel.
///
/// Failures are logged and swallowed: the counter itself is already updated
/// and the next successful publish carries the current value anyway.
pub(crate) async fn publish_count(broker: &dyn Broker, count: ConnectionCount) -> bool {
    let channel = RelayChannel::CountUpdates.name();
    match broker.publish(channel, &count.to_payload()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to publish count {} to '{}': {}", count, channel, e);
            false
        }
    }
}
