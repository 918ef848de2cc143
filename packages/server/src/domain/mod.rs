//! Domain layer
//!
//! 分散チャットリレーの中核となる型と、Infrastructure 層が実装する trait を定義します。
//!
//! - `broker`: 共有ブローカー（カウンター + Pub/Sub）のインターフェース
//! - `message_pusher`: ローカル接続クライアントへの通知インターフェース
//! - `presence`: インスタンスローカルの接続数トラッキング

pub mod broker;
pub mod channel;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod presence;
pub mod value_object;

pub use broker::{Broker, BrokerMessage, BrokerStream, Subscription};
pub use channel::{CONNECTION_COUNT_KEY, RelayChannel};
pub use entity::{OutboundEvent, RelayEnvelope};
pub use error::{BrokerError, MessagePushError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use presence::{LocalConnectionTracker, PresenceTicket};
pub use value_object::{ConnectionCount, ConnectionId};

#[cfg(test)]
pub use broker::MockBroker;
