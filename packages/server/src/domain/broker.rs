//! Shared broker interface
//!
//! The broker is an external key/counter/pub-sub store shared by every
//! instance. It is the only place where cross-instance state lives; the
//! relay never locks anything itself and relies on the atomicity of
//! `incr`/`decr` at the broker.
//!
//! ## Ordering contract
//!
//! - Messages on one channel reach a given subscriber in publish order.
//! - Nothing is guaranteed *between* channels: a `count-updates` event may
//!   overtake a `new-messages` event published earlier, and vice versa.
//! - Publishes from different instances interleave arbitrarily.
//! - Messages published while a subscriber is not connected are not replayed.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::error::BrokerError;

/// One message received on a subscribed channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub channel: String,
    pub payload: String,
}

impl BrokerMessage {
    pub fn new(channel: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

pub type BrokerStream = BoxStream<'static, BrokerMessage>;

/// Result of subscribing to a set of channels
///
/// Channels that could not be subscribed are reported in `rejected`; the
/// stream still delivers messages for every other channel.
pub struct Subscription {
    pub messages: BrokerStream,
    pub rejected: Vec<(String, BrokerError)>,
}

/// Publisher + subscriber roles of the shared broker
///
/// Implementations keep the two roles on separate connections, since a
/// connection in subscribe mode cannot issue ordinary commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broker: Send + Sync {
    /// Integer value of `key`, `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError>;

    /// Overwrite `key`
    async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError>;

    /// Create `key` only if it does not exist yet; `true` if it was created
    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError>;

    /// Atomically increment `key` and return the new value
    async fn incr(&self, key: &str) -> Result<i64, BrokerError>;

    /// Atomically decrement `key` and return the new value
    async fn decr(&self, key: &str) -> Result<i64, BrokerError>;

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError>;

    /// Subscribe to `channels` on the subscriber connection
    ///
    /// `Err` means the subscriber connection itself is unusable.
    async fn subscribe(&self, channels: &[&'static str]) -> Result<Subscription, BrokerError>;
}
