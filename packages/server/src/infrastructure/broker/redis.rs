//! Redis-backed broker

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::{AsyncCommands, Client, RedisError, aio::MultiplexedConnection, aio::PubSub};
use tokio::sync::Mutex;

use crate::domain::{Broker, BrokerError, BrokerMessage, Subscription};

fn connection_error(error: RedisError) -> BrokerError {
    BrokerError::Connection(error.to_string())
}

fn command_error(command: &'static str) -> impl FnOnce(RedisError) -> BrokerError {
    move |error| BrokerError::Command {
        command,
        reason: error.to_string(),
    }
}

/// Redis broker with separate publisher and subscriber connections
///
/// The publisher is a multiplexed connection shared by every task. The
/// subscriber is a dedicated pub/sub connection handed out once to the relay.
pub struct RedisBroker {
    publisher: MultiplexedConnection,
    subscriber: Mutex<Option<PubSub>>,
}

impl RedisBroker {
    /// Open both connections to `url`
    ///
    /// Fails if either connection cannot be established, so an unreachable
    /// broker is detected before the server accepts clients.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = Client::open(url).map_err(connection_error)?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connection_error)?;
        let subscriber = client.get_async_pubsub().await.map_err(connection_error)?;

        tracing::info!("Connected to Redis (publisher and subscriber)");

        Ok(Self {
            publisher,
            subscriber: Mutex::new(Some(subscriber)),
        })
    }

    fn publisher(&self) -> MultiplexedConnection {
        self.publisher.clone()
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError> {
        self.publisher()
            .get::<_, Option<i64>>(key)
            .await
            .map_err(command_error("GET"))
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError> {
        self.publisher()
            .set::<_, _, ()>(key, value)
            .await
            .map_err(command_error("SET"))
    }

    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError> {
        self.publisher()
            .set_nx::<_, _, bool>(key, value)
            .await
            .map_err(command_error("SETNX"))
    }

    async fn incr(&self, key: &str) -> Result<i64, BrokerError> {
        // `AsyncCommands::incr` は INCRBY を送るため、INCR を直接発行する
        let mut publisher = self.publisher();
        let value: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut publisher)
            .await
            .map_err(command_error("INCR"))?;
        Ok(value)
    }

    async fn decr(&self, key: &str) -> Result<i64, BrokerError> {
        let mut publisher = self.publisher();
        let value: i64 = redis::cmd("DECR")
            .arg(key)
            .query_async(&mut publisher)
            .await
            .map_err(command_error("DECR"))?;
        Ok(value)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        let receivers = self
            .publisher()
            .publish::<_, _, i64>(channel, payload)
            .await
            .map_err(command_error("PUBLISH"))?;
        tracing::trace!("Published to '{}' ({} receivers)", channel, receivers);
        Ok(())
    }

    async fn subscribe(&self, channels: &[&'static str]) -> Result<Subscription, BrokerError> {
        let mut pubsub = self
            .subscriber
            .lock()
            .await
            .take()
            .ok_or(BrokerError::SubscriberTaken)?;

        let mut rejected = Vec::new();
        for channel in channels {
            match pubsub.subscribe(*channel).await {
                Ok(()) => tracing::info!("Subscribed to '{}'", channel),
                Err(e) => rejected.push((channel.to_string(), command_error("SUBSCRIBE")(e))),
            }
        }

        let messages = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                let channel = msg.get_channel_name().to_string();
                match msg.get_payload::<String>() {
                    Ok(payload) => Some(BrokerMessage { channel, payload }),
                    Err(e) => {
                        tracing::warn!("Dropping undecodable message on '{}': {}", channel, e);
                        None
                    }
                }
            })
            .boxed();

        Ok(Subscription { messages, rejected })
    }
}
