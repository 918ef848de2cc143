//! UseCase: Fan-out Relay
//!
//! Broker の 2 つのチャンネルを購読し、受信したイベントをこのインスタンスに
//! 接続している全クライアントへ配信します。
//!
//! - count-updates: `count-update { count }` をそのまま配信
//! - new-messages: このインスタンスで新しいエンベロープ（id, 時刻, ポート）を作成して配信
//!
//! 配信順序は Broker の契約（チャンネル単位の FIFO）に従います。
//! チャンネル間の順序は保証されません。

use std::sync::Arc;

use futures_util::StreamExt;
use kairo_shared::time::Clock;

use crate::domain::{
    Broker, BrokerMessage, BrokerStream, ConnectionCount, MessagePusher, OutboundEvent,
    RelayChannel, RelayEnvelope,
};

use super::error::RelayError;

/// Fan-out Relay のユースケース
pub struct RelayEventsUseCase {
    broker: Arc<dyn Broker>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// エンベロープに記録するこのインスタンスのポート
    origin_port: u16,
}

impl RelayEventsUseCase {
    pub fn new(
        broker: Arc<dyn Broker>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        origin_port: u16,
    ) -> Self {
        Self {
            broker,
            message_pusher,
            clock,
            origin_port,
        }
    }

    /// 両チャンネルを購読する
    ///
    /// 購読できなかったチャンネルはログに残し、残りのチャンネルで動作を続けます。
    pub async fn subscribe(&self) -> Result<BrokerStream, RelayError> {
        let subscription = self.broker.subscribe(&RelayChannel::all_names()).await?;
        for (channel, error) in &subscription.rejected {
            tracing::error!("Error subscribing to '{}': {}", channel, error);
        }
        Ok(subscription.messages)
    }

    /// 購読ストリームが終わるまでイベントを配信し続ける
    pub async fn run(self: Arc<Self>, mut messages: BrokerStream) {
        while let Some(message) = messages.next().await {
            self.handle(message).await;
        }
        tracing::warn!("Broker subscription ended, fan-out stopped");
    }

    /// Broker から受信した 1 件のメッセージを配信する
    ///
    /// # Returns
    ///
    /// 配信したイベント。解釈できないメッセージは `None`
    pub async fn handle(&self, message: BrokerMessage) -> Option<OutboundEvent> {
        let event = self.to_event(message)?;
        match self.message_pusher.broadcast(&event).await {
            Ok(delivered) => tracing::debug!("Relayed event to {} local clients", delivered),
            Err(e) => tracing::warn!("Failed to relay event: {}", e),
        }
        Some(event)
    }

    fn to_event(&self, message: BrokerMessage) -> Option<OutboundEvent> {
        match RelayChannel::from_name(&message.channel) {
            Some(RelayChannel::CountUpdates) => match ConnectionCount::parse(&message.payload) {
                Some(count) => Some(OutboundEvent::CountUpdate(count)),
                None => {
                    tracing::warn!("Ignoring malformed count update: {:?}", message.payload);
                    None
                }
            },
            Some(RelayChannel::NewMessages) => Some(OutboundEvent::NewMessage(
                RelayEnvelope::stamp(message.payload, self.clock.as_ref(), self.origin_port),
            )),
            None => {
                tracing::debug!("Ignoring message on unknown channel '{}'", message.channel);
                None
            }
        }
    }
}
