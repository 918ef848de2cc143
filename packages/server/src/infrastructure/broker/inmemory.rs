//! InMemory Broker 実装
//!
//! Redis と同じ契約（アトミックな incr/decr、チャンネル単位の FIFO 配信）を
//! 単一プロセス内で提供します。複数の `Server` で同じインスタンスを共有すると、
//! 複数インスタンス構成を 1 プロセスで再現できます。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures_util::{StreamExt, future, stream};
use tokio::sync::{Mutex, broadcast};

use crate::domain::{Broker, BrokerError, BrokerMessage, Subscription};

const EVENT_CAPACITY: usize = 1024;

/// インメモリ Broker 実装
pub struct InMemoryBroker {
    /// キーと整数値
    values: Mutex<HashMap<String, i64>>,
    /// 全チャンネル共通の配信路（購読側でチャンネルを絞り込む）
    events: broadcast::Sender<BrokerMessage>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            values: Mutex::new(HashMap::new()),
            events,
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError> {
        Ok(self.values.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError> {
        let mut values = self.values.lock().await;
        if values.contains_key(key) {
            return Ok(false);
        }
        values.insert(key.to_string(), value);
        Ok(true)
    }

    async fn incr(&self, key: &str) -> Result<i64, BrokerError> {
        let mut values = self.values.lock().await;
        let value = values.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn decr(&self, key: &str) -> Result<i64, BrokerError> {
        let mut values = self.values.lock().await;
        let value = values.entry(key.to_string()).or_insert(0);
        *value -= 1;
        Ok(*value)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        // 購読者がいない場合の送信失敗は Redis と同様に無視
        let _ = self.events.send(BrokerMessage::new(channel, payload));
        Ok(())
    }

    async fn subscribe(&self, channels: &[&'static str]) -> Result<Subscription, BrokerError> {
        let wanted: HashSet<&'static str> = channels.iter().copied().collect();
        let receiver = self.events.subscribe();

        let messages = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => return Some((message, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Subscriber lagged, {} messages skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .filter(move |message| future::ready(wanted.contains(message.channel.as_str())))
        .boxed();

        Ok(Subscription {
            messages,
            rejected: Vec::new(),
        })
    }
}
