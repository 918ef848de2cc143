//! UseCase: クライアント切断処理
//!
//! ## 処理の流れ
//!
//! 1. MessagePusher から登録解除
//! 2. ローカル接続数から除外（シャットダウン補正済みなら何もしない）
//! 3. グローバル接続数を DECR し、操作後の値を count-updates に publish
//!
//! ローカル接続数からの除外を DECR より先に行うため、補正処理と並行しても
//! 同じ接続が二重に差し引かれることはありません。

use std::sync::Arc;

use crate::domain::{
    Broker, CONNECTION_COUNT_KEY, ConnectionCount, LocalConnectionTracker, MessagePusher,
    PresenceTicket,
};

use super::count_publisher::publish_count;

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    broker: Arc<dyn Broker>,
    message_pusher: Arc<dyn MessagePusher>,
    tracker: Arc<LocalConnectionTracker>,
}

impl DisconnectClientUseCase {
    pub fn new(
        broker: Arc<dyn Broker>,
        message_pusher: Arc<dyn MessagePusher>,
        tracker: Arc<LocalConnectionTracker>,
    ) -> Self {
        Self {
            broker,
            message_pusher,
            tracker,
        }
    }

    /// クライアント切断を実行
    ///
    /// # Returns
    ///
    /// DECR した場合は操作後のグローバル接続数、DECR しなかった場合は `None`
    pub async fn execute(&self, ticket: PresenceTicket) -> Option<ConnectionCount> {
        let connection_id = *ticket.connection_id();

        // 1. MessagePusher から登録解除
        self.message_pusher.unregister_client(&connection_id).await;

        if !ticket.is_counted() {
            tracing::debug!("Connection '{}' was never counted", connection_id);
            return None;
        }

        // 2. ローカル接続数から除外
        if !self.tracker.release() {
            tracing::info!(
                "Connection '{}' already compensated by shutdown reconciliation",
                connection_id
            );
            return None;
        }

        // 3. グローバル接続数を DECR
        match self.broker.decr(CONNECTION_COUNT_KEY).await {
            Ok(new_count) => {
                let new_count = ConnectionCount::new(new_count);
                tracing::info!(
                    "Connection '{}' released, global connection count is {}",
                    connection_id,
                    new_count
                );
                publish_count(self.broker.as_ref(), new_count).await;
                Some(new_count)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to decrement connection count for '{}': {}",
                    connection_id,
                    e
                );
                // グローバル接続数にはまだ含まれているため、終了時の補正対象に戻す
                if !self.tracker.register() {
                    tracing::warn!(
                        "Connection '{}' left the global count overstated by 1",
                        connection_id
                    );
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BrokerError, ConnectionId, MockBroker},
        infrastructure::{broker::InMemoryBroker, message_pusher::WebSocketMessagePusher},
        usecase::ConnectClientUseCase,
    };
    use tokio::sync::mpsc;

    struct Instance {
        connect: ConnectClientUseCase,
        disconnect: DisconnectClientUseCase,
        pusher: Arc<WebSocketMessagePusher>,
        tracker: Arc<LocalConnectionTracker>,
    }

    fn create_instance(broker: Arc<dyn Broker>) -> Instance {
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let tracker = Arc::new(LocalConnectionTracker::new());
        Instance {
            connect: ConnectClientUseCase::new(broker.clone(), pusher.clone(), tracker.clone()),
            disconnect: DisconnectClientUseCase::new(broker, pusher.clone(), tracker.clone()),
            pusher,
            tracker,
        }
    }

    async fn connect(instance: &Instance) -> PresenceTicket {
        let (tx, _rx) = mpsc::unbounded_channel();
        instance
            .connect
            .execute(ConnectionId::generate(), tx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_disconnect_decrements_counter() {
        // テスト項目: 切断時に DECR され、操作後の値が返される
        // given (前提条件):
        let broker = Arc::new(InMemoryBroker::new());
        broker.set(CONNECTION_COUNT_KEY, 0).await.unwrap();
        let instance = create_instance(broker.clone());
        let ticket = connect(&instance).await;
        let _other = connect(&instance).await;

        // when (操作):
        let result = instance.disconnect.execute(ticket).await;

        // then (期待する結果):
        assert_eq!(result, Some(ConnectionCount::new(1)));
        assert_eq!(instance.tracker.current(), 1);
        assert_eq!(instance.pusher.client_count().await, 1);
    }

    #[tokio::test]
    async fn test_matched_connect_disconnect_is_net_zero() {
        // テスト項目: 接続と切断が対になっていれば、グローバル接続数は元の値に戻り負にならない
        // given (前提条件): 既に他のインスタンスで 3 接続がある状態
        let broker = Arc::new(InMemoryBroker::new());
        broker.set(CONNECTION_COUNT_KEY, 3).await.unwrap();
        let a = create_instance(broker.clone());
        let b = create_instance(broker.clone());

        // when (操作): インスタンスをまたいで接続・切断を交互に行う
        let mut tickets = Vec::new();
        for i in 0..6 {
            let instance = if i % 2 == 0 { &a } else { &b };
            tickets.push((i % 2, connect(instance).await));
        }
        for (owner, ticket) in tickets {
            let instance = if owner == 0 { &a } else { &b };
            let count = instance.disconnect.execute(ticket).await.unwrap();
            assert!(count.value() >= 3);
        }

        // then (期待する結果):
        assert_eq!(broker.get(CONNECTION_COUNT_KEY).await.unwrap(), Some(3));
        assert_eq!(a.tracker.current(), 0);
        assert_eq!(b.tracker.current(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_after_drain_skips_decrement() {
        // テスト項目: シャットダウン補正後の切断では DECR しない（二重補正の防止）
        // given (前提条件):
        let broker = Arc::new(InMemoryBroker::new());
        broker.set(CONNECTION_COUNT_KEY, 0).await.unwrap();
        let instance = create_instance(broker.clone());
        let ticket = connect(&instance).await;
        instance.tracker.drain();

        // when (操作):
        let result = instance.disconnect.execute(ticket).await;

        // then (期待する結果):
        assert_eq!(result, None);
        assert_eq!(broker.get(CONNECTION_COUNT_KEY).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_disconnect_uncounted_connection() {
        // テスト項目: カウント対象外の接続は切断時も DECR しない
        // given (前提条件):
        let mut broker = MockBroker::new();
        broker.expect_decr().never();
        let instance = create_instance(Arc::new(broker));
        let ticket = PresenceTicket::new(ConnectionId::generate(), false);

        // when (操作):
        let result = instance.disconnect.execute(ticket).await;

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_failed_decrement_keeps_connection_for_reconciliation() {
        // テスト項目: DECR に失敗した接続はローカル接続数に戻され、終了時の補正対象になる
        // given (前提条件):
        let mut broker = MockBroker::new();
        broker.expect_incr().times(1).returning(|_| Ok(1));
        broker.expect_publish().returning(|_, _| Ok(()));
        broker
            .expect_decr()
            .times(1)
            .returning(|_| Err(BrokerError::Connection("reset".to_string())));
        let instance = create_instance(Arc::new(broker));
        let ticket = connect(&instance).await;

        // when (操作):
        let result = instance.disconnect.execute(ticket).await;

        // then (期待する結果):
        assert_eq!(result, None);
        assert_eq!(instance.tracker.current(), 1);
        assert_eq!(instance.pusher.client_count().await, 0);
    }
}
