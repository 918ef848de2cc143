//! UseCase: 終了時の接続数補正
//!
//! プロセス終了前に、このインスタンスが保持している接続数 k を
//! グローバル接続数から差し引きます。
//!
//! ## 処理の流れ
//!
//! 1. ローカル接続数を取り出し、以降の増減を拒否する（drain）
//! 2. k > 0 の場合のみ、グローバル接続数 C を GET（存在しない場合は 0）
//! 3. C - k を SET（負になる場合は 0 に丸めて警告）
//! 4. 補正後の値を count-updates に publish
//!
//! drain 後に切断された接続は DECR しないため、同じ接続が二重に差し引かれることはありません。
//! GET と SET の間に他インスタンスが行った INCR/DECR は上書きされます。

use std::sync::Arc;

use crate::domain::{Broker, CONNECTION_COUNT_KEY, ConnectionCount, LocalConnectionTracker};

use super::{count_publisher::publish_count, error::ReconcileError};

/// 補正結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// グローバル接続数から差し引いた接続数
    pub removed: u64,
    /// 補正後のグローバル接続数。補正が不要だった場合は `None`
    pub corrected_count: Option<ConnectionCount>,
}

/// 終了時の接続数補正のユースケース
pub struct ReconcileShutdownUseCase {
    broker: Arc<dyn Broker>,
    tracker: Arc<LocalConnectionTracker>,
}

impl ReconcileShutdownUseCase {
    pub fn new(broker: Arc<dyn Broker>, tracker: Arc<LocalConnectionTracker>) -> Self {
        Self { broker, tracker }
    }

    pub async fn execute(&self) -> Result<ReconcileReport, ReconcileError> {
        // 1. ローカル接続数を取り出す
        let removed = self.tracker.drain();
        if removed == 0 {
            tracing::info!("No local connections to reconcile");
            return Ok(ReconcileReport {
                removed,
                corrected_count: None,
            });
        }

        // 2. グローバル接続数を取得
        let current = self.broker.get(CONNECTION_COUNT_KEY).await?.unwrap_or(0);

        // 3. 補正後の値を書き込む
        let target = current.saturating_sub(i64::try_from(removed).unwrap_or(i64::MAX));
        let corrected = if target < 0 {
            tracing::warn!(
                "Connection count {} is lower than local connections {}, clamping to 0",
                current,
                removed
            );
            ConnectionCount::new(0)
        } else {
            ConnectionCount::new(target)
        };
        self.broker
            .set(CONNECTION_COUNT_KEY, corrected.value())
            .await?;
        tracing::info!(
            "Removed {} local connections, global connection count is {}",
            removed,
            corrected
        );

        // 4. 補正後の値を通知
        publish_count(self.broker.as_ref(), corrected).await;

        Ok(ReconcileReport {
            removed,
            corrected_count: Some(corrected),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BrokerError, ConnectionId, MockBroker, RelayChannel},
        infrastructure::{broker::InMemoryBroker, message_pusher::WebSocketMessagePusher},
        usecase::{ConnectClientUseCase, ConnectError, DisconnectClientUseCase},
    };
    use futures_util::StreamExt;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ローカル接続数 k, グローバル接続数 C のとき、補正後が C - k になること
    // - k = 0 のとき Broker を操作しないこと
    // - 補正後に切断された接続が二重に差し引かれないこと
    // ========================================

    #[tokio::test]
    async fn test_reconcile_subtracts_local_connections() {
        // テスト項目: 補正後のグローバル接続数が C - k になり、その値が publish される
        // given (前提条件): グローバル 5、ローカル 2
        let broker = Arc::new(InMemoryBroker::new());
        broker.set(CONNECTION_COUNT_KEY, 5).await.unwrap();
        let tracker = Arc::new(LocalConnectionTracker::new());
        tracker.register();
        tracker.register();
        let mut subscription = broker
            .subscribe(&[RelayChannel::CountUpdates.name()])
            .await
            .unwrap();
        let usecase = ReconcileShutdownUseCase::new(broker.clone(), tracker.clone());

        // when (操作):
        let report = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(
            report,
            ReconcileReport {
                removed: 2,
                corrected_count: Some(ConnectionCount::new(3)),
            }
        );
        assert_eq!(broker.get(CONNECTION_COUNT_KEY).await.unwrap(), Some(3));
        let published = subscription.messages.next().await.unwrap();
        assert_eq!(published.payload, "3");
        assert!(tracker.is_drained());
    }

    #[tokio::test]
    async fn test_reconcile_without_local_connections_skips_broker() {
        // テスト項目: ローカル接続数が 0 の場合は Broker を一切操作しない
        // given (前提条件): 期待値を設定しない MockBroker（呼ばれるとパニック）
        let broker = MockBroker::new();
        let tracker = Arc::new(LocalConnectionTracker::new());
        let usecase = ReconcileShutdownUseCase::new(Arc::new(broker), tracker);

        // when (操作):
        let report = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(report.removed, 0);
        assert_eq!(report.corrected_count, None);
    }

    #[tokio::test]
    async fn test_reconcile_clamps_at_zero() {
        // テスト項目: C < k の場合は 0 に丸められる
        // given (前提条件): キーが存在しない（C = 0）、ローカル 3
        let broker = Arc::new(InMemoryBroker::new());
        let tracker = Arc::new(LocalConnectionTracker::new());
        for _ in 0..3 {
            tracker.register();
        }
        let usecase = ReconcileShutdownUseCase::new(broker.clone(), tracker);

        // when (操作):
        let report = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(report.corrected_count, Some(ConnectionCount::new(0)));
        assert_eq!(broker.get(CONNECTION_COUNT_KEY).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_reconcile_get_failure() {
        // テスト項目: GET に失敗した場合はエラーが返され、SET は行われない
        // given (前提条件):
        let mut broker = MockBroker::new();
        broker.expect_get().times(1).returning(|_| {
            Err(BrokerError::Command {
                command: "GET",
                reason: "connection reset".to_string(),
            })
        });
        broker.expect_set().never();
        let tracker = Arc::new(LocalConnectionTracker::new());
        tracker.register();
        let usecase = ReconcileShutdownUseCase::new(Arc::new(broker), tracker);

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert!(matches!(result, Err(ReconcileError::Broker(_))));
    }

    #[tokio::test]
    async fn test_late_disconnect_and_connect_after_reconcile() {
        // テスト項目: 補正後の切断は二重に差し引かれず、新規接続は拒否される
        // given (前提条件): 2 インスタンスで合計 3 接続（A: 2, B: 1）
        let broker = Arc::new(InMemoryBroker::new());
        broker.set(CONNECTION_COUNT_KEY, 0).await.unwrap();
        let pusher_a = Arc::new(WebSocketMessagePusher::new());
        let tracker_a = Arc::new(LocalConnectionTracker::new());
        let connect_a =
            ConnectClientUseCase::new(broker.clone(), pusher_a.clone(), tracker_a.clone());
        let disconnect_a =
            DisconnectClientUseCase::new(broker.clone(), pusher_a.clone(), tracker_a.clone());
        let connect_b = ConnectClientUseCase::new(
            broker.clone(),
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(LocalConnectionTracker::new()),
        );
        let mut tickets = Vec::new();
        for _ in 0..2 {
            let (tx, _rx) = mpsc::unbounded_channel();
            tickets.push(
                connect_a
                    .execute(ConnectionId::generate(), tx)
                    .await
                    .unwrap(),
            );
        }
        let (tx, _rx) = mpsc::unbounded_channel();
        connect_b
            .execute(ConnectionId::generate(), tx)
            .await
            .unwrap();
        let usecase = ReconcileShutdownUseCase::new(broker.clone(), tracker_a.clone());

        // when (操作): A を補正した後に A の接続が切断され、さらに A へ新規接続が来る
        usecase.execute().await.unwrap();
        for ticket in tickets {
            assert_eq!(disconnect_a.execute(ticket).await, None);
        }
        let (tx, _rx) = mpsc::unbounded_channel();
        let late = connect_a.execute(ConnectionId::generate(), tx).await;

        // then (期待する結果): B の 1 接続だけが残る
        assert_eq!(broker.get(CONNECTION_COUNT_KEY).await.unwrap(), Some(1));
        assert_eq!(late, Err(ConnectError::ShuttingDown));
        assert_eq!(pusher_a.client_count().await, 0);
    }
}
