//! UseCase: クライアント接続処理
//!
//! ## 処理の流れ
//!
//! 1. シャットダウン補正済みなら接続を拒否
//! 2. MessagePusher に登録（自分自身の count-update も受け取れるように）
//! 3. グローバル接続数を INCR
//! 4. ローカル接続数に登録し、操作後の値を count-updates に publish
//!
//! ローカル接続数への登録は INCR が反映された後に行います。INCR の完了前に
//! 補正処理が走っても、この接続は差し引かれません。INCR の完了後に登録が
//! 拒否された場合は DECR で取り消し、接続を拒否します。
//!
//! INCR に失敗した接続は「カウント対象外」として扱い、ローカル接続数にも登録しません。
//! 切断時にも DECR しないため、グローバル接続数との整合性が保たれます。

use std::sync::Arc;

use crate::domain::{
    Broker, CONNECTION_COUNT_KEY, ConnectionCount, ConnectionId, LocalConnectionTracker,
    MessagePusher, PresenceTicket, PusherChannel,
};

use super::{count_publisher::publish_count, error::ConnectError};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    broker: Arc<dyn Broker>,
    message_pusher: Arc<dyn MessagePusher>,
    tracker: Arc<LocalConnectionTracker>,
}

impl ConnectClientUseCase {
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

    /// クライアント接続を実行
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceTicket)` - 接続成功。切断時に `DisconnectClientUseCase` へ渡す
    /// * `Err(ConnectError::ShuttingDown)` - シャットダウン補正済みのため拒否
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<PresenceTicket, ConnectError> {
        // 1. シャットダウン補正済みならカウンターに触れずに拒否
        if self.tracker.is_drained() {
            return Err(ConnectError::ShuttingDown);
        }

        // 2. MessagePusher にクライアントを登録
        self.message_pusher
            .register_client(connection_id, sender)
            .await;

        // 3. グローバル接続数を INCR
        let new_count = match self.broker.incr(CONNECTION_COUNT_KEY).await {
            Ok(new_count) => ConnectionCount::new(new_count),
            Err(e) => {
                tracing::warn!(
                    "Failed to increment connection count for '{}': {}",
                    connection_id,
                    e
                );
                return Ok(PresenceTicket::new(connection_id, false));
            }
        };

        // 4. ローカル接続数に登録
        if !self.tracker.register() {
            self.message_pusher.unregister_client(&connection_id).await;
            self.revert_increment(connection_id).await;
            return Err(ConnectError::ShuttingDown);
        }

        tracing::info!(
            "Connection '{}' counted, global connection count is {}",
            connection_id,
            new_count
        );
        publish_count(self.broker.as_ref(), new_count).await;

        Ok(PresenceTicket::new(connection_id, true))
    }

    /// 補正処理と入れ違いになった INCR を取り消す
    async fn revert_increment(&self, connection_id: ConnectionId) {
        match self.broker.decr(CONNECTION_COUNT_KEY).await {
            Ok(new_count) => {
                let new_count = ConnectionCount::new(new_count);
                tracing::info!(
                    "Connection '{}' refused during shutdown, global connection count is {}",
                    connection_id,
                    new_count
                );
                publish_count(self.broker.as_ref(), new_count).await;
            }
            Err(e) => tracing::warn!(
                "Failed to revert increment for '{}', global connection count overstated by 1: {}",
                connection_id,
                e
            ),
        }
    }
}
