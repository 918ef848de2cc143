//! UseCase: メッセージ送信処理
//!
//! クライアントから受け取ったテキストを new-messages チャンネルに 1 回だけ publish します。
//! 送信者自身も含め、全インスタンスのクライアントへの配信は Broker 経由の
//! `RelayEventsUseCase` が行います（送信者へのエコーを特別扱いしない）。

use std::sync::Arc;

use crate::domain::{Broker, RelayChannel};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    broker: Arc<dyn Broker>,
}

impl SendMessageUseCase {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `message` - クライアントから受け取ったテキスト（そのまま publish する）
    pub async fn execute(&self, message: &str) -> Result<(), SendMessageError> {
        self.broker
            .publish(RelayChannel::NewMessages.name(), message)
            .await?;
        tracing::debug!("Published message ({} bytes)", message.len());
        Ok(())
    }
}
