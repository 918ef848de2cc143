//! UseCase: 起動時の接続数カウンター初期化
//!
//! キーが存在しない場合のみ 0 で作成します（既存の値は上書きしない）。
//! 他のインスタンスが既に稼働している場合、その値を引き継ぎます。

use std::sync::Arc;

use crate::domain::{Broker, CONNECTION_COUNT_KEY, ConnectionCount};

use super::error::PresenceError;

/// 接続数カウンター初期化のユースケース
pub struct InitializePresenceUseCase {
    broker: Arc<dyn Broker>,
}

impl InitializePresenceUseCase {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// カウンターを初期化し、現在のグローバル接続数を返す
    pub async fn execute(&self) -> Result<ConnectionCount, PresenceError> {
        if let Some(existing) = self.broker.get(CONNECTION_COUNT_KEY).await? {
            tracing::info!("Connection count already initialized: {}", existing);
            return Ok(ConnectionCount::new(existing));
        }

        if self.broker.set_if_absent(CONNECTION_COUNT_KEY, 0).await? {
            tracing::info!("Connection count initialized to 0");
            return Ok(ConnectionCount::new(0));
        }

        // 別のインスタンスが GET と SET NX の間に作成した
        let current = self.broker.get(CONNECTION_COUNT_KEY).await?.unwrap_or(0);
        tracing::info!("Connection count initialized by another instance: {}", current);
        Ok(ConnectionCount::new(current))
    }
}
