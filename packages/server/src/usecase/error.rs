//! UseCase errors

use thiserror::Error;

use crate::domain::BrokerError;

/// 起動時のカウンター初期化の失敗（起動失敗として扱う）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PresenceError {
    #[error("failed to initialize connection count: {0}")]
    Broker(#[from] BrokerError),
}

/// 接続処理の失敗
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("instance is shutting down")]
    ShuttingDown,
}

/// メッセージ送信の失敗
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("failed to publish message: {0}")]
    PublishFailed(#[from] BrokerError),
}

/// Fan-out Relay の購読失敗
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("failed to open subscription: {0}")]
    Subscribe(#[from] BrokerError),
}

/// 終了時のカウンター補正の失敗
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("failed to reconcile connection count: {0}")]
    Broker(#[from] BrokerError),
}
