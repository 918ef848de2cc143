//! Shared state of the HTTP/WebSocket handlers.

use std::sync::Arc;

use crate::usecase::{ConnectClientUseCase, DisconnectClientUseCase, SendMessageUseCase};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// このインスタンスのポート（ヘルスチェックで返す）
    pub port: u16,
}
