//! MessagePusher trait 定義
//!
//! ローカルに接続しているクライアントへのイベント通知インターフェース。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{entity::OutboundEvent, error::MessagePushError, value_object::ConnectionId};

/// クライアントへのメッセージ送信用チャンネル（エンコード済みフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ローカルクライアントへの通知
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 全クライアントを登録解除し、解除した数を返す
    ///
    /// sender が破棄されるため、各接続の送信ループは終了します。
    async fn unregister_all(&self) -> usize;

    /// このインスタンスに接続している全クライアントへ送信し、送信できた数を返す
    ///
    /// 一部のクライアントへの送信失敗は許容します。
    async fn broadcast(&self, event: &OutboundEvent) -> Result<usize, MessagePushError>;
}
