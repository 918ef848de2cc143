//! UseCase layer
//!
//! 各ユースケースは Domain 層の trait（`Broker`, `MessagePusher`）にのみ依存します。
//!
//! - 起動時: `InitializePresenceUseCase`
//! - 接続ごと: `ConnectClientUseCase`, `SendMessageUseCase`, `DisconnectClientUseCase`
//! - インスタンスごと: `RelayEventsUseCase`（Broker → ローカルクライアント）
//! - 終了時: `ReconcileShutdownUseCase`

mod connect_client;
mod count_publisher;
mod disconnect_client;
mod error;
mod initialize_presence;
mod reconcile_shutdown;
mod relay_events;
mod send_message;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, PresenceError, ReconcileError, RelayError, SendMessageError};
pub use initialize_presence::InitializePresenceUseCase;
pub use reconcile_shutdown::{ReconcileReport, ReconcileShutdownUseCase};
pub use relay_events::RelayEventsUseCase;
pub use send_message::SendMessageUseCase;
