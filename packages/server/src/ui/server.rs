//! Server execution logic.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use thiserror::Error;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    domain::MessagePusher,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, ReconcileReport, ReconcileShutdownUseCase,
        RelayEventsUseCase, SendMessageUseCase,
    },
};

use super::{
    handler::{health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Instance level options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// ポート（ヘルスチェックとメッセージのエンベロープに使用）
    pub port: u16,
    /// CORS で許可するオリジン
    pub cors_origin: HeaderValue,
    /// 終了時の接続数補正に許す最大時間
    pub reconcile_timeout: Duration,
    /// シャットダウン時の猶予期間
    pub shutdown_grace: Duration,
}

impl ServerOptions {
    pub const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(5);
}

/// WebSocket chat relay server
///
/// # Example
///
/// ```ignore
/// let server = app::build_server(broker, Arc::new(SystemClock), options);
/// server.run("0.0.0.0".to_string(), 3001).await?;
/// ```
pub struct Server {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    send_message_usecase: Arc<SendMessageUseCase>,
    /// RelayEventsUseCase（Broker からローカルクライアントへの配信）
    relay_events_usecase: Arc<RelayEventsUseCase>,
    /// ReconcileShutdownUseCase（終了時の接続数補正）
    reconcile_shutdown_usecase: Arc<ReconcileShutdownUseCase>,
    /// MessagePusher（終了時にローカルクライアントを切断するため）
    message_pusher: Arc<dyn MessagePusher>,
    options: ServerOptions,
}

impl Server {
    pub fn new(
        connect_client_usecase: Arc<ConnectClientUseCase>,
        disconnect_client_usecase: Arc<DisconnectClientUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        relay_events_usecase: Arc<RelayEventsUseCase>,
        reconcile_shutdown_usecase: Arc<ReconcileShutdownUseCase>,
        message_pusher: Arc<dyn MessagePusher>,
        options: ServerOptions,
    ) -> Self {
        Self {
            connect_client_usecase,
            disconnect_client_usecase,
            send_message_usecase,
            relay_events_usecase,
            reconcile_shutdown_usecase,
            message_pusher,
            options,
        }
    }

    /// Run the server until SIGINT/SIGTERM, then reconcile and shut down
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;

        let running = self.start(listener).await?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        shutdown_signal().await;
        running.shutdown().await;

        Ok(())
    }

    /// Start serving on `listener` and return a handle for shutdown
    ///
    /// The broker subscription is established before this returns. If it
    /// cannot be established the server still accepts connections but does
    /// not relay anything.
    pub async fn start(self, listener: TcpListener) -> Result<RunningServer, ServerError> {
        let local_addr = listener.local_addr()?;

        // 1. Fan-out Relay を起動
        let relay_task = match self.relay_events_usecase.subscribe().await {
            Ok(messages) => Some(tokio::spawn(
                self.relay_events_usecase.clone().run(messages),
            )),
            Err(e) => {
                tracing::error!("Fan-out relay is not running: {}", e);
                None
            }
        };

        // 2. ルーティング
        let app_state = Arc::new(AppState {
            connect_client_usecase: self.connect_client_usecase,
            disconnect_client_usecase: self.disconnect_client_usecase,
            send_message_usecase: self.send_message_usecase,
            port: self.options.port,
        });
        let cors = CorsLayer::new()
            .allow_origin(self.options.cors_origin.clone())
            .allow_methods([Method::GET, Method::POST])
            .allow_credentials(true);
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/healthcheck", get(health_check))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // 3. サーバーを起動
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });
        tracing::info!("Kairo relay listening on {}", local_addr);

        Ok(RunningServer {
            local_addr,
            shutdown_tx,
            server_task,
            relay_task,
            reconcile_shutdown_usecase: self.reconcile_shutdown_usecase,
            message_pusher: self.message_pusher,
            reconcile_timeout: self.options.reconcile_timeout,
            shutdown_grace: self.options.shutdown_grace,
        })
    }
}

/// Handle of a started server
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    server_task: JoinHandle<std::io::Result<()>>,
    relay_task: Option<JoinHandle<()>>,
    reconcile_shutdown_usecase: Arc<ReconcileShutdownUseCase>,
    message_pusher: Arc<dyn MessagePusher>,
    reconcile_timeout: Duration,
    shutdown_grace: Duration,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shut the instance down
    ///
    /// 1. ローカル接続数をグローバル接続数から差し引く（`reconcile_timeout` まで）
    /// 2. ローカルクライアントを切断
    /// 3. graceful shutdown と猶予期間を競わせ、先に終わった方で終了
    pub async fn shutdown(self) -> Option<ReconcileReport> {
        tracing::info!("Shutting down, reconciling connection count");
        let report = match tokio::time::timeout(
            self.reconcile_timeout,
            self.reconcile_shutdown_usecase.execute(),
        )
        .await
        {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                tracing::error!("Connection count left unreconciled: {}", e);
                None
            }
            Err(_) => {
                tracing::error!(
                    "Connection count reconciliation timed out after {:?}",
                    self.reconcile_timeout
                );
                None
            }
        };

        let closed = self.message_pusher.unregister_all().await;
        tracing::info!("Closing {} local connections", closed);

        let _ = self.shutdown_tx.send(());
        let mut server_task = self.server_task;
        wait_for_server(&mut server_task, self.shutdown_grace).await;

        if let Some(relay_task) = self.relay_task {
            relay_task.abort();
        }

        report
    }
}

/// graceful shutdown の完了を猶予期間まで待つ
///
/// 猶予期間が先に過ぎた場合はサーバータスクを中断し、`false` を返します。
async fn wait_for_server(
    server_task: &mut JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> bool {
    match tokio::time::timeout(grace, &mut *server_task).await {
        Ok(Ok(Ok(()))) => tracing::info!("Server shutdown complete"),
        Ok(Ok(Err(e))) => tracing::error!("Server error: {}", e),
        Ok(Err(e)) => tracing::error!("Server task failed: {}", e),
        Err(_) => {
            tracing::warn!("Grace period of {:?} elapsed, forcing shutdown", grace);
            server_task.abort();
            return false;
        }
    }
    true
}
