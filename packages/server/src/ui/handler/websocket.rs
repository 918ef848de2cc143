//! WebSocket connection handlers.
//!
//! 1 接続につき受信タスクと送信タスクを 1 つずつ起動し、どちらかが終了した時点で
//! 切断処理を行います。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::ConnectionId,
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::ConnectError,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that pushes encoded frames from the rx channel to the WebSocket sender.
///
/// The task ends when the client goes away or when the pusher drops the
/// channel (shutdown), in which case a close frame is sent first.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AWAY,
                reason: Utf8Bytes::from_static("server is shutting down"),
            })))
            .await;
    })
}

/// Spawns a task that forwards `new-message` events from the client to the broker.
fn receiver_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::NewMessage(payload)) => {
                        tracing::debug!("Received message from '{}'", connection_id);
                        if let Err(e) = state.send_message_usecase.execute(&payload.message).await
                        {
                            tracing::warn!("Failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring unparsable frame from '{}': {}", connection_id, e);
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (mut sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // 1. 接続処理（INCR + count-updates への publish）
    let ticket = match state
        .connect_client_usecase
        .execute(connection_id, tx)
        .await
    {
        Ok(ticket) => ticket,
        Err(ConnectError::ShuttingDown) => {
            tracing::info!("Refusing connection '{}': shutting down", connection_id);
            let _ = sender
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AWAY,
                    reason: Utf8Bytes::from_static("server is shutting down"),
                })))
                .await;
            return;
        }
    };
    tracing::info!("Client '{}' connected", connection_id);

    // 2. 送受信タスクを起動し、どちらかが終了したらもう一方を止める
    let mut recv_task = receiver_loop(receiver, state.clone(), connection_id);
    let mut send_task = pusher_loop(rx, sender);
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 3. 切断処理（DECR + count-updates への publish）
    match state.disconnect_client_usecase.execute(ticket).await {
        Some(count) => tracing::info!(
            "Client '{}' disconnected, global connection count is {}",
            connection_id,
            count
        ),
        None => tracing::info!("Client '{}' disconnected", connection_id),
    }
}
