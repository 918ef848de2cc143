//! Dependency wiring shared by the binary and the integration tests.

use std::sync::Arc;

use kairo_shared::time::Clock;

use crate::{
    domain::{Broker, LocalConnectionTracker},
    infrastructure::message_pusher::WebSocketMessagePusher,
    ui::{Server, ServerOptions},
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, ReconcileShutdownUseCase,
        RelayEventsUseCase, SendMessageUseCase,
    },
};

/// Build a server instance on top of `broker`
///
/// The broker is expected to be initialized already
/// (see `InitializePresenceUseCase`).
pub fn build_server(
    broker: Arc<dyn Broker>,
    clock: Arc<dyn Clock>,
    options: ServerOptions,
) -> Server {
    // Initialize dependencies in order:
    // 1. MessagePusher / LocalConnectionTracker
    // 2. UseCases
    // 3. Server

    // 1. Create MessagePusher (WebSocket implementation) and the local connection count
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let tracker = Arc::new(LocalConnectionTracker::new());

    // 2. Create UseCases
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
        broker.clone(),
        message_pusher.clone(),
        tracker.clone(),
    ));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
        broker.clone(),
        message_pusher.clone(),
        tracker.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(broker.clone()));
    let relay_events_usecase = Arc::new(RelayEventsUseCase::new(
        broker.clone(),
        message_pusher.clone(),
        clock,
        options.port,
    ));
    let reconcile_shutdown_usecase = Arc::new(ReconcileShutdownUseCase::new(broker, tracker));

    // 3. Create the server
    Server::new(
        connect_client_usecase,
        disconnect_client_usecase,
        send_message_usecase,
        relay_events_usecase,
        reconcile_shutdown_usecase,
        message_pusher,
        options,
    )
}
