//! Kairo chat relay server.
//!
//! Run with:
//! ```not_rust
//! REDIS_URL=redis://127.0.0.1:6379 cargo run --bin kairo-server
//! REDIS_URL=redis://127.0.0.1:6379 cargo run --bin kairo-server -- --port 3002
//! ```
//!
//! Variables can also be put in a `.env` file in the working directory.

use std::sync::Arc;

use clap::Parser;
use kairo_server::{
    app::build_server,
    config::{Args, ServerConfig, load_dotenv},
    infrastructure::broker::RedisBroker,
    ui::ServerOptions,
    usecase::InitializePresenceUseCase,
};
use kairo_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    // `.env` may also carry RUST_LOG, so load it before the logger
    let dotenv = load_dotenv();

    // Initialize tracing
    setup_logger(&[env!("CARGO_CRATE_NAME"), "kairo_shared", "tower_http"], "debug");
    match dotenv {
        Ok(Some(path)) => tracing::info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = match ServerConfig::try_from(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 1. Connect to the broker (publisher + subscriber)
    let broker = match RedisBroker::connect(&config.redis_url).await {
        Ok(broker) => Arc::new(broker),
        Err(e) => {
            tracing::error!("Failed to connect to Redis: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize the global connection count
    if let Err(e) = InitializePresenceUseCase::new(broker.clone()).execute().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    // 3. Create and run the server
    let server = build_server(
        broker,
        Arc::new(SystemClock),
        ServerOptions {
            port: config.port,
            cors_origin: config.cors_origin,
            reconcile_timeout: ServerOptions::DEFAULT_RECONCILE_TIMEOUT,
            shutdown_grace: config.shutdown_grace,
        },
    );
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
