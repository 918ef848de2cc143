//! WebSocket chat relay server.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{RunningServer, Server, ServerError, ServerOptions};
pub use signal::shutdown_signal;
