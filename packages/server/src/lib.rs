//! Kairo chat relay library.
//!
//! Any number of server instances accept WebSocket clients, share one global
//! connection count and relay chat messages to each other through a shared
//! broker (Redis).

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod app;
pub mod config;
