//! Infrastructure layer
//!
//! Domain 層の trait（`Broker`, `MessagePusher`）の具体的な実装と、
//! クライアントとの通信で使う DTO を提供します。

pub mod broker;
pub mod dto;
pub mod message_pusher;
