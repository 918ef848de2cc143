//! Domain errors

use thiserror::Error;

/// Failure of a shared broker operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connection(String),

    #[error("broker command {command} failed: {reason}")]
    Command {
        command: &'static str,
        reason: String,
    },

    #[error("subscriber connection is already in use")]
    SubscriberTaken,
}

/// Failure while pushing an event to local clients
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("failed to encode event: {0}")]
    Encode(String),
}
