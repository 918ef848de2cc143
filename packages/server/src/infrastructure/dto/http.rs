//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /healthcheck` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthDto {
    pub status: String,
    /// Port of the instance that answered
    pub port: u16,
}

impl HealthDto {
    pub fn ok(port: u16) -> Self {
        Self {
            status: "ok".to_string(),
            port,
        }
    }
}
