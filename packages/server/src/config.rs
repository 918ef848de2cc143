//! Server configuration.
//!
//! Every option can be given as a command line flag, through the
//! environment or in a `.env` file. Flags take precedence over the
//! environment, and the environment over `.env`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

/// `.env` をカレントディレクトリ（または親ディレクトリ）から読み込む
///
/// 既に設定されている環境変数は上書きしません。
///
/// # Returns
///
/// 読み込んだファイルのパス。ファイルがない場合は `None`
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// 指定したパスの `.env` を読み込む。ファイルがない場合は `false`
pub fn load_dotenv_from(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "kairo-server")]
#[command(about = "Horizontally scalable WebSocket chat relay backed by Redis", long_about = None)]
pub struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Origin allowed by the CORS policy
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Redis connection URL (required)
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Grace period for in-flight connections on shutdown, in milliseconds
    #[arg(long, env = "SHUTDOWN_GRACE_MS", default_value_t = 2000)]
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("REDIS_URL is not set")]
    MissingBrokerUrl,
    #[error("invalid CORS origin '{0}'")]
    InvalidCorsOrigin(String),
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub redis_url: String,
    pub shutdown_grace: Duration,
}

impl TryFrom<Args> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let redis_url = args
            .redis_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingBrokerUrl)?;
        let cors_origin = HeaderValue::from_str(&args.cors_origin)
            .map_err(|_| ConfigError::InvalidCorsOrigin(args.cors_origin.clone()))?;

        Ok(Self {
            host: args.host,
            port: args.port,
            cors_origin,
            redis_url,
            shutdown_grace: Duration::from_millis(args.shutdown_grace_ms),
        })
    }
}
