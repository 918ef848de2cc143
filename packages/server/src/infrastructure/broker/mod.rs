//! `Broker` の実装
//!
//! - `redis`: 本番用。Redis の publisher 接続と subscriber 接続を分けて保持
//! - `inmemory`: 単一プロセス内で完結するブローカー。複数インスタンスを再現するテストで使用

pub mod inmemory;
pub mod redis;

pub use inmemory::InMemoryBroker;
pub use redis::RedisBroker;
