//! Value objects

use std::fmt;

use uuid::Uuid;

/// Identifier of one client connection on this instance
///
/// Assigned when the WebSocket opens; never shared with other instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Global connection count as reported by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConnectionCount(i64);

impl ConnectionCount {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Parse a `count-updates` payload (decimal integer, surrounding whitespace allowed)
    pub fn parse(payload: &str) -> Option<Self> {
        payload.trim().parse().ok().map(Self)
    }

    /// Encode for publishing on the `count-updates` channel
    pub fn to_payload(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ConnectionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される ConnectionId が一意である
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_count_payload() {
        // テスト項目: count-updates のペイロードが整数として解釈される
        // given (前提条件):
        let payload = " 42\n";

        // when (操作):
        let count = ConnectionCount::parse(payload);

        // then (期待する結果):
        assert_eq!(count, Some(ConnectionCount::new(42)));
    }

    #[test]
    fn test_parse_invalid_count_payload() {
        // テスト項目: 整数でないペイロードは None になる
        // given (前提条件):
        let payload = "forty-two";

        // when (操作):
        let count = ConnectionCount::parse(payload);

        // then (期待する結果):
        assert_eq!(count, None);
    }

    #[test]
    fn test_count_payload_encoding() {
        // テスト項目: ConnectionCount が10進文字列にエンコードされる
        // given (前提条件):
        let count = ConnectionCount::new(7);

        // when (操作):
        let payload = count.to_payload();

        // then (期待する結果):
        assert_eq!(payload, "7");
        assert_eq!(ConnectionCount::parse(&payload), Some(count));
    }
}
