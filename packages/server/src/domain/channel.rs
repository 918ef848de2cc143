//! Broker key and channel names shared by every instance.

/// Key holding the global connection count
pub const CONNECTION_COUNT_KEY: &str = "chat:connection-count";

/// Logical pub/sub channels used by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayChannel {
    /// Carries the post-operation global count as a decimal string
    CountUpdates,
    /// Carries raw chat text
    NewMessages,
}

impl RelayChannel {
    pub const ALL: [RelayChannel; 2] = [RelayChannel::CountUpdates, RelayChannel::NewMessages];

    pub const fn name(self) -> &'static str {
        match self {
            RelayChannel::CountUpdates => "chat:connection-count-updated",
            RelayChannel::NewMessages => "chat:new-message",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.name() == name)
    }

    /// Names of every relay channel, in subscription order
    pub fn all_names() -> [&'static str; 2] {
        Self::ALL.map(RelayChannel::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_resolves_known_channels() {
        // テスト項目: チャンネル名から RelayChannel が解決される
        // given (前提条件):
        let names = RelayChannel::all_names();

        // when (操作):
        let resolved: Vec<_> = names.iter().filter_map(|n| RelayChannel::from_name(n)).collect();

        // then (期待する結果):
        assert_eq!(resolved, RelayChannel::ALL.to_vec());
    }

    #[test]
    fn test_from_name_rejects_unknown_channel() {
        // テスト項目: 未知のチャンネル名は None になる
        // given (前提条件):
        let name = "chat:unknown";

        // when (操作):
        let resolved = RelayChannel::from_name(name);

        // then (期待する結果):
        assert_eq!(resolved, None);
    }
}
