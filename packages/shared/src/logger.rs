//! Logging setup for Kairo binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given targets.
///
/// Crate names containing `-` are normalized to their `_` module path form so
/// that `kairo-server` and `kairo_server` both match the tracing target.
pub fn default_directive(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber.
///
/// The filter can be overridden with `RUST_LOG`; otherwise every target in
/// `targets` logs at `default_log_level` and everything else is silent.
///
/// # Examples
///
/// ```no_run
/// use kairo_shared::logger::setup_logger;
///
/// setup_logger(&["kairo-server", "tower_http"], "debug");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_normalizes_crate_names() {
        // テスト項目: ハイフンを含むクレート名がモジュールパス形式に変換される
        // given (前提条件):
        let targets = ["kairo-server", "tower_http"];

        // when (操作):
        let directive = default_directive(&targets, "info");

        // then (期待する結果):
        assert_eq!(directive, "kairo_server=info,tower_http=info");
    }

    #[test]
    fn test_default_directive_with_no_targets() {
        // テスト項目: ターゲットが空の場合、空のディレクティブになる
        // given (前提条件):
        let targets: [&str; 0] = [];

        // when (操作):
        let directive = default_directive(&targets, "debug");

        // then (期待する結果):
        assert!(directive.is_empty());
    }
}
