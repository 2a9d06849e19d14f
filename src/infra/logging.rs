//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `NETPROBE_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `warn`
//!
//! Logs go to STDERR so the console report on stdout stays readable.
//!
//! 日志输出到 STDERR，使 stdout 上的控制台报告保持可读。

use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable consulted when no CLI level is given.
pub const LOG_ENV: &str = "NETPROBE_LOG";

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logging(cli_level: Option<&str>) {
    let level = cli_level
        .and_then(parse_level_str)
        .or_else(|| {
            std::env::var(LOG_ENV)
                .ok()
                .and_then(|s| parse_level_str(&s))
        })
        .unwrap_or(Level::WARN);

    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level_str("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level_str(" warning "), Some(Level::WARN));
        assert_eq!(parse_level_str("loud"), None);
    }
}
