//! # Command Module Unit Tests / Command 模块单元测试
//!
//! Tests for `spawn_and_capture` and command line parsing in `infra::command`.
//!
//! 测试 `infra::command` 中的 `spawn_and_capture` 和命令行解析。

use netprobe::infra::command::{parse_command_line, run_command_line, spawn_and_capture};
use tokio::process::Command;

#[cfg(test)]
mod spawn_and_capture_tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; echo world"]);

        let out = spawn_and_capture(cmd).await.unwrap();

        assert!(out.success());
        assert_eq!(out.output, "hello\nworld\n");
    }

    #[tokio::test]
    async fn test_captures_stderr_and_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo oops >&2; exit 3"]);

        let out = spawn_and_capture(cmd).await.unwrap();

        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
        assert!(out.output.contains("oops"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_keeps_remaining_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'first\\n\\377bad\\nlast line\\n'"]);

        let out = spawn_and_capture(cmd).await.unwrap();

        assert!(out.success());
        assert!(out.output.starts_with("first\n"));
        assert!(out.output.contains("\u{FFFD}bad\n"));
        assert!(out.output.ends_with("last line\n"));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let cmd = Command::new("/nonexistent/netprobe-helper");
        assert!(spawn_and_capture(cmd).await.is_err());
    }
}

#[cfg(test)]
mod command_line_tests {
    use super::*;

    #[test]
    fn test_parse_splits_shell_style() {
        let parts = parse_command_line("docker compose -f 'my lab.yml' up -d").unwrap();
        assert_eq!(parts, ["docker", "compose", "-f", "my lab.yml", "up", "-d"]);
    }

    #[test]
    fn test_parse_rejects_empty_and_unbalanced() {
        assert!(parse_command_line("   ").is_err());
        assert!(parse_command_line("echo 'unterminated").is_err());
    }

    #[tokio::test]
    async fn test_run_command_line() {
        let out = run_command_line("echo provisioned").await.unwrap();
        assert!(out.success());
        assert_eq!(out.output.trim(), "provisioned");

        let err = run_command_line("/nonexistent/compose up").await.unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/compose up"));
    }
}
