//! # Process Execution / 进程执行
//!
//! Spawns external programs (the container runtime CLI, provisioning commands)
//! and captures their combined output.
//!
//! 派生外部程序（容器运行时 CLI、部署命令）并捕获其合并输出。

use anyhow::{Context, Result};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::infra::t;

/// Exit status and interleaved stdout/stderr of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// `-1` when the process was killed by a signal / 被信号终止时为 `-1`
    pub exit_code: i32,
    pub output: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Spawns a command and captures stdout and stderr into one string.
/// Both streams are read concurrently, line by line.
///
/// 派生一个命令，并将 stdout 和 stderr 捕获到一个字符串中。
/// 两个流逐行并发读取。
pub async fn spawn_and_capture(mut cmd: Command) -> std::io::Result<CapturedOutput> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other(t!("command.capture_stdout_failed").to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other(t!("command.capture_stderr_failed").to_string()))?;

    let output = Arc::new(tokio::sync::Mutex::new(String::new()));
    let stdout_handle = tokio::spawn(collect_lines(stdout, Arc::clone(&output)));
    let stderr_handle = tokio::spawn(collect_lines(stderr, Arc::clone(&output)));

    let status = child.wait().await?;

    // Readers must finish before the buffer is taken.
    for handle in [stdout_handle, stderr_handle] {
        if let Err(e) = handle.await {
            warn!(error = %e, "failed to join output reader");
        }
    }

    let output = output.lock().await.clone();
    Ok(CapturedOutput {
        exit_code: status.code().unwrap_or(-1),
        output,
    })
}

/// Lines are read as raw bytes; invalid UTF-8 is replaced, never dropped.
async fn collect_lines<R>(stream: R, sink: Arc<tokio::sync::Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                let mut sink = sink.lock().await;
                sink.push_str(&String::from_utf8_lossy(&buf));
                sink.push('\n');
            }
            Err(e) => {
                warn!(error = %e, "failed to read process output");
                break;
            }
        }
    }
}

/// Expands `~` and `$VARS` in a command line and splits it shell-style.
pub fn parse_command_line(line: &str) -> Result<Vec<String>> {
    let expanded = shellexpand::full(line)
        .with_context(|| format!("Failed to expand command: {line}"))?
        .to_string();
    let parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse command: {expanded}"))?;
    if parts.is_empty() {
        anyhow::bail!("Empty command after parsing.");
    }
    Ok(parts)
}

/// Runs a user-configured command line, e.g. the provisioning command.
pub async fn run_command_line(line: &str) -> Result<CapturedOutput> {
    let parts = parse_command_line(line)?;
    debug!(command = line, "running command line");

    let mut cmd = Command::new(&parts[0]);
    cmd.args(&parts[1..]);
    spawn_and_capture(cmd)
        .await
        .with_context(|| format!("Failed to run `{line}`"))
}
