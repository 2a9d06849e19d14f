//! # Docker Runtime / Docker 运行时
//!
//! Real [`NodeExecutor`] and [`RuntimeStatus`] implementations that drive the
//! `docker` CLI. Node names map to container names through the configured
//! template, e.g. `node1` -> `network-test-framework-node1-1`.
//!
//! 通过 `docker` 命令行实现 [`NodeExecutor`] 与 [`RuntimeStatus`]。
//! 节点名通过配置的模板映射为容器名。

use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::config::RuntimeSettings;
use crate::core::node::{ExecOutput, NodeExecutor, RuntimeStatus};
use crate::errors::ExecError;
use crate::infra::command::{CapturedOutput, run_command_line, spawn_and_capture};

async fn docker(settings: &RuntimeSettings, args: &[&str]) -> std::io::Result<CapturedOutput> {
    let mut cmd = Command::new(&settings.docker_bin);
    cmd.args(args);
    spawn_and_capture(cmd).await
}

/// Reverses [`RuntimeSettings::container_name`].
pub fn node_of_container<'a>(settings: &RuntimeSettings, container: &'a str) -> Option<&'a str> {
    let (prefix, suffix) = settings.container_template.split_once("{node}")?;
    container
        .strip_prefix(prefix)?
        .strip_suffix(suffix)
        .filter(|node| !node.is_empty())
}

/// Executes commands with `docker exec <container> sh -c <command>`.
#[derive(Debug, Clone)]
pub struct DockerExecutor {
    settings: RuntimeSettings,
}

impl DockerExecutor {
    pub fn new(settings: RuntimeSettings) -> Self {
        Self { settings }
    }

    async fn is_running(&self, container: &str) -> Result<bool, ExecError> {
        let out = docker(
            &self.settings,
            &["inspect", "--format", "{{.State.Running}}", container],
        )
        .await
        .map_err(|e| ExecError::Runtime(e.to_string()))?;
        Ok(out.success() && out.output.trim() == "true")
    }
}

#[async_trait]
impl NodeExecutor for DockerExecutor {
    async fn execute(&self, node: &str, command: &str) -> Result<ExecOutput, ExecError> {
        let container = self.settings.container_name(node);
        if !self.is_running(&container).await? {
            return Err(ExecError::NodeNotFound(container));
        }

        debug!(%container, command, "docker exec");
        let out = docker(&self.settings, &["exec", &container, "sh", "-c", command])
            .await
            .map_err(|e| ExecError::Runtime(e.to_string()))?;
        Ok(ExecOutput::new(out.exit_code, out.output))
    }
}

/// Queries the docker daemon and provisions nodes with the configured command.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    settings: RuntimeSettings,
}

impl DockerRuntime {
    pub fn new(settings: RuntimeSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl RuntimeStatus for DockerRuntime {
    async fn is_reachable(&self) -> bool {
        match docker(&self.settings, &["info", "--format", "{{.ServerVersion}}"]).await {
            Ok(out) if out.success() => true,
            Ok(out) => {
                debug!(output = out.output.trim(), "docker info failed");
                false
            }
            Err(e) => {
                debug!(error = %e, "docker could not be started");
                false
            }
        }
    }

    async fn list_running_nodes(&self) -> Vec<String> {
        match docker(&self.settings, &["ps", "--format", "{{.Names}}"]).await {
            Ok(out) if out.success() => out
                .output
                .lines()
                .filter_map(|name| node_of_container(&self.settings, name.trim()))
                .map(str::to_string)
                .collect(),
            Ok(out) => {
                warn!(output = out.output.trim(), "docker ps failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "docker ps could not be started");
                Vec::new()
            }
        }
    }

    async fn bring_up(&self) -> Result<()> {
        info!(command = %self.settings.bring_up, "provisioning nodes");
        let out = run_command_line(&self.settings.bring_up).await?;
        if !out.success() {
            anyhow::bail!(
                "`{}` exited with code {}: {}",
                self.settings.bring_up,
                out.exit_code,
                out.output.trim()
            );
        }
        Ok(())
    }
}
