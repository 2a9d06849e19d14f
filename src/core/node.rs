//! # Node Seams / 节点接口
//!
//! The engine talks to the container runtime only through these two traits.
//! `infra::docker` provides the real implementations; tests use scripted fakes.
//!
//! 引擎只通过这两个 trait 与容器运行时交互。

use async_trait::async_trait;

use crate::errors::ExecError;

/// Exit code and combined output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub output: String,
}

impl ExecOutput {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a shell command inside a named node.
///
/// Must distinguish a missing node ([`ExecError::NodeNotFound`]) from a command
/// that ran and failed (`Ok` with a non-zero exit code).
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(&self, node: &str, command: &str) -> Result<ExecOutput, ExecError>;
}

/// Health and provisioning of the container runtime itself.
#[async_trait]
pub trait RuntimeStatus: Send + Sync {
    /// Whether the runtime daemon answers at all.
    async fn is_reachable(&self) -> bool;

    /// Names of the containers that are currently running.
    async fn list_running_nodes(&self) -> Vec<String>;

    /// Brings the test nodes up. Calling it while they are already up is harmless.
    async fn bring_up(&self) -> anyhow::Result<()>;
}
