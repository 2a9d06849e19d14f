//! # Test Execution Module / 测试执行模块
//!
//! [`TestRunner::run_test`] is the isolation boundary between one test and the
//! rest of the run: it opens the command capture, runs the body, turns any
//! failure (including a panic) into a FAIL result, drains the command log into
//! the result and hands it to the result store.
//!
//! [`TestRunner::run_test`] 是单个测试与整个运行之间的隔离边界：
//! 它开启命令捕获、运行测试体、将任何失败（包括 panic）转换为 FAIL 结果，
//! 把命令日志收入结果并交给结果存储。

use chrono::Local;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::command_log::{CaptureHandle, CommandLogStore};
use crate::core::models::{CommandRecord, Outcome, TestDetails, TestResult};
use crate::core::node::{ExecOutput, NodeExecutor};
use crate::core::store::ResultStore;
use crate::core::suite::Topology;
use crate::errors::{ExecError, TestFailure};

/// What a test body can do: run commands on nodes and assert on the results.
/// Every command goes through the test's capture handle.
///
/// 测试体可以做的事：在节点上运行命令并对结果进行断言。
#[derive(Clone)]
pub struct TestContext {
    executor: Arc<dyn NodeExecutor>,
    capture: CaptureHandle,
    topology: Arc<Topology>,
}

impl TestContext {
    pub fn new(
        executor: Arc<dyn NodeExecutor>,
        capture: CaptureHandle,
        topology: Arc<Topology>,
    ) -> Self {
        Self {
            executor,
            capture,
            topology,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn test_name(&self) -> &str {
        self.capture.test_name()
    }

    /// Runs `command` on `node` and records it. A non-zero exit is returned,
    /// not raised; a missing node or a timeout is raised as the matching
    /// [`TestFailure`] and not recorded.
    pub async fn exec(&self, node: &str, command: &str) -> Result<ExecOutput, TestFailure> {
        let started_at = Local::now();
        let started = Instant::now();

        let result = match self.topology.command_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.executor.execute(node, command))
                .await
                .unwrap_or_else(|_| {
                    Err(ExecError::Timeout {
                        node: node.to_string(),
                        command: command.to_string(),
                        secs: limit.as_secs(),
                    })
                }),
            None => self.executor.execute(node, command).await,
        };

        let output = result.inspect_err(|e| {
            warn!(node, command, error = %e, "command could not be executed");
        })?;

        debug!(node, command, exit_code = output.exit_code, "command finished");
        self.capture.record(CommandRecord::new(
            node,
            command,
            output.exit_code,
            output.output.clone(),
            started_at,
            started.elapsed(),
        ));
        Ok(output)
    }

    /// Like [`exec`](Self::exec) but a non-zero exit becomes
    /// [`TestFailure::CommandFailed`] with `context` as its message.
    pub async fn exec_ok(&self, node: &str, command: &str, context: &str) -> Result<String, TestFailure> {
        let out = self.exec(node, command).await?;
        if out.success() {
            Ok(out.output)
        } else {
            Err(TestFailure::CommandFailed {
                context: context.to_string(),
                node: node.to_string(),
                command: command.to_string(),
                exit_code: out.exit_code,
                output: out.output.trim().to_string(),
            })
        }
    }
}

/// Fails with `message` unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), TestFailure> {
    if condition {
        Ok(())
    } else {
        Err(TestFailure::Assertion(message.into()))
    }
}

/// Runs the tests of one module. Owns the module's command log store.
/// 运行单个模块的测试，并拥有该模块的命令日志存储。
pub struct TestRunner {
    module: String,
    logs: Arc<CommandLogStore>,
    store: Arc<ResultStore>,
    executor: Arc<dyn NodeExecutor>,
    topology: Arc<Topology>,
}

impl TestRunner {
    pub fn new(
        module: impl Into<String>,
        store: Arc<ResultStore>,
        executor: Arc<dyn NodeExecutor>,
        topology: Arc<Topology>,
    ) -> Self {
        Self {
            module: module.into(),
            logs: CommandLogStore::new(),
            store,
            executor,
            topology,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn command_log(&self) -> &Arc<CommandLogStore> {
        &self.logs
    }

    /// Runs one named test and returns its result. Never fails: every error,
    /// including a panic in `body`, becomes a FAIL result. The result is also
    /// added to the result store; a persistence error is only logged.
    pub async fn run_test<F, Fut>(&self, name: &str, body: F) -> TestResult
    where
        F: FnOnce(TestContext) -> Fut,
        Fut: Future<Output = Result<(), TestFailure>>,
    {
        info!(module = %self.module, test = name, "running test");
        let started = Instant::now();
        let capture = self.logs.start_capture(name);
        let ctx = TestContext::new(Arc::clone(&self.executor), capture, Arc::clone(&self.topology));

        let outcome = match AssertUnwindSafe(async move { body(ctx).await })
            .catch_unwind()
            .await
        {
            Ok(result) => Outcome::from(result),
            Err(payload) => Outcome::fail(panic_message(payload.as_ref())),
        };

        let duration = started.elapsed();
        let command_logs = self.logs.drain(name);

        if let Some(message) = outcome.error_message() {
            warn!(module = %self.module, test = name, error = message, "test failed");
        }

        let result = TestResult {
            module_name: self.module.clone(),
            test_name: name.to_string(),
            outcome,
            duration,
            timestamp: Local::now(),
            details: TestDetails { command_logs },
        };

        if let Err(e) = self.store.add_result(&self.module, result.clone()) {
            error!(module = %self.module, test = name, error = %e, "failed to persist test result");
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("test panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("test panicked: {s}")
    } else {
        "test panicked".to_string()
    }
}
