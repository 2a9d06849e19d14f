//! # Core Module / 核心模块
//!
//! The test execution and result aggregation engine: command logs, the test
//! execution wrapper, the result store, test modules and checks, and the run
//! orchestrator.
//!
//! 测试执行与结果聚合引擎：命令日志、测试执行包装器、结果存储、
//! 测试模块与检查，以及运行编排器。

pub mod checks;
pub mod command_log;
pub mod config;
pub mod execution;
pub mod models;
pub mod node;
pub mod orchestrator;
pub mod store;
pub mod suite;

// Re-exports
pub use command_log::{CaptureHandle, CommandLogStore};
pub use config::NetprobeConfig;
pub use execution::{TestContext, TestRunner};
pub use models::{CommandRecord, Outcome, Status, TestResult};
pub use node::{ExecOutput, NodeExecutor, RuntimeStatus};
pub use orchestrator::{Orchestrator, RunOptions, RunReport, RunState};
pub use store::ResultStore;
