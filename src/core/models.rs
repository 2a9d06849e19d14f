//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures shared by the test engine:
//! the record of one executed command, the tagged pass/fail outcome and the
//! per-test result that ends up in the result store.
//!
//! 此模块定义测试引擎共享的核心数据结构：
//! 单条已执行命令的记录、带标签的通过/失败结果，以及最终进入结果存储的单个测试结果。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// An immutable fact about one command executed on a node during a test.
/// 测试期间在节点上执行的一条命令的不可变记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// The node the command ran on / 命令运行所在的节点
    pub node: String,
    /// The command text as issued / 发出的命令文本
    pub command: String,
    /// Exit code reported by the node executor / 节点执行器报告的退出码
    pub exit_code: i32,
    /// Captured stdout and stderr / 捕获的 stdout 与 stderr
    pub output: String,
    /// When the command was started / 命令开始的时间
    pub timestamp: DateTime<Local>,
    /// Wall-clock duration in seconds / 以秒为单位的耗时
    pub duration: f64,
}

impl CommandRecord {
    pub fn new(
        node: impl Into<String>,
        command: impl Into<String>,
        exit_code: i32,
        output: impl Into<String>,
        timestamp: DateTime<Local>,
        duration: Duration,
    ) -> Self {
        Self {
            node: node.into(),
            command: command.into(),
            exit_code,
            output: output.into(),
            timestamp,
            duration: duration.as_secs_f64(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Binary test status as it appears in reports.
/// 报告中出现的二元测试状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    /// CSS class used by the HTML renderer.
    pub fn css_class(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("PASS"),
            Status::Fail => f.write_str("FAIL"),
        }
    }
}

/// The outcome of one test body.
///
/// A failure always carries its message, so "status is FAIL iff an error
/// message is present" holds by construction.
///
/// 单个测试体的结果。失败总是携带其消息，
/// 因此"状态为 FAIL 当且仅当存在错误消息"在构造上成立。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail { message: String },
}

impl Outcome {
    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Fail {
            message: message.into(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Outcome::Pass => Status::Pass,
            Outcome::Fail { .. } => Status::Fail,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail { message } => Some(message),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

impl<E: fmt::Display> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Outcome::Pass,
            Err(e) => Outcome::fail(e.to_string()),
        }
    }
}

/// Extra information attached to a test result.
/// 附加到测试结果的额外信息。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestDetails {
    /// Every command the test issued, in execution order.
    /// 测试发出的每条命令，按执行顺序排列。
    pub command_logs: Vec<CommandRecord>,
}

/// The final, immutable result of one test.
/// 单个测试的最终不可变结果。
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub module_name: String,
    pub test_name: String,
    pub outcome: Outcome,
    pub duration: Duration,
    /// Completion time / 完成时间
    pub timestamp: DateTime<Local>,
    pub details: TestDetails,
}

impl TestResult {
    pub fn status(&self) -> Status {
        self.outcome.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.outcome.error_message()
    }

    pub fn is_pass(&self) -> bool {
        self.outcome.is_pass()
    }

    pub fn command_logs(&self) -> &[CommandRecord] {
        &self.details.command_logs
    }
}
