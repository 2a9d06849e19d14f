//! # Error Taxonomy / 错误分类
//!
//! Only [`EnvironmentError`] is allowed to abort a whole run. Everything else is
//! contained at test ([`TestFailure`]) or module ([`ModuleError`]) granularity.
//!
//! 只有 [`EnvironmentError`] 可以中止整个运行。
//! 其他错误都被限制在测试（[`TestFailure`]）或模块（[`ModuleError`]）粒度内。

use std::path::PathBuf;
use thiserror::Error;

/// The run cannot start: the container runtime or its nodes are not usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("container runtime is not reachable: {0}")]
    RuntimeUnreachable(String),

    #[error("no nodes are running and provisioning was declined")]
    ProvisioningDeclined,

    #[error("failed to provision nodes: {0}")]
    ProvisioningFailed(String),

    #[error("nodes are still not running after provisioning")]
    NodesStillDown,

    #[error("tests directory not found: {}", .0.display())]
    TestsDirMissing(PathBuf),

    #[error("preflight has not passed")]
    NotReady,
}

/// Errors raised by a [`NodeExecutor`](crate::core::node::NodeExecutor).
///
/// A non-zero exit status is *not* an error here; it is reported through the
/// returned exit code so it can be logged like any other command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("Container {0} not found")]
    NodeNotFound(String),

    #[error("command `{command}` on {node} timed out after {secs}s")]
    Timeout {
        node: String,
        command: String,
        secs: u64,
    },

    #[error("container runtime error: {0}")]
    Runtime(String),
}

/// Why a test body failed. Caught at the test wrapper and turned into a FAIL result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestFailure {
    #[error("Container {0} not found")]
    NodeNotFound(String),

    #[error("{context}: {output}")]
    CommandFailed {
        context: String,
        node: String,
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("{0}")]
    Assertion(String),

    #[error("command `{command}` on {node} timed out after {secs}s")]
    Timeout {
        node: String,
        command: String,
        secs: u64,
    },

    #[error("{0}")]
    Runtime(String),
}

impl From<ExecError> for TestFailure {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::NodeNotFound(node) => TestFailure::NodeNotFound(node),
            ExecError::Timeout {
                node,
                command,
                secs,
            } => TestFailure::Timeout {
                node,
                command,
                secs,
            },
            ExecError::Runtime(msg) => TestFailure::Runtime(msg),
        }
    }
}

/// A test module could not be loaded or executed. Isolated to that module.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("test module not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read test module {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse test module {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("module `{module}` references unknown scenario `{scenario}`")]
    UnknownScenario { module: String, scenario: String },

    #[error("module `{module}` has no scenario and no default scenario is configured")]
    NoScenario { module: String },

    #[error("module `{module}`: {detail}")]
    Invalid { module: String, detail: String },

    #[error("module `{0}` was skipped because the run was interrupted")]
    Interrupted(String),
}

/// Invalid scenario configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scenario `{0}` defines no nodes")]
    EmptyScenario(String),

    #[error("scenario `{scenario}`, node `{node}`: invalid {field} `{value}`")]
    InvalidAddress {
        scenario: String,
        node: String,
        field: &'static str,
        value: String,
    },

    #[error("default scenario `{0}` is not defined")]
    UnknownDefaultScenario(String),

    #[error("container template `{0}` must contain the `{{node}}` placeholder")]
    BadContainerTemplate(String),
}

/// Failure to write report artifacts.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}
