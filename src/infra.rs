//! # Infrastructure Module / 基础设施模块
//!
//! Process execution, the docker runtime, file system helpers, logging and
//! terminal prompts.
//!
//! 进程执行、docker 运行时、文件系统辅助函数、日志和终端提示。

pub mod command;
pub mod docker;
pub mod fs;
pub mod logging;
pub mod prompt;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
