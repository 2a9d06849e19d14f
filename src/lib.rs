//! # Netprobe Library / Netprobe 库
//!
//! Orchestrates black-box network tests against containerized nodes: runs
//! probes inside the containers, records every command issued, aggregates
//! pass/fail outcomes per test and per module and persists a report.
//!
//! 针对容器化节点编排黑盒网络测试：在容器内运行探测、记录每条执行的命令、
//! 按测试和模块聚合通过/失败结果并持久化报告。
//!
//! ## Modules / 模块
//!
//! - `core` - Command log, test execution, result store, checks and the run orchestrator
//! - `infra` - Process execution, docker runtime, file system helpers and logging
//! - `reporting` - JSON snapshot, HTML report and console summary
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 命令日志、测试执行、结果存储、检查和运行编排
//! - `infra` - 进程执行、docker 运行时、文件系统辅助函数和日志
//! - `reporting` - JSON 快照、HTML 报告和控制台摘要
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod errors;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::models;
pub use core::orchestrator;

/// Picks the best available locale for `requested`, or for the system locale
/// when nothing is requested. Tries the full tag (e.g. "zh-CN"), then the
/// language part (e.g. "en" from "en-US"), then falls back to "en".
///
/// 为 `requested`（未指定时为系统语言）选择最合适的可用语言。
pub fn resolve_locale(requested: Option<&str>) -> String {
    let locale = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split(['-', '_'])
        .next()
        .and_then(|lang| {
            available_locales
                .iter()
                .find(|available| available.split('-').next() == Some(lang))
        })
        .map(|found| found.to_string())
        .unwrap_or_else(|| "en".to_string())
}

/// Resolves and activates the UI locale. Returns the locale in use.
pub fn init(requested: Option<&str>) -> String {
    let lang = resolve_locale(requested);
    rust_i18n::set_locale(&lang);
    lang
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
