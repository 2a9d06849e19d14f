//! # Reporting Module / 报告模块
//!
//! This module handles the generation and display of test reports in multiple formats.
//! It provides the JSON snapshot, the styled HTML report and colorful console
//! summaries with internationalization support.
//!
//! 此模块处理多种格式的测试报告生成和显示。
//! 它提供 JSON 快照、样式化 HTML 报告和支持国际化的彩色控制台摘要。

pub mod console;
pub mod data;
pub mod html;
pub mod json;

use std::path::Path;

use crate::errors::ReportError;
use data::ReportData;

/// Turns aggregated report data into an artifact inside the execution directory.
/// 将聚合的报告数据转换为执行目录中的产物。
pub trait ReportRenderer: Send + Sync {
    /// Writes static files once, when the execution directory is created.
    fn install_assets(&self, _dir: &Path) -> Result<(), ReportError> {
        Ok(())
    }

    fn render(&self, data: &ReportData, dir: &Path) -> Result<(), ReportError>;
}

// Re-export common reporting functions
pub use console::{print_module_errors, print_summary, print_verdict};
pub use html::HtmlRenderer;
