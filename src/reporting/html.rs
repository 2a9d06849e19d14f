//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders the human-readable report: summary counters, one
//! section per module and, for every test, a collapsible panel with its error
//! message and full command log.
//!
//! 此模块渲染人类可读的报告：汇总计数、每个模块一个区块，
//! 以及每个测试一个可折叠面板，展示错误消息和完整的命令日志。

use maud::{DOCTYPE, Markup, html};
use std::path::Path;

use crate::errors::ReportError;
use crate::infra::fs::write_atomic;
use crate::infra::t;
use crate::reporting::ReportRenderer;
use crate::reporting::data::{ModuleReport, ReportData, TestView};

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Embedded JavaScript for HTML report interactivity / HTML 报告交互性的嵌入式 JavaScript
const HTML_SCRIPT: &str = include_str!("assets/report.js");

pub const HTML_FILE: &str = "test_report.html";
pub const CSS_FILE: &str = "report.css";
pub const JS_FILE: &str = "report.js";

/// Writes `test_report.html` plus its static assets.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    locale: String,
}

impl HtmlRenderer {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    /// Builds the report markup.
    ///
    /// 生成报告标记。
    pub fn render_markup(&self, data: &ReportData) -> Markup {
        let locale = self.locale.as_str();
        let title = t!("html_report.title", locale = locale).to_string();
        let summary = &data.summary;

        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (title) }
                    link rel="stylesheet" href=(CSS_FILE);
                }
                body {
                    header {
                        h1 { (title) }
                        p.meta {
                            (t!("html_report.execution", locale = locale, id = &data.execution_id).to_string())
                            " · "
                            (t!("html_report.generated_at", locale = locale, time = &data.timestamp).to_string())
                        }
                    }
                    div.summary-container {
                        (summary_item(summary.total_tests.to_string(), "", &t!("html_report.summary.total", locale = locale)))
                        (summary_item(summary.passed_tests.to_string(), "passed-text", &t!("html_report.summary.passed", locale = locale)))
                        (summary_item(summary.failed_tests.to_string(), "failed-text", &t!("html_report.summary.failed", locale = locale)))
                        (summary_item(format!("{}%", summary.success_rate), "", &t!("html_report.summary.success_rate", locale = locale)))
                        (summary_item(summary.total_modules.to_string(), "", &t!("html_report.summary.modules", locale = locale)))
                    }
                    @if data.modules.is_empty() {
                        p.empty { (t!("html_report.no_tests", locale = locale).to_string()) }
                    }
                    @for (name, module) in &data.modules {
                        (self.render_module(name, module))
                    }
                    script src=(JS_FILE) {}
                }
            }
        }
    }

    fn render_module(&self, name: &str, module: &ModuleReport) -> Markup {
        let locale = self.locale.as_str();
        let stats = &module.stats;
        html! {
            section.module {
                h2 {
                    (name)
                    span.module-stats {
                        (t!(
                            "html_report.module_stats",
                            locale = locale,
                            passed = stats.passed,
                            total = stats.total,
                            rate = &stats.success_rate
                        ).to_string())
                    }
                }
                @for test in &module.tests {
                    (self.render_test(test))
                }
            }
        }
    }

    fn render_test(&self, test: &TestView) -> Markup {
        let locale = self.locale.as_str();
        html! {
            div class={ "test " (test.status_class) } {
                div.test-header {
                    span.chevron { "▶" }
                    span.test-name { (test.name) }
                    span class={ "status-cell " (test.status_class) } { (test.status) }
                    span.duration-cell { (test.duration) "s" }
                    span.timestamp { (test.timestamp) }
                }
                div.test-details {
                    @if let Some(message) = &test.error_message {
                        pre.error-message { (message) }
                    }
                    @if test.details.command_logs.is_empty() {
                        p.empty { (t!("html_report.no_commands", locale = locale).to_string()) }
                    } @else {
                        table.command-log {
                            thead {
                                tr {
                                    th { (t!("html_report.table.node", locale = locale).to_string()) }
                                    th { (t!("html_report.table.command", locale = locale).to_string()) }
                                    th { (t!("html_report.table.exit_code", locale = locale).to_string()) }
                                    th { (t!("html_report.table.duration", locale = locale).to_string()) }
                                }
                            }
                            tbody {
                                @for cmd in &test.details.command_logs {
                                    tr class=(if cmd.succeeded() { "cmd-ok" } else { "cmd-failed" }) {
                                        td { (cmd.node) }
                                        td { code { (cmd.command) } }
                                        td.exit-code { (cmd.exit_code) }
                                        td.duration-cell { (format!("{:.3}s", cmd.duration)) }
                                    }
                                    @if !cmd.output.trim().is_empty() {
                                        tr.output-row {
                                            td colspan="4" { pre.output-content { (cmd.output) } }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn summary_item(count: String, class: &str, label: &str) -> Markup {
    html! {
        div.summary-item {
            span class={ "count " (class) } { (count) }
            span.label { (label) }
        }
    }
}

impl ReportRenderer for HtmlRenderer {
    fn install_assets(&self, dir: &Path) -> Result<(), ReportError> {
        for (file, contents) in [(CSS_FILE, HTML_STYLE), (JS_FILE, HTML_SCRIPT)] {
            let path = dir.join(file);
            write_atomic(&path, contents.as_bytes()).map_err(|e| ReportError::io(&path, e))?;
        }
        Ok(())
    }

    fn render(&self, data: &ReportData, dir: &Path) -> Result<(), ReportError> {
        let path = dir.join(HTML_FILE);
        let markup = self.render_markup(data).into_string();
        write_atomic(&path, markup.as_bytes()).map_err(|e| ReportError::io(&path, e))
    }
}
