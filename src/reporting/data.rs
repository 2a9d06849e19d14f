//! # Report Data Module / 报告数据模块
//!
//! The fixed data shape handed to report renderers, and the aggregation that
//! produces it: totals, pass/fail counts and success rates, overall and per
//! module.
//!
//! 交给报告渲染器的固定数据结构及其聚合逻辑：
//! 总数、通过/失败计数和成功率（整体与按模块）。

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;

use crate::core::models::{TestDetails, TestResult};

/// Overall counters of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// Percentage with one fractional digit, e.g. `"66.7"`.
    pub success_rate: String,
    pub total_modules: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: String,
}

/// One test, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestView {
    pub name: String,
    pub status: String,
    /// Seconds with two fractional digits.
    pub duration: String,
    pub timestamp: String,
    pub error_message: Option<String>,
    pub details: TestDetails,
    pub status_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleReport {
    pub stats: ModuleStats,
    pub tests: Vec<TestView>,
}

/// Everything a renderer needs.
/// 渲染器所需的全部数据。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub execution_id: String,
    /// Time the data was assembled / 数据组装的时间
    pub timestamp: String,
    pub summary: RunSummary,
    pub modules: IndexMap<String, ModuleReport>,
}

/// `passed / total * 100` with one fractional digit; `"0.0"` when `total` is 0.
pub fn success_rate(passed: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", passed as f64 / total as f64 * 100.0)
}

const DISPLAY_TIME: &str = "%Y-%m-%d %H:%M:%S";

impl ReportData {
    pub fn build(
        execution_id: &str,
        results: &IndexMap<String, Vec<TestResult>>,
        rendered_at: DateTime<Local>,
    ) -> Self {
        let modules: IndexMap<String, ModuleReport> = results
            .iter()
            .map(|(name, tests)| (name.clone(), ModuleReport::build(tests)))
            .collect();

        let total_tests: usize = modules.values().map(|m| m.stats.total).sum();
        let passed_tests: usize = modules.values().map(|m| m.stats.passed).sum();

        Self {
            execution_id: execution_id.to_string(),
            timestamp: rendered_at.format(DISPLAY_TIME).to_string(),
            summary: RunSummary {
                total_tests,
                passed_tests,
                failed_tests: total_tests - passed_tests,
                success_rate: success_rate(passed_tests, total_tests),
                total_modules: modules.len(),
            },
            modules,
        }
    }
}

impl ModuleReport {
    fn build(tests: &[TestResult]) -> Self {
        let total = tests.len();
        let passed = tests.iter().filter(|t| t.is_pass()).count();
        Self {
            stats: ModuleStats {
                total,
                passed,
                failed: total - passed,
                success_rate: success_rate(passed, total),
            },
            tests: tests.iter().map(TestView::from).collect(),
        }
    }
}

impl From<&TestResult> for TestView {
    fn from(r: &TestResult) -> Self {
        let status = r.status();
        Self {
            name: r.test_name.clone(),
            status: status.to_string(),
            duration: format!("{:.2}", r.duration.as_secs_f64()),
            timestamp: r.timestamp.format(DISPLAY_TIME).to_string(),
            error_message: r.error_message().map(str::to_string),
            details: r.details.clone(),
            status_class: status.css_class(),
        }
    }
}
