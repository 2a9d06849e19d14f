//! # Console Reporting Module / 控制台报告模块
//!
//! Prints the final summary of a run: per-module subtotals, failed tests with
//! their error messages, module errors and the overall counters.
//!
//! 打印运行的最终摘要：按模块小计、失败测试及其错误信息、模块错误以及总体计数。

use colored::*;
use std::path::Path;

use crate::errors::ModuleError;
use crate::infra::t;
use crate::reporting::data::{ModuleReport, ReportData};

/// Prints the summary table of a run.
///
/// ```text
/// --- Test Summary ---
///   connectivity            2/2 passed  (100.0%)
///   vlan_configuration      1/2 passed   (50.0%)
///     FAIL test_vlan_isolation: VLAN isolation breach detected: ...
/// ```
pub fn print_summary(data: &ReportData, report_dir: &Path, locale: &str) {
    println!("\n{}", t!("summary.banner", locale = locale).bold());

    if data.modules.is_empty() {
        println!("  {}", t!("summary.no_tests", locale = locale).dimmed());
    }
    for (name, module) in &data.modules {
        print_module_line(name, module, locale);
    }

    let s = &data.summary;
    println!();
    println!(
        "{}",
        t!(
            "summary.totals",
            locale = locale,
            total = s.total_tests,
            passed = s.passed_tests,
            failed = s.failed_tests,
            rate = &s.success_rate,
            modules = s.total_modules
        )
    );
    println!(
        "{}",
        t!("summary.report_dir", locale = locale, path = report_dir.display()).cyan()
    );
}

fn print_module_line(name: &str, module: &ModuleReport, locale: &str) {
    let stats = &module.stats;
    let counts = t!(
        "summary.module_line",
        locale = locale,
        passed = stats.passed,
        total = stats.total
    );
    let counts = if stats.failed == 0 {
        counts.green()
    } else {
        counts.red()
    };
    println!("  {:<24} {} ({:>5}%)", name, counts, stats.success_rate);

    for test in module.tests.iter().filter(|t| t.error_message.is_some()) {
        println!(
            "    {} {}: {}",
            test.status.red(),
            test.name,
            test.error_message.as_deref().unwrap_or_default()
        );
    }
}

/// Prints modules that could not be loaded or were skipped.
pub fn print_module_errors<'a>(errors: impl IntoIterator<Item = (&'a str, &'a ModuleError)>, locale: &str) {
    let errors: Vec<_> = errors.into_iter().collect();
    if errors.is_empty() {
        return;
    }

    println!("\n{}", t!("summary.module_errors", locale = locale).red().bold());
    for (name, error) in errors {
        println!("  - {}: {}", name.yellow(), error);
    }
}

/// Final one-line verdict.
pub fn print_verdict(success: bool, locale: &str) {
    if success {
        println!("\n{}", t!("summary.all_passed", locale = locale).green().bold());
    } else {
        println!("\n{}", t!("summary.some_failed", locale = locale).red().bold());
    }
}
