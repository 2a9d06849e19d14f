//! # JSON Snapshot Module / JSON 快照模块
//!
//! The machine-readable report: every module with the full field set of each
//! of its tests, in insertion order. It carries no render time, so persisting
//! an unchanged store twice produces identical bytes.
//!
//! 机器可读的报告：每个模块及其所有测试的完整字段，按插入顺序排列。
//! 它不包含渲染时间，因此对未改变的存储持久化两次会得到相同的字节。

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

use crate::core::models::{Status, TestDetails, TestResult};
use crate::errors::ReportError;
use crate::infra::fs::{append_line, write_atomic};

/// File name of the snapshot inside the execution directory.
pub const SNAPSHOT_FILE: &str = "test_report.json";
/// File name of the append-only journal.
pub const JOURNAL_FILE: &str = "results.jsonl";

#[derive(Debug, Serialize)]
pub struct SnapshotTest<'a> {
    pub test_name: &'a str,
    pub status: Status,
    /// Seconds
    pub duration: f64,
    pub timestamp: &'a DateTime<Local>,
    pub error_message: Option<&'a str>,
    pub details: &'a TestDetails,
}

impl<'a> From<&'a TestResult> for SnapshotTest<'a> {
    fn from(r: &'a TestResult) -> Self {
        Self {
            test_name: &r.test_name,
            status: r.status(),
            duration: r.duration.as_secs_f64(),
            timestamp: &r.timestamp,
            error_message: r.error_message(),
            details: &r.details,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub execution_id: &'a str,
    pub modules: IndexMap<&'a str, Vec<SnapshotTest<'a>>>,
}

impl<'a> Snapshot<'a> {
    pub fn build(execution_id: &'a str, results: &'a IndexMap<String, Vec<TestResult>>) -> Self {
        Self {
            execution_id,
            modules: results
                .iter()
                .map(|(module, tests)| (module.as_str(), tests.iter().map(SnapshotTest::from).collect()))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One line of the journal.
#[derive(Debug, Serialize)]
struct JournalEntry<'a> {
    module: &'a str,
    #[serde(flatten)]
    test: SnapshotTest<'a>,
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot<'_>) -> Result<(), ReportError> {
    let json = snapshot.to_json()?;
    write_atomic(path, json.as_bytes()).map_err(|e| ReportError::io(path, e))
}

pub fn append_journal(path: &Path, module: &str, result: &TestResult) -> Result<(), ReportError> {
    let line = serde_json::to_string(&JournalEntry {
        module,
        test: SnapshotTest::from(result),
    })?;
    append_line(path, &line).map_err(|e| ReportError::io(path, e))
}
