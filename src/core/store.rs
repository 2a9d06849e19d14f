//! # Result Store Module / 结果存储模块
//!
//! Aggregates test results by module for one execution and keeps the report
//! artifacts on disk in step with them. The store is created once per process
//! and shared by `Arc`; `add_result` and `persist` are mutually exclusive, so
//! every snapshot reflects a whole number of results.
//!
//! 按模块聚合一次执行的测试结果，并使磁盘上的报告产物与之保持同步。
//! 存储在每个进程中只创建一次并通过 `Arc` 共享；
//! `add_result` 与 `persist` 互斥，因此每个快照都反映完整的结果集。

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::core::config::PersistMode;
use crate::core::models::TestResult;
use crate::errors::ReportError;
use crate::infra::fs::create_execution_dir;
use crate::reporting::ReportRenderer;
use crate::reporting::data::ReportData;
use crate::reporting::html::HtmlRenderer;
use crate::reporting::json::{self, JOURNAL_FILE, SNAPSHOT_FILE, Snapshot};

/// The execution-scoped output directory.
/// 执行范围的输出目录。
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    id: String,
    dir: PathBuf,
    started_at: DateTime<Local>,
}

impl ExecutionContext {
    /// Creates a new, never-before-used directory under `base_dir`.
    pub fn create(base_dir: &Path) -> Result<Self, ReportError> {
        let started_at = Local::now();
        let (id, dir) =
            create_execution_dir(base_dir, started_at).map_err(|e| ReportError::io(base_dir, e))?;
        Ok(Self { id, dir, started_at })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }
}

pub struct ResultStore {
    context: ExecutionContext,
    persist_mode: PersistMode,
    renderers: Vec<Box<dyn ReportRenderer>>,
    results: Mutex<IndexMap<String, Vec<TestResult>>>,
}

impl ResultStore {
    /// Creates the execution directory under `base_dir` with the HTML renderer.
    pub fn create(base_dir: &Path, persist_mode: PersistMode, locale: &str) -> Result<Arc<Self>, ReportError> {
        Self::with_renderers(
            base_dir,
            persist_mode,
            vec![Box::new(HtmlRenderer::new(locale))],
        )
    }

    pub fn with_renderers(
        base_dir: &Path,
        persist_mode: PersistMode,
        renderers: Vec<Box<dyn ReportRenderer>>,
    ) -> Result<Arc<Self>, ReportError> {
        let context = ExecutionContext::create(base_dir)?;
        for renderer in &renderers {
            renderer.install_assets(context.dir())?;
        }
        debug!(dir = %context.dir().display(), "created execution directory");
        Ok(Arc::new(Self {
            context,
            persist_mode,
            renderers,
            results: Mutex::new(IndexMap::new()),
        }))
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn persist_mode(&self) -> PersistMode {
        self.persist_mode
    }

    /// Appends `result` to `module` and brings the artifacts up to date.
    /// The result is kept even if writing fails.
    pub fn add_result(&self, module: &str, result: TestResult) -> Result<(), ReportError> {
        let mut results = self.results.lock();
        match self.persist_mode {
            PersistMode::Incremental => {
                results.entry(module.to_string()).or_default().push(result);
                self.write_artifacts(&results)
            }
            PersistMode::Journal => {
                let appended = json::append_journal(&self.context.journal_path(), module, &result);
                results.entry(module.to_string()).or_default().push(result);
                appended
            }
        }
    }

    /// Rewrites the snapshot and every rendered report from the current state.
    pub fn persist(&self) -> Result<(), ReportError> {
        let results = self.results.lock();
        self.write_artifacts(&results)
    }

    /// Final write at the end of a run, whatever the persist mode.
    pub fn finalize(&self) -> Result<(), ReportError> {
        self.persist()
    }

    /// Aggregate counters and formatted views for display.
    pub fn summary(&self) -> ReportData {
        let results = self.results.lock();
        ReportData::build(self.context.id(), &results, Local::now())
    }

    /// The machine-readable snapshot as JSON text.
    pub fn snapshot_json(&self) -> Result<String, ReportError> {
        let results = self.results.lock();
        Snapshot::build(self.context.id(), &results).to_json()
    }

    /// A copy of every result, grouped by module in insertion order.
    pub fn results(&self) -> IndexMap<String, Vec<TestResult>> {
        self.results.lock().clone()
    }

    pub fn total_tests(&self) -> usize {
        self.results.lock().values().map(Vec::len).sum()
    }

    fn write_artifacts(&self, results: &IndexMap<String, Vec<TestResult>>) -> Result<(), ReportError> {
        let snapshot = Snapshot::build(self.context.id(), results);
        json::write_snapshot(&self.context.snapshot_path(), &snapshot)?;

        let data = ReportData::build(self.context.id(), results, Local::now());
        for renderer in &self.renderers {
            renderer.render(&data, self.context.dir())?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("context", &self.context)
            .field("persist_mode", &self.persist_mode)
            .finish_non_exhaustive()
    }
}
