//! # Run Orchestrator Module / 运行编排模块
//!
//! Drives one execution from preflight to the final exit signal:
//!
//! ```text
//! Init -> Preflight -> { Ready | Aborted }
//! Ready -> Running -> Done
//! ```
//!
//! Only preflight may abort the run. Once running, a module that fails to load
//! is recorded as a module error and the remaining modules still run.
//! Up to `jobs` modules run at once, except that a module declaring VLANs
//! runs alone: its sub-interfaces are created on nodes every module shares.
//!
//! 驱动一次执行从预检到最终退出信号。只有预检可以中止运行；
//! 进入运行阶段后，加载失败的模块会被记录为模块错误，其余模块继续运行。
//! 声明了 VLAN 的模块会独占运行，因为其子接口建立在所有模块共享的节点上。

use colored::*;
use futures::{StreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::checks::{run_checks, with_vlans};
use crate::core::config::NetprobeConfig;
use crate::core::execution::TestRunner;
use crate::core::models::{Status, TestResult};
use crate::core::node::{NodeExecutor, RuntimeStatus};
use crate::core::store::ResultStore;
use crate::core::suite::{self, ModuleSource};
use crate::errors::{EnvironmentError, ModuleError};
use crate::infra::prompt;
use crate::infra::t;
use crate::reporting::data::ReportData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Preflight,
    Ready,
    Aborted,
    Running,
    Done,
}

/// What to do when the runtime answers but no node is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisionPolicy {
    /// Ask on the terminal; a non-interactive stdin declines.
    #[default]
    Prompt,
    Auto,
    Never,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tests_dir: PathBuf,
    /// Explicit module names; `None` discovers every module in `tests_dir`.
    pub modules: Option<Vec<String>>,
    /// Modules run concurrently / 并发运行的模块数
    pub jobs: usize,
    pub provision: ProvisionPolicy,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tests_dir: PathBuf::from("network_tests"),
            modules: None,
            jobs: 1,
            provision: ProvisionPolicy::default(),
            show_progress: false,
        }
    }
}

/// How one module ended.
#[derive(Debug)]
pub struct ModuleOutcome {
    pub name: String,
    pub passed: usize,
    pub failed: usize,
    pub error: Option<ModuleError>,
}

impl ModuleOutcome {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: 0,
            failed: 0,
            error: None,
        }
    }

    fn errored(name: &str, error: ModuleError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(name)
        }
    }

    fn record(&mut self, result: &TestResult) {
        match result.status() {
            Status::Pass => self.passed += 1,
            Status::Fail => self.failed += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed == 0
    }
}

/// Final outcome of a run that reached `Running`.
#[derive(Debug)]
pub struct RunReport {
    pub modules: Vec<ModuleOutcome>,
    pub summary: ReportData,
    pub report_dir: PathBuf,
    pub success: bool,
}

impl RunReport {
    pub fn module_errors(&self) -> impl Iterator<Item = (&str, &ModuleError)> {
        self.modules
            .iter()
            .filter_map(|m| m.error.as_ref().map(|e| (m.name.as_str(), e)))
    }

    pub fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}

pub struct Orchestrator {
    config: Arc<NetprobeConfig>,
    runtime: Arc<dyn RuntimeStatus>,
    executor: Arc<dyn NodeExecutor>,
    store: Arc<ResultStore>,
    options: RunOptions,
    state: RunState,
    sources: Vec<ModuleSource>,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
    /// Held exclusively by modules that add VLAN sub-interfaces to the shared
    /// nodes, shared by every other module.
    node_access: RwLock<()>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<NetprobeConfig>,
        runtime: Arc<dyn RuntimeStatus>,
        executor: Arc<dyn NodeExecutor>,
        store: Arc<ResultStore>,
        options: RunOptions,
    ) -> Self {
        Self {
            config,
            runtime,
            executor,
            store,
            options,
            state: RunState::Init,
            sources: Vec::new(),
            cancel: CancellationToken::new(),
            progress: None,
            node_access: RwLock::new(()),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Cancelling the token stops scheduling further modules.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Modules selected by the last successful preflight.
    pub fn modules(&self) -> &[ModuleSource] {
        &self.sources
    }

    /// Checks that the runtime is usable and finds the modules to run.
    /// Moves to `Ready` on success and to `Aborted` otherwise.
    pub async fn preflight(&mut self) -> Result<(), EnvironmentError> {
        self.state = RunState::Preflight;
        match self.check_environment().await {
            Ok(sources) => {
                info!(modules = sources.len(), "preflight passed");
                self.sources = sources;
                self.state = RunState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "preflight failed");
                self.state = RunState::Aborted;
                Err(e)
            }
        }
    }

    async fn check_environment(&self) -> Result<Vec<ModuleSource>, EnvironmentError> {
        if !self.runtime.is_reachable().await {
            return Err(EnvironmentError::RuntimeUnreachable(
                t!("preflight.runtime_hint").to_string(),
            ));
        }

        let mut running = self.runtime.list_running_nodes().await;
        if running.is_empty() {
            self.provision().await?;
            running = self.runtime.list_running_nodes().await;
            if running.is_empty() {
                return Err(EnvironmentError::NodesStillDown);
            }
        }

        for node in self.required_nodes() {
            if !running.iter().any(|r| r == node) {
                warn!(node, "required node is not running");
            }
        }

        match &self.options.modules {
            Some(names) if !names.is_empty() => {
                Ok(suite::select_modules(&self.options.tests_dir, names))
            }
            _ => suite::discover_modules(&self.options.tests_dir),
        }
    }

    async fn provision(&self) -> Result<(), EnvironmentError> {
        let accepted = match self.options.provision {
            ProvisionPolicy::Auto => true,
            ProvisionPolicy::Never => false,
            ProvisionPolicy::Prompt => prompt::confirm(&t!("preflight.provision_prompt"), true),
        };
        if !accepted {
            return Err(EnvironmentError::ProvisioningDeclined);
        }

        info!("bringing nodes up");
        self.runtime
            .bring_up()
            .await
            .map_err(|e| EnvironmentError::ProvisioningFailed(format!("{e:#}")))
    }

    fn required_nodes(&self) -> impl Iterator<Item = &str> {
        let mut seen = indexmap::IndexSet::new();
        for scenario in self.config.scenarios.values() {
            for node in scenario.nodes.keys() {
                seen.insert(node.as_str());
            }
        }
        seen.into_iter()
    }

    /// Runs preflight if it has not run yet, then every selected module.
    /// Fails only when preflight fails; module and test failures are part of
    /// the returned report.
    pub async fn run(mut self) -> Result<RunReport, EnvironmentError> {
        if self.state == RunState::Init {
            self.preflight().await?;
        }
        if self.state != RunState::Ready {
            return Err(EnvironmentError::NotReady);
        }

        self.state = RunState::Running;
        let sources = std::mem::take(&mut self.sources);
        self.start_progress(sources.len());

        let jobs = self.options.jobs.max(1);
        let this = &self;
        let modules: Vec<ModuleOutcome> = stream::iter(sources)
            .map(|source| this.run_module(source))
            .buffered(jobs)
            .collect()
            .await;

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        if let Err(e) = self.store.finalize() {
            error!(error = %e, "failed to write final report");
        }

        let summary = self.store.summary();
        let success = modules.iter().all(|m| m.error.is_none()) && summary.summary.failed_tests == 0;
        self.state = RunState::Done;
        info!(success, "run finished");

        Ok(RunReport {
            modules,
            summary,
            report_dir: self.store.context().dir().to_path_buf(),
            success,
        })
    }

    /// Loads and runs one module. Never fails: load errors and interruption
    /// are returned inside the outcome.
    pub async fn run_module(&self, source: ModuleSource) -> ModuleOutcome {
        if self.cancel.is_cancelled() {
            warn!(module = %source.name, "skipped after interruption");
            self.advance_progress();
            return ModuleOutcome::errored(&source.name, ModuleError::Interrupted(source.name.clone()));
        }

        let module = match suite::load_module(&source, &self.config) {
            Ok(module) => module,
            Err(e) => {
                error!(module = %source.name, error = %e, "module failed to load");
                self.advance_progress();
                return ModuleOutcome::errored(&source.name, e);
            }
        };

        let (_shared, _exclusive) = if module.topology.vlans.is_empty() {
            (Some(self.node_access.read().await), None)
        } else {
            debug!(module = %module.name, "waiting for exclusive node access");
            (None, Some(self.node_access.write().await))
        };
        if self.cancel.is_cancelled() {
            warn!(module = %module.name, "skipped after interruption");
            self.advance_progress();
            return ModuleOutcome::errored(&module.name, ModuleError::Interrupted(module.name.clone()));
        }

        info!(module = %module.name, tests = module.tests.len(), "running module");
        if let Some(bar) = &self.progress {
            bar.set_message(module.name.clone());
        }

        let runner = TestRunner::new(
            &module.name,
            Arc::clone(&self.store),
            Arc::clone(&self.executor),
            Arc::clone(&module.topology),
        );
        let mut outcome = ModuleOutcome::new(&module.name);

        for test in &module.tests {
            let checks = &test.checks;
            let result = runner
                .run_test(&test.name, |ctx| async move {
                    with_vlans(&ctx, || run_checks(&ctx, checks)).await
                })
                .await;
            self.print_result(&result);
            outcome.record(&result);
        }

        self.advance_progress();
        outcome
    }

    fn start_progress(&mut self, modules: usize) {
        if !self.options.show_progress {
            return;
        }
        let bar = ProgressBar::new(modules as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} {msg}")
            .map(|s| s.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        self.progress = Some(bar);
    }

    fn advance_progress(&self) {
        if let Some(bar) = &self.progress {
            bar.inc(1);
        }
    }

    fn print_result(&self, result: &TestResult) {
        let Some(bar) = &self.progress else {
            return;
        };
        let status = match result.status() {
            Status::Pass => result.status().to_string().green(),
            Status::Fail => result.status().to_string().red(),
        };
        bar.println(format!(
            "  {status:<4} {}::{} ({:.2}s)",
            result.module_name,
            result.test_name,
            result.duration.as_secs_f64()
        ));
    }
}
