//! # Run Command Module / 运行命令模块
//!
//! Implements `netprobe run`: loads the configuration, runs preflight and the
//! selected test modules against the docker runtime, and prints the summary.
//!
//! 实现 `netprobe run`：加载配置，针对 docker 运行时执行预检和所选测试模块，并打印摘要。

use anyhow::{Context, Result};
use colored::*;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    core::{
        config,
        orchestrator::{Orchestrator, ProvisionPolicy, RunOptions},
        store::ResultStore,
    },
    infra::{
        docker::{DockerExecutor, DockerRuntime},
        t,
    },
    reporting::{print_module_errors, print_summary, print_verdict},
};

/// Parsed arguments of `netprobe run`.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub modules: Vec<String>,
    pub report_dir: Option<PathBuf>,
    pub config: PathBuf,
    pub tests_dir: Option<PathBuf>,
    pub jobs: usize,
    pub provision: ProvisionPolicy,
    /// `--lang` was given, so the configured language is ignored.
    pub lang_overridden: bool,
}

/// Executes the run command. Returns overall success.
pub async fn execute(args: RunArgs, mut locale: String) -> Result<bool> {
    let config = config::load_or_create(&args.config)?;
    if !args.lang_overridden {
        if let Some(lang) = config.language.as_deref() {
            locale = crate::init(Some(lang));
        }
    }

    println!(
        "{}",
        t!("run.loading_config", locale = locale, path = args.config.display())
    );

    let tests_dir = args.tests_dir.unwrap_or_else(|| config.tests_dir.clone());
    let report_base = args
        .report_dir
        .unwrap_or_else(|| config.report.base_dir.clone());

    let store = ResultStore::create(&report_base, config.report.persist, &locale)
        .with_context(|| {
            t!("run.report_dir_failed", locale = locale, path = report_base.display()).to_string()
        })?;
    println!(
        "{}",
        t!("run.execution_dir", locale = locale, path = store.context().dir().display()).cyan()
    );

    let runtime = Arc::new(DockerRuntime::new(config.runtime.clone()));
    let executor = Arc::new(DockerExecutor::new(config.runtime.clone()));
    let options = RunOptions {
        tests_dir,
        modules: (!args.modules.is_empty()).then_some(args.modules),
        jobs: args.jobs,
        provision: args.provision,
        show_progress: std::io::stdout().is_terminal(),
    };

    let stop_token = setup_signal_handler(&locale);
    let orchestrator = Orchestrator::new(
        Arc::new(config),
        runtime,
        executor,
        Arc::clone(&store),
        options,
    )
    .with_cancellation(stop_token);

    println!("{}", t!("run.preflight", locale = locale).bold());
    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!(
                "{} {}",
                t!("run.environment_error", locale = locale).red().bold(),
                e
            );
            return Ok(false);
        }
    };

    print_summary(&report.summary, &report.report_dir, &locale);
    print_module_errors(report.module_errors(), &locale);
    print_verdict(report.success, &locale);
    Ok(report.success)
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("run.shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    token
}
