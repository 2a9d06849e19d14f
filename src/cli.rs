// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::DEFAULT_CONFIG_PATH;
use crate::core::orchestrator::ProvisionPolicy;
use crate::infra::{logging, t};

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` and `--lang=<VALUE>`.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(value) = args.iter().find_map(|arg| arg.strip_prefix("--lang=")) {
        return Some(value.to_string());
    }
    let pos = args.iter().position(|arg| arg == "--lang")?;
    args.get(pos + 1).cloned()
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("netprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help(t!("cli.log_level", locale = locale).to_string())
                .value_name("LEVEL")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.run.about", locale = locale).to_string())
                .arg(
                    Arg::new("modules")
                        .help(t!("cli.run.modules", locale = locale).to_string())
                        .value_name("MODULE")
                        .num_args(0..)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("report-dir")
                        .short('o')
                        .long("report-dir")
                        .help(t!("cli.run.report_dir", locale = locale).to_string())
                        .value_name("DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(config_arg(locale))
                .arg(tests_dir_arg(locale))
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("cli.run.jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .default_value("1")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help(t!("cli.run.yes", locale = locale).to_string())
                        .conflicts_with("no-provision")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-provision")
                        .long("no-provision")
                        .help(t!("cli.run.no_provision", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init.about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(tests_dir_arg(locale))
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("cli.init.force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("cli.config", locale = locale).to_string())
        .value_name("CONFIG")
        .default_value(DEFAULT_CONFIG_PATH)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn tests_dir_arg(locale: &str) -> Arg {
    Arg::new("tests-dir")
        .long("tests-dir")
        .help(t!("cli.tests_dir", locale = locale).to_string())
        .value_name("DIR")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Parses the command line and runs the chosen command.
/// Returns whether the command succeeded, which decides the exit code.
pub async fn run() -> Result<bool> {
    // Pre-parse language and initialize i18n first.
    let requested_lang = pre_parse_language();
    let locale = crate::init(requested_lang.as_deref());

    let matches = build_cli(&locale).get_matches();
    logging::init_logging(matches.get_one::<String>("log-level").map(String::as_str));

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let provision = if run_matches.get_flag("yes") {
                ProvisionPolicy::Auto
            } else if run_matches.get_flag("no-provision") {
                ProvisionPolicy::Never
            } else {
                ProvisionPolicy::Prompt
            };
            let args = commands::run::RunArgs {
                modules: run_matches
                    .get_many::<String>("modules")
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
                report_dir: run_matches.get_one::<PathBuf>("report-dir").cloned(),
                config: config_path(run_matches),
                tests_dir: run_matches.get_one::<PathBuf>("tests-dir").cloned(),
                jobs: run_matches.get_one::<usize>("jobs").copied().unwrap_or(1),
                provision,
                lang_overridden: requested_lang.is_some(),
            };
            commands::run::execute(args, locale).await
        }
        Some(("init", init_matches)) => {
            commands::init::execute(
                &config_path(init_matches),
                init_matches.get_one::<PathBuf>("tests-dir").cloned(),
                init_matches.get_flag("force"),
                &locale,
            )?;
            Ok(true)
        }
        // `subcommand_required` makes clap print help and exit first.
        _ => Ok(false),
    }
}
