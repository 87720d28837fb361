//! The `fixreg` command-line interface.
//!
//! Parses arguments, builds the registry and dispatches to one handler per
//! subcommand. Errors are rendered with `miette`; any failure exits with 1.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use termcolor::{ColorChoice, StandardStream};

use crate::cli::args::{Command, FixregArgs};
use crate::config::HarnessConfig;
use crate::diagnostics::{HarnessError, Result};
use crate::exec::CommandRenderer;
use crate::generate::generate_manifest;
use crate::logging::init_tracing;
use crate::platform::TargetBackend;
use crate::registry::Registry;
use crate::snapshot::BaselineRunner;
use crate::suite::{run_presence_checks, run_suite, SuiteOptions, SuiteReport};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    init_tracing();
    let args = FixregArgs::parse();

    let mut config = HarnessConfig::default().with_project_root(&args.project_root);
    if args.no_color {
        config.use_colors = false;
    }

    match dispatch(args.command, config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command ran but found failing cases.
fn dispatch(command: Command, mut config: HarnessConfig) -> Result<bool> {
    match command {
        Command::List { manifest, json } => {
            handle_list(&manifest, json, &config)?;
            Ok(true)
        }
        Command::Check { manifest } => handle_check(&manifest, &config),
        Command::Run {
            manifest,
            exec,
            exec_args,
            filter,
            update,
            baseline_ext,
        } => {
            config = config.with_filter(filter);
            config.update_snapshots |= update;
            if let Some(ext) = baseline_ext {
                config.baseline_extension = ext;
            }
            handle_run(&manifest, exec, exec_args, &config)
        }
        Command::Generate {
            root,
            pattern,
            target,
            output,
        } => {
            handle_generate(&root, &pattern, target, output.as_deref(), &config)?;
            Ok(true)
        }
    }
}

fn handle_list(manifest: &Path, json: bool, config: &HarnessConfig) -> Result<()> {
    let registry = Registry::load(manifest, &config.project_root)?;
    let mut stdout = stdout(config);
    let written = if json {
        let value = output::registry_json(&registry);
        writeln!(stdout, "{value:#}")
    } else {
        output::print_registry(&mut stdout, &registry)
    };
    written.map_err(|e| HarnessError::io("<stdout>", e))
}

fn handle_check(manifest: &Path, config: &HarnessConfig) -> Result<bool> {
    let registry = Registry::load(manifest, &config.project_root)?;
    report(&run_presence_checks(&registry), config)
}

fn handle_run(
    manifest: &Path,
    exec: String,
    exec_args: Vec<String>,
    config: &HarnessConfig,
) -> Result<bool> {
    let registry = Registry::load(manifest, &config.project_root)?;
    let renderer = CommandRenderer::new(exec).args(exec_args);
    let runner = BaselineRunner::new(renderer)
        .with_extension(config.baseline_extension.clone())
        .with_update(config.update_snapshots);
    let options = SuiteOptions {
        filter: config.filter.clone(),
    };
    report(&run_suite(&registry, &runner, &options), config)
}

fn handle_generate(
    root: &Path,
    pattern: &str,
    target: TargetBackend,
    output: Option<&Path>,
    config: &HarnessConfig,
) -> Result<()> {
    let manifest = generate_manifest(&config.project_root, root, pattern, target)?;
    match output {
        Some(path) => {
            manifest.save(path)?;
            tracing::info!(output = %path.display(), "manifest written");
            Ok(())
        }
        None => {
            print!("{}", manifest.to_yaml()?);
            Ok(())
        }
    }
}

fn report(report: &SuiteReport, config: &HarnessConfig) -> Result<bool> {
    let mut stdout = stdout(config);
    output::print_report(&mut stdout, report).map_err(|e| HarnessError::io("<stdout>", e))?;
    Ok(!report.has_failures())
}

fn stdout(config: &HarnessConfig) -> StandardStream {
    let choice = if config.use_colors {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}
