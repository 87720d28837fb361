//! Command-line arguments and subcommands for `fixreg`.
//!
//! Uses the `clap` derive API; every subcommand takes the manifest (or the
//! fixture root) as its positional argument.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::platform::TargetBackend;
use crate::registry::DEFAULT_PATTERN;

#[derive(Debug, Parser)]
#[command(
    name = "fixreg",
    version,
    about = "Data-driven fixture registry with presence checks and baseline snapshots."
)]
pub struct FixregArgs {
    /// Directory manifest roots and fixture paths are resolved against.
    #[arg(long, global = true, default_value = ".")]
    pub project_root: PathBuf,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every group and registered fixture.
    List {
        #[arg(required = true)]
        manifest: PathBuf,
        /// Print JSON instead of a text listing.
        #[arg(long)]
        json: bool,
    },
    /// Run the presence check of every group.
    Check {
        #[arg(required = true)]
        manifest: PathBuf,
    },
    /// Run every case, comparing the output of an external tool with baselines.
    Run {
        #[arg(required = true)]
        manifest: PathBuf,
        /// Program that prints the dump of the fixture passed as its last argument.
        #[arg(long, required = true)]
        exec: String,
        /// Extra arguments for the program, given after `--`.
        #[arg(last = true)]
        exec_args: Vec<String>,
        /// Only run cases whose qualified name contains this substring.
        #[arg(long)]
        filter: Option<String>,
        /// Rewrite baselines instead of failing on mismatches.
        #[arg(long)]
        update: bool,
        /// Extension of baseline files.
        #[arg(long)]
        baseline_ext: Option<String>,
    },
    /// Build a manifest from a fixture directory tree.
    Generate {
        /// Fixture root, relative to the project root.
        #[arg(required = true)]
        root: PathBuf,
        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,
        /// Only register fixtures runnable on this backend.
        #[arg(long, default_value = "ANY")]
        target: TargetBackend,
        /// Write the manifest here instead of printing it.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_trailing_exec_args() {
        let args = FixregArgs::try_parse_from([
            "fixreg",
            "run",
            "m.yaml",
            "--exec",
            "dump",
            "--filter",
            "dynamic",
            "--",
            "--ir",
            "-v",
        ])
        .unwrap();
        match args.command {
            Command::Run {
                exec,
                exec_args,
                filter,
                update,
                ..
            } => {
                assert_eq!(exec, "dump");
                assert_eq!(exec_args, ["--ir", "-v"]);
                assert_eq!(filter.as_deref(), Some("dynamic"));
                assert!(!update);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn generate_target_parses_case_insensitively() {
        let args =
            FixregArgs::try_parse_from(["fixreg", "--no-color", "generate", "t", "--target", "js_ir"])
                .unwrap();
        assert!(args.no_color);
        match args.command {
            Command::Generate { target, pattern, .. } => {
                assert_eq!(target, TargetBackend::JsIr);
                assert_eq!(pattern, DEFAULT_PATTERN);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
