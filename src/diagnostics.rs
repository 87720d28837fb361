//! Error types for the fixture registry.
//!
//! Every failure the harness can report is a variant of [`HarnessError`]. The
//! enum derives `miette::Diagnostic` so the CLI can render codes and help text;
//! library callers just see a `std::error::Error`.
//!
//! Errors coming out of a [`crate::runner::FixtureRunner`] are carried verbatim
//! inside [`HarnessError::Execution`] as the error source.

use std::io;
use std::path::{Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::platform::TargetBackend;

/// Boxed error produced by an external fixture runner.
pub type RunnerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("fixture file not found: {}", .path.display())]
    #[diagnostic(
        code(fixreg::not_found),
        help("restore the file or regenerate the manifest so the registry stops referencing it")
    )]
    FixtureNotFound { path: PathBuf },

    #[error(
        "{check} failed: {} is out of sync with group `{group}` ({})",
        .directory.display(),
        describe_drift(.unregistered, .missing, .unregistered_groups)
    )]
    #[diagnostic(
        code(fixreg::drift),
        help("regenerate the manifest with `fixreg generate` after adding or removing fixtures")
    )]
    FixtureDrift {
        group: String,
        check: String,
        directory: PathBuf,
        unregistered: Vec<String>,
        missing: Vec<String>,
        /// Subdirectories holding fixtures that no group covers.
        unregistered_groups: Vec<String>,
    },

    #[error("{test_name} failed: {source}")]
    #[diagnostic(code(fixreg::execution))]
    Execution {
        test_name: String,
        #[source]
        source: RunnerError,
    },

    #[error("{test_name} passes on {target} although it is marked IGNORE_BACKEND")]
    #[diagnostic(
        code(fixreg::unexpected_pass),
        help("looks like this test can be unmuted: remove the IGNORE_BACKEND directive for {target}")
    )]
    UnexpectedPass {
        test_name: String,
        target: TargetBackend,
    },

    #[error("duplicate test name `{test_name}` in group `{group}`")]
    #[diagnostic(code(fixreg::duplicate_name))]
    DuplicateTestName { group: String, test_name: String },

    #[error("directories `{first}` and `{second}` both map to group class `{class_name}`")]
    #[diagnostic(
        code(fixreg::group_name_collision),
        help("rename one of the directories so their test classes stay distinct")
    )]
    GroupNameCollision {
        class_name: String,
        first: String,
        second: String,
    },

    #[error("fixture `{file}` belongs to unregistered group `{group}`")]
    #[diagnostic(
        code(fixreg::unknown_group),
        help("declare the group in the manifest's `groups` list")
    )]
    UnknownGroup { group: String, file: String },

    #[error("fixture `{file}` does not match the registry pattern `{pattern}`")]
    #[diagnostic(code(fixreg::pattern_mismatch))]
    PatternMismatch { file: String, pattern: String },

    #[error("no registered test named `{test_name}`")]
    #[diagnostic(code(fixreg::unknown_test))]
    UnknownTest { test_name: String },

    #[error("invalid fixture name pattern `{pattern}`")]
    #[diagnostic(code(fixreg::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown target backend `{value}`")]
    #[diagnostic(
        code(fixreg::invalid_backend),
        help("expected one of ANY, JVM, JVM_IR, JS, JS_IR, JS_IR_ES6, NATIVE, WASM")
    )]
    InvalidBackend { value: String },

    #[error("{}:{line}: `{value}` in {directive} is not a target backend", .path.display())]
    #[diagnostic(
        code(fixreg::invalid_directive),
        help("expected one of ANY, JVM, JVM_IR, JS, JS_IR, JS_IR_ES6, NATIVE, WASM")
    )]
    InvalidDirective {
        path: PathBuf,
        line: usize,
        directive: String,
        value: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown backend")]
        span: SourceSpan,
    },

    #[error("failed to parse manifest {origin}")]
    #[diagnostic(code(fixreg::manifest))]
    ManifestParse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize manifest")]
    #[diagnostic(code(fixreg::manifest))]
    ManifestSerialize {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error on {}", .path.display())]
    #[diagnostic(code(fixreg::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk fixture directory")]
    #[diagnostic(code(fixreg::walk))]
    Walk {
        #[source]
        source: walkdir::Error,
    },
}

impl HarnessError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for errors that point at a registry/disk mismatch rather than a
    /// failing fixture.
    pub fn is_drift(&self) -> bool {
        matches!(
            self,
            HarnessError::FixtureDrift { .. } | HarnessError::FixtureNotFound { .. }
        )
    }

    /// The collaborator's error when this is an execution failure.
    pub fn runner_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            HarnessError::Execution { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

fn describe_drift(unregistered: &[String], missing: &[String], groups: &[String]) -> String {
    let mut parts = Vec::new();
    if !unregistered.is_empty() {
        parts.push(format!("not registered: {}", unregistered.join(", ")));
    }
    if !missing.is_empty() {
        parts.push(format!("missing on disk: {}", missing.join(", ")));
    }
    if !groups.is_empty() {
        parts.push(format!("directories without a group: {}", groups.join(", ")));
    }
    parts.join("; ")
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn drift_message_lists_both_directions() {
        let err = HarnessError::FixtureDrift {
            group: "dynamic".to_string(),
            check: "testAllFilesPresentInDynamic".to_string(),
            directory: PathBuf::from("testData/dynamic"),
            unregistered: vec!["dynamicNewCase.kt".to_string()],
            missing: vec!["gone.kt".to_string()],
            unregistered_groups: vec!["brandNew".to_string()],
        };
        let text = err.to_string();
        assert!(text.starts_with("testAllFilesPresentInDynamic failed"));
        assert!(text.contains("not registered: dynamicNewCase.kt"));
        assert!(text.contains("missing on disk: gone.kt"));
        assert!(text.contains("directories without a group: brandNew"));
        assert!(err.is_drift());
    }

    #[test]
    fn report_carries_code_and_help() {
        let err = HarnessError::FixtureNotFound {
            path: PathBuf::from("native/nativeNativeKotlin.kt"),
        };
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("fixreg::not_found"));
        assert!(output.contains("regenerate the manifest"));
    }

    #[test]
    fn invalid_directive_report_names_the_fixture() {
        let source = "// TARGET_BACKEND: LLVM\nfun f() {}\n";
        let err = HarnessError::InvalidDirective {
            path: PathBuf::from("native/nativeNativeKotlin.kt"),
            line: 1,
            directive: "TARGET_BACKEND".to_string(),
            value: "LLVM".to_string(),
            src: NamedSource::new("native/nativeNativeKotlin.kt", source.to_string()),
            span: SourceSpan::from((19, 4)),
        };
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("fixreg::invalid_directive"));
        assert!(output.contains("native/nativeNativeKotlin.kt"));
        assert!(output.contains("unknown backend"));
    }

    #[test]
    fn execution_keeps_runner_error() {
        let err = HarnessError::Execution {
            test_name: "testDynamicCall".to_string(),
            source: "baseline mismatch".into(),
        };
        assert_eq!(err.runner_error().map(|e| e.to_string()).as_deref(), Some("baseline mismatch"));
        assert!(!err.is_drift());
    }
}
