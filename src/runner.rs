//! Dispatching a fixture to the test-execution collaborator.
//!
//! The collaborator ("doTest") is anything implementing [`FixtureRunner`]:
//! typically a [`crate::snapshot::BaselineRunner`], or a closure in tests. The
//! harness never inspects what the collaborator does; it only locates the
//! fixture, applies backend directives, and forwards errors unchanged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::diagnostics::{HarnessError, Result, RunnerError};
use crate::directives::FixtureDirectives;
use crate::platform::TargetBackend;

/// A fixture read from disk, handed to the collaborator.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub test_name: String,
    pub path: PathBuf,
    pub source: String,
    pub directives: FixtureDirectives,
}

impl Fixture {
    pub fn load(test_name: &str, path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => HarnessError::FixtureNotFound {
                path: path.to_path_buf(),
            },
            _ => HarnessError::io(path, e),
        })?;
        let directives = FixtureDirectives::parse_file(path, &source);
        Ok(Self {
            test_name: test_name.to_string(),
            path: path.to_path_buf(),
            source,
            directives,
        })
    }
}

pub trait FixtureRunner {
    fn run(&self, fixture: &Fixture, target: TargetBackend) -> Result<(), RunnerError>;
}

impl<F> FixtureRunner for F
where
    F: Fn(&Fixture, TargetBackend) -> Result<(), RunnerError>,
{
    fn run(&self, fixture: &Fixture, target: TargetBackend) -> Result<(), RunnerError> {
        self(fixture, target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    /// The fixture restricts itself to backends the target is not one of.
    Skipped { reason: String },
    /// The fixture failed as announced by its `IGNORE_BACKEND` directive.
    IgnoredFailure { message: String },
}

/// Runs one fixture through `runner` with the platform marker `target`.
///
/// A missing fixture fails with [`HarnessError::FixtureNotFound`] before the
/// runner is called. Runner errors come back as [`HarnessError::Execution`]
/// with the original error as source.
pub fn run_fixture<R: FixtureRunner + ?Sized>(
    test_name: &str,
    path: &Path,
    target: TargetBackend,
    runner: &R,
) -> Result<RunOutcome> {
    let fixture = Fixture::load(test_name, path)?;

    let targets = fixture.directives.target_backends()?;
    if !target.accepts(&targets) {
        let listed: Vec<_> = targets.iter().map(TargetBackend::as_str).collect();
        tracing::debug!(test = test_name, backend = %target, "fixture targets other backends");
        return Ok(RunOutcome::Skipped {
            reason: format!("TARGET_BACKEND: {}", listed.join(", ")),
        });
    }
    let ignored = target.is_ignored_by(&fixture.directives.ignored_backends()?);

    tracing::debug!(test = test_name, path = %path.display(), backend = %target, ignored, "running fixture");
    match runner.run(&fixture, target) {
        Ok(()) if ignored => Err(HarnessError::UnexpectedPass {
            test_name: test_name.to_string(),
            target,
        }),
        Ok(()) => Ok(RunOutcome::Passed),
        Err(err) if ignored => {
            tracing::debug!(test = test_name, error = %err, "ignored fixture failed as expected");
            Ok(RunOutcome::IgnoredFailure {
                message: err.to_string(),
            })
        }
        Err(source) => Err(HarnessError::Execution {
            test_name: test_name.to_string(),
            source,
        }),
    }
}
