//! Baseline comparison: render a fixture to text and diff it against the
//! expected dump stored next to it.
//!
//! `dynamicCall.kt` is compared against `dynamicCall.txt`. In update mode a
//! missing or stale baseline is (re)written instead of failing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use difference::{Changeset, Difference};
use miette::Diagnostic;
use thiserror::Error;

use crate::diagnostics::RunnerError;
use crate::platform::TargetBackend;
use crate::runner::{Fixture, FixtureRunner};

pub const DEFAULT_BASELINE_EXTENSION: &str = "txt";

/// Produces the textual dump of a fixture. This is where a compiler pipeline
/// plugs in.
pub trait Renderer {
    fn render(&self, fixture: &Fixture, target: TargetBackend) -> Result<String, RunnerError>;
}

impl<F> Renderer for F
where
    F: Fn(&Fixture, TargetBackend) -> Result<String, RunnerError>,
{
    fn render(&self, fixture: &Fixture, target: TargetBackend) -> Result<String, RunnerError> {
        self(fixture, target)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    #[error("baseline {} does not exist", .path.display())]
    #[diagnostic(
        code(fixreg::baseline_missing),
        help("run with --update (or UPDATE_SNAPSHOTS=1) to record it")
    )]
    BaselineMissing { path: PathBuf },

    #[error("actual output differs from baseline {}\n{diff}", .path.display())]
    #[diagnostic(
        code(fixreg::baseline_mismatch),
        help("run with --update (or UPDATE_SNAPSHOTS=1) if the new output is correct")
    )]
    BaselineMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
        diff: String,
    },

    #[error("cannot access baseline {}", .path.display())]
    #[diagnostic(code(fixreg::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A [`FixtureRunner`] that checks rendered output against baseline files.
#[derive(Debug, Clone)]
pub struct BaselineRunner<R> {
    renderer: R,
    extension: String,
    update: bool,
}

impl<R: Renderer> BaselineRunner<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            extension: DEFAULT_BASELINE_EXTENSION.to_string(),
            update: false,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn baseline_for(&self, fixture_path: &Path) -> PathBuf {
        baseline_path(fixture_path, &self.extension)
    }

    fn write_baseline(&self, path: &Path, contents: &str) -> Result<(), SnapshotError> {
        tracing::info!(baseline = %path.display(), "updating baseline");
        fs::write(path, contents).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<R: Renderer> FixtureRunner for BaselineRunner<R> {
    fn run(&self, fixture: &Fixture, target: TargetBackend) -> Result<(), RunnerError> {
        let actual = normalize(&self.renderer.render(fixture, target)?);
        let path = self.baseline_for(&fixture.path);

        let expected = match fs::read_to_string(&path) {
            Ok(text) => normalize(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.update {
                    self.write_baseline(&path, &actual)?;
                    return Ok(());
                }
                return Err(SnapshotError::BaselineMissing { path }.into());
            }
            Err(source) => return Err(SnapshotError::Io { path, source }.into()),
        };

        if expected == actual {
            return Ok(());
        }
        if self.update {
            self.write_baseline(&path, &actual)?;
            return Ok(());
        }
        let diff = render_diff(&expected, &actual);
        Err(SnapshotError::BaselineMismatch {
            path,
            expected,
            actual,
            diff,
        }
        .into())
    }
}

pub fn baseline_path(fixture_path: &Path, extension: &str) -> PathBuf {
    fixture_path.with_extension(extension)
}

/// Unifies line endings, strips trailing whitespace per line and ends the
/// text with exactly one newline.
pub fn normalize(text: &str) -> String {
    let mut out: String = text
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end_matches('\n')
        .to_string();
    out.push('\n');
    out
}

/// Line diff in unified style: ` ` unchanged, `-` expected only, `+` actual
/// only.
pub fn render_diff(expected: &str, actual: &str) -> String {
    let changeset = Changeset::new(expected.trim_end(), actual.trim_end(), "\n");
    let mut out = String::new();
    for diff in &changeset.diffs {
        let (marker, chunk) = match diff {
            Difference::Same(x) => (' ', x),
            Difference::Rem(x) => ('-', x),
            Difference::Add(x) => ('+', x),
        };
        for line in chunk.lines() {
            out.push(marker);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
