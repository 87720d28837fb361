//! User-facing output for the CLI: suite reports, registry listings and
//! colored baseline diffs.
//!
//! Everything writes to a `termcolor::WriteColor`, so tests can render into a
//! `termcolor::Buffer` and the binary into a `StandardStream`.

use std::error::Error;
use std::io;

use serde_json::json;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::diagnostics::HarnessError;
use crate::registry::{CaseRef, Registry};
use crate::snapshot::SnapshotError;
use crate::suite::{SuiteReport, TestResult};

// ============================================================================
// SUITE REPORTS
// ============================================================================

pub fn print_report<W: WriteColor>(out: &mut W, report: &SuiteReport) -> io::Result<()> {
    for result in &report.results {
        match result {
            TestResult::Pass { file, name } => {
                status(out, "PASS", Color::Green)?;
                writeln!(out, " {name} [{file}]")?;
            }
            TestResult::Skipped { file, name, reason } => {
                status(out, "SKIP", Color::Yellow)?;
                writeln!(out, " {name} [{file}] ({reason})")?;
            }
            TestResult::Fail { file, name, error } => {
                status(out, "FAIL", Color::Red)?;
                writeln!(out, " {name} [{file}]")?;
                print_failure(out, error)?;
            }
        }
    }

    let (passed, failed, skipped) = report.counts();
    write!(out, "\nTest summary: total {}, ", report.results.len())?;
    colored(out, "passed", Color::Green)?;
    write!(out, " {passed}, ")?;
    colored(out, "failed", Color::Red)?;
    write!(out, " {failed}, ")?;
    colored(out, "skipped", Color::Yellow)?;
    writeln!(out, " {skipped}")?;

    if failed > 0 {
        writeln!(out, "\nFailed tests:")?;
        for r in report.failures() {
            writeln!(out, "  - {}", r.name())?;
        }
    }
    Ok(())
}

fn print_failure<W: WriteColor>(out: &mut W, error: &HarnessError) -> io::Result<()> {
    let mismatch = error
        .runner_error()
        .and_then(|e| e.downcast_ref::<SnapshotError>());
    if let Some(SnapshotError::BaselineMismatch { path, diff, .. }) = mismatch {
        writeln!(out, "  baseline {} differs:", path.display())?;
        return print_diff(out, diff);
    }

    colored(out, "  Error", Color::Red)?;
    writeln!(out, ": {error}")?;
    let mut source = error.source();
    while let Some(cause) = source {
        writeln!(out, "    caused by: {cause}")?;
        source = cause.source();
    }
    Ok(())
}

/// Colors the output of [`crate::snapshot::render_diff`] line by line.
pub fn print_diff<W: WriteColor>(out: &mut W, diff: &str) -> io::Result<()> {
    for line in diff.lines() {
        match line.chars().next() {
            Some('+') => out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?,
            Some('-') => out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?,
            _ => out.reset()?,
        }
        writeln!(out, "    {line}")?;
    }
    out.reset()
}

// ============================================================================
// LISTINGS
// ============================================================================

pub fn print_registry<W: WriteColor>(out: &mut W, registry: &Registry) -> io::Result<()> {
    for group in registry.groups() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(out, "{}", group.class_name)?;
        out.reset()?;
        writeln!(out, " ({})", group.directory.display())?;
        writeln!(
            out,
            "  {}",
            registry.qualified_name(CaseRef::Presence(group))
        )?;
        for entry in registry.entries_in(group) {
            writeln!(
                out,
                "  {} -> {}",
                registry.qualified_name(CaseRef::Fixture(entry)),
                entry.relative_path.display()
            )?;
        }
    }
    Ok(())
}

pub fn registry_json(registry: &Registry) -> serde_json::Value {
    let groups: Vec<_> = registry
        .groups()
        .iter()
        .map(|group| {
            let fixtures: Vec<_> = registry
                .entries_in(group)
                .map(|entry| {
                    json!({
                        "test_name": entry.test_name,
                        "qualified_name": registry.qualified_name(CaseRef::Fixture(entry)),
                        "path": entry.relative_path.display().to_string(),
                    })
                })
                .collect();
            json!({
                "path": group.path,
                "class_name": group.class_name,
                "directory": group.directory.display().to_string(),
                "presence_check": group.presence_check,
                "fixtures": fixtures,
            })
        })
        .collect();
    json!({
        "root": registry.root().display().to_string(),
        "pattern": registry.pattern().as_str(),
        "target": registry.target(),
        "groups": groups,
    })
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn status<W: WriteColor>(out: &mut W, label: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{label}:")?;
    out.reset()
}

fn colored<W: WriteColor>(out: &mut W, text: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(out, "{text}")?;
    out.reset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn render(report: &SuiteReport) -> String {
        let mut buf = Buffer::no_color();
        print_report(&mut buf, report).unwrap();
        String::from_utf8(buf.into_inner()).unwrap()
    }

    #[test]
    fn report_lists_failures_at_the_end() {
        let report = SuiteReport {
            results: vec![
                TestResult::Pass {
                    file: "a.kt".into(),
                    name: "testA".into(),
                },
                TestResult::Fail {
                    file: "b.kt".into(),
                    name: "testB".into(),
                    error: HarnessError::FixtureNotFound {
                        path: "b.kt".into(),
                    },
                },
            ],
        };
        let text = render(&report);
        assert!(text.contains("PASS: testA [a.kt]"));
        assert!(text.contains("FAIL: testB [b.kt]"));
        assert!(text.contains("total 2, passed 1, failed 1, skipped 0"));
        assert!(text.trim_end().ends_with("- testB"));
    }

    #[test]
    fn mismatch_prints_diff_instead_of_message() {
        let error = HarnessError::Execution {
            test_name: "testB".into(),
            source: Box::new(SnapshotError::BaselineMismatch {
                path: "b.txt".into(),
                expected: "x\n".into(),
                actual: "y\n".into(),
                diff: "-x\n+y\n".into(),
            }),
        };
        let mut buf = Buffer::no_color();
        print_failure(&mut buf, &error).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert_eq!(text, "  baseline b.txt differs:\n    -x\n    +y\n");
    }
}
