//! Running a whole registry: every presence check and every fixture, one
//! independent result each.

use crate::diagnostics::HarnessError;
use crate::registry::{CaseRef, Registry};
use crate::runner::{FixtureRunner, RunOutcome};

/// Result of one registered case.
#[derive(Debug)]
pub enum TestResult {
    Pass {
        file: String,
        name: String,
    },
    Fail {
        file: String,
        name: String,
        error: HarnessError,
    },
    Skipped {
        file: String,
        name: String,
        reason: String,
    },
}

impl TestResult {
    pub fn name(&self) -> &str {
        match self {
            TestResult::Pass { name, .. }
            | TestResult::Fail { name, .. }
            | TestResult::Skipped { name, .. } => name,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }
}

#[derive(Debug, Default, Clone)]
pub struct SuiteOptions {
    /// Case-insensitive substring filter on qualified test names.
    pub filter: Option<String>,
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    /// `(passed, failed, skipped)`
    pub fn counts(&self) -> (usize, usize, usize) {
        partition_results(&self.results)
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(TestResult::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

pub fn partition_results(results: &[TestResult]) -> (usize, usize, usize) {
    let passed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Pass { .. }))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Fail { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r, TestResult::Skipped { .. }))
        .count();
    (passed, failed, skipped)
}

fn skip_reason(name: &str, filter: Option<&str>) -> Option<String> {
    let f = filter?;
    if name.to_lowercase().contains(&f.to_lowercase()) {
        None
    } else {
        Some(format!("Filtered out by substring: {f}"))
    }
}

/// Runs every case of `registry` in declaration order. Nothing is retried and
/// a failure never stops the remaining cases.
pub fn run_suite<R: FixtureRunner + ?Sized>(
    registry: &Registry,
    runner: &R,
    options: &SuiteOptions,
) -> SuiteReport {
    let mut results = Vec::new();
    for case in registry.cases() {
        let name = registry.qualified_name(case);
        let file = match case {
            CaseRef::Fixture(entry) => entry.relative_path.display().to_string(),
            CaseRef::Presence(group) => group.directory.display().to_string(),
        };

        if let Some(reason) = skip_reason(&name, options.filter.as_deref()) {
            results.push(TestResult::Skipped { file, name, reason });
            continue;
        }

        let result = match registry.run_case(case, runner) {
            Ok(RunOutcome::Passed) | Ok(RunOutcome::IgnoredFailure { .. }) => {
                TestResult::Pass { file, name }
            }
            Ok(RunOutcome::Skipped { reason }) => TestResult::Skipped { file, name, reason },
            Err(error) => {
                tracing::debug!(test = %name, %error, "case failed");
                TestResult::Fail { file, name, error }
            }
        };
        results.push(result);
    }

    let report = SuiteReport { results };
    let (passed, failed, skipped) = report.counts();
    tracing::info!(passed, failed, skipped, "suite finished");
    report
}

/// Runs only the presence checks, one result per group.
pub fn run_presence_checks(registry: &Registry) -> SuiteReport {
    let results = registry
        .groups()
        .iter()
        .map(|group| {
            let name = registry.qualified_name(CaseRef::Presence(group));
            let file = group.directory.display().to_string();
            match registry.check_group(group) {
                Ok(()) => TestResult::Pass { file, name },
                Err(error) => TestResult::Fail { file, name, error },
            }
        })
        .collect();
    SuiteReport { results }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_case_insensitive() {
        assert_eq!(skip_reason("Dynamic.testDynamicCall", Some("DYNAMICCALL")), None);
        assert!(skip_reason("Native.testNativeNativeKotlin", Some("dynamic")).is_some());
        assert_eq!(skip_reason("anything", None), None);
    }
}
