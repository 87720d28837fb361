//! Data-driven fixture registry for compiler snapshot tests.
//!
//! A [`Manifest`] lists fixture files grouped by directory. It is turned into
//! an immutable [`Registry`] whose cases are run by a [`FixtureRunner`]:
//! one case per fixture plus one presence check per directory that keeps the
//! manifest and the file tree in sync.

pub use crate::diagnostics::{HarnessError, Result, RunnerError};
pub use crate::platform::TargetBackend;
pub use crate::registry::{CaseRef, FixtureEntry, Group, Manifest, Registry};
pub use crate::runner::{run_fixture, Fixture, FixtureRunner, RunOutcome};
pub use crate::snapshot::{BaselineRunner, Renderer};
pub use crate::suite::{run_suite, SuiteOptions, SuiteReport, TestResult};

pub use miette;

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod directives;
pub mod exec;
pub mod generate;
pub mod logging;
pub mod platform;
pub mod presence;
pub mod registry;
pub mod runner;
pub mod snapshot;
pub mod suite;

/// Declares a `#[test]` that runs one registered case by name.
///
/// ```ignore
/// fixture_test!(dynamic_call, registry(), "Dynamic.testDynamicCall", runner());
/// ```
///
/// The registry and runner expressions are evaluated inside the test. A
/// failing case panics with the rendered diagnostic.
#[macro_export]
macro_rules! fixture_test {
    ($fn_name:ident, $registry:expr, $case:expr, $runner:expr) => {
        #[test]
        fn $fn_name() {
            let registry = $registry;
            let runner = $runner;
            if let Err(e) = registry.run_named($case, &runner) {
                panic!("{:?}", $crate::miette::Report::new(e));
            }
        }
    };
}
