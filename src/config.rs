//! Harness configuration.
//!
//! Defaults come from the environment; the CLI overrides individual fields.

use std::env;
use std::path::PathBuf;

use crate::snapshot::DEFAULT_BASELINE_EXTENSION;

pub const UPDATE_SNAPSHOTS_ENV: &str = "UPDATE_SNAPSHOTS";
pub const NO_COLOR_ENV: &str = "NO_COLOR";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory manifest paths are resolved against.
    pub project_root: PathBuf,
    /// Rewrite baselines instead of failing on a mismatch.
    pub update_snapshots: bool,
    pub use_colors: bool,
    pub baseline_extension: String,
    /// Case-insensitive substring a test name must contain to run.
    pub filter: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            update_snapshots: env::var_os(UPDATE_SNAPSHOTS_ENV).is_some(),
            use_colors: env::var_os(NO_COLOR_ENV).is_none() && atty::is(atty::Stream::Stdout),
            baseline_extension: DEFAULT_BASELINE_EXTENSION.to_string(),
            filter: None,
        }
    }
}

impl HarnessConfig {
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.map(|f| f.to_lowercase());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_stored_lowercase() {
        let config = HarnessConfig::default()
            .with_project_root("/work")
            .with_filter(Some("Dynamic.testDynamicCall".into()));
        assert_eq!(config.filter.as_deref(), Some("dynamic.testdynamiccall"));
        assert_eq!(config.project_root, PathBuf::from("/work"));
        assert_eq!(config.baseline_extension, "txt");
    }
}
