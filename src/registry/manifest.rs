//! The on-disk form of a registry.
//!
//! ```yaml
//! root: testData/ir/irJsText
//! pattern: '^(.+)\.kt$'
//! target: ANY
//! groups:
//!   - path: []
//!   - path: [dynamic]
//!     fixtures:
//!       - dynamicCall.kt
//!       - { file: invokeOperator.kt, name: testInvokeOperator }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::{HarnessError, Result};
use crate::platform::TargetBackend;

pub const DEFAULT_PATTERN: &str = r"^(.+)\.kt$";

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Fixture root, relative to the project root.
    pub root: PathBuf,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub target: TargetBackend,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixtures: Vec<FixtureSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureSpec {
    /// File name only; the test name is derived from it.
    File(String),
    Named { file: String, name: String },
}

impl FixtureSpec {
    pub fn file(&self) -> &str {
        match self {
            FixtureSpec::File(file) | FixtureSpec::Named { file, .. } => file,
        }
    }

    pub fn explicit_name(&self) -> Option<&str> {
        match self {
            FixtureSpec::File(_) => None,
            FixtureSpec::Named { name, .. } => Some(name),
        }
    }
}

impl Manifest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern: default_pattern(),
            target: TargetBackend::Any,
            groups: Vec::new(),
        }
    }

    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|source| HarnessError::ManifestParse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| HarnessError::ManifestSerialize { source })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_yaml()?).map_err(|e| HarnessError::io(path, e))
    }

    pub fn fixture_count(&self) -> usize {
        self.groups.iter().map(|g| g.fixtures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let m = Manifest::from_yaml_str("root: data\n", "inline").unwrap();
        assert_eq!(m.pattern, DEFAULT_PATTERN);
        assert_eq!(m.target, TargetBackend::Any);
        assert!(m.groups.is_empty());
    }

    #[test]
    fn mixed_fixture_forms() {
        let text = "\
root: testData/ir/irJsText
target: JS_IR
groups:
  - path: [dynamic]
    fixtures:
      - dynamicCall.kt
      - { file: invokeOperator.kt, name: testInvoke }
";
        let m = Manifest::from_yaml_str(text, "inline").unwrap();
        assert_eq!(m.target, TargetBackend::JsIr);
        let fixtures = &m.groups[0].fixtures;
        assert_eq!(fixtures[0], FixtureSpec::File("dynamicCall.kt".into()));
        assert_eq!(fixtures[1].file(), "invokeOperator.kt");
        assert_eq!(fixtures[1].explicit_name(), Some("testInvoke"));
        assert_eq!(m.fixture_count(), 2);
    }

    #[test]
    fn bad_target_is_reported() {
        let err = Manifest::from_yaml_str("root: x\ntarget: COBOL\n", "inline").unwrap_err();
        assert!(matches!(err, HarnessError::ManifestParse { .. }));
    }

    #[test]
    fn yaml_survives_a_save() {
        let mut m = Manifest::new("root");
        m.groups.push(GroupSpec {
            path: vec!["a".into()],
            fixtures: vec![FixtureSpec::File("x.kt".into())],
        });
        let back = Manifest::from_yaml_str(&m.to_yaml().unwrap(), "inline").unwrap();
        assert_eq!(back, m);
    }
}
