//! The fixture registry: a static, ordered table of fixtures grouped by
//! directory.
//!
//! A [`Registry`] is built once from a [`Manifest`] and never changes
//! afterwards. Each [`FixtureEntry`] is one test case; each [`Group`] owns one
//! presence check that compares the entries registered for its directory
//! against a direct listing of that directory.

pub mod manifest;
pub mod naming;

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::diagnostics::{HarnessError, Result};
use crate::platform::TargetBackend;
use crate::presence::{check_all_fixtures_registered, PresenceCheck};
use crate::runner::{run_fixture, FixtureRunner, RunOutcome};

pub use manifest::{FixtureSpec, GroupSpec, Manifest, DEFAULT_PATTERN};

/// One registered fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureEntry {
    pub test_name: String,
    /// Path of the fixture relative to the project root.
    pub relative_path: PathBuf,
    /// Directory segments below the registry root; empty for the root group.
    pub group_path: Vec<String>,
}

impl FixtureEntry {
    pub fn file_name(&self) -> &str {
        self.relative_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// A directory level of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub path: Vec<String>,
    /// Directory relative to the project root.
    pub directory: PathBuf,
    pub class_name: String,
    pub presence_check: String,
}

impl Group {
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// `dynamic/nested` style label, `.` for the root.
    pub fn label(&self) -> String {
        if self.path.is_empty() {
            ".".to_string()
        } else {
            self.path.join("/")
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.class_name)
    }
}

/// Whether a registered case is a fixture run or a presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseRef<'a> {
    Fixture(&'a FixtureEntry),
    Presence(&'a Group),
}

#[derive(Debug, Clone)]
pub struct Registry {
    project_root: PathBuf,
    root: PathBuf,
    pattern: Regex,
    target: TargetBackend,
    groups: Vec<Group>,
    entries: Vec<FixtureEntry>,
}

impl Registry {
    /// Builds a registry from a manifest. Relative paths in the manifest are
    /// resolved against `project_root` when fixtures are located.
    pub fn from_manifest(manifest: &Manifest, project_root: impl Into<PathBuf>) -> Result<Self> {
        let pattern = naming::compile_pattern(&manifest.pattern)?;
        let root = manifest.root.clone();
        let root_class = naming::group_class_name(
            root.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("root"),
        );

        let mut groups: Vec<Group> = Vec::new();
        let mut declared: HashSet<Vec<String>> = HashSet::new();
        let mut entries = Vec::new();

        for spec in &manifest.groups {
            if !declared.insert(spec.path.clone()) {
                let group = make_group(&root, &root_class, &spec.path);
                return Err(HarnessError::DuplicateTestName {
                    group: group.label(),
                    test_name: group.presence_check,
                });
            }
            // Ancestors are implied so every directory level keeps its check.
            for depth in 0..=spec.path.len() {
                let prefix = &spec.path[..depth];
                if !groups.iter().any(|g| g.path == prefix) {
                    let group = make_group(&root, &root_class, prefix);
                    reject_class_collision(&groups, &group)?;
                    groups.push(group);
                }
            }
            let group = groups
                .iter()
                .find(|g| g.path == spec.path)
                .cloned()
                .ok_or_else(|| HarnessError::UnknownGroup {
                    group: spec.path.join("/"),
                    file: String::new(),
                })?;

            let mut names: HashSet<String> = HashSet::new();
            names.insert(group.presence_check.clone());
            for fixture in &spec.fixtures {
                let entry = make_entry(&group, fixture, &pattern)?;
                if !names.insert(entry.test_name.clone()) {
                    return Err(HarnessError::DuplicateTestName {
                        group: group.label(),
                        test_name: entry.test_name,
                    });
                }
                entries.push(entry);
            }
        }

        if groups.is_empty() {
            groups.push(make_group(&root, &root_class, &[]));
        }

        tracing::debug!(
            root = %root.display(),
            groups = groups.len(),
            fixtures = entries.len(),
            "fixture registry built"
        );

        Ok(Self {
            project_root: project_root.into(),
            root,
            pattern,
            target: manifest.target,
            groups,
            entries,
        })
    }

    /// Parses a manifest embedded in the binary, typically via `include_str!`.
    pub fn from_yaml_str(
        text: &str,
        origin: &str,
        project_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        Self::from_manifest(&Manifest::from_yaml_str(text, origin)?, project_root)
    }

    pub fn load(manifest_path: impl AsRef<Path>, project_root: impl Into<PathBuf>) -> Result<Self> {
        Self::from_manifest(&Manifest::load(manifest_path)?, project_root)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn target(&self) -> TargetBackend {
        self.target
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn entries(&self) -> &[FixtureEntry] {
        &self.entries
    }

    pub fn group(&self, path: &[String]) -> Option<&Group> {
        self.groups.iter().find(|g| g.path == path)
    }

    pub fn entries_in<'a>(&'a self, group: &'a Group) -> impl Iterator<Item = &'a FixtureEntry> {
        self.entries.iter().filter(move |e| e.group_path == group.path)
    }

    /// Dotted name of a case: `Dynamic.testDynamicCall`, or just the test name
    /// for cases of the root group.
    pub fn qualified_name(&self, case: CaseRef<'_>) -> String {
        let (path, name) = match case {
            CaseRef::Fixture(e) => (&e.group_path, &e.test_name),
            CaseRef::Presence(g) => (&g.path, &g.presence_check),
        };
        let mut parts: Vec<String> = path.iter().map(|s| naming::group_class_name(s)).collect();
        parts.push(name.clone());
        parts.join(".")
    }

    /// Looks a case up by plain or qualified name. A plain name resolves to
    /// the first match in declaration order, presence checks first.
    pub fn find(&self, name: &str) -> Option<CaseRef<'_>> {
        let mut cases = self
            .groups
            .iter()
            .map(CaseRef::Presence)
            .chain(self.entries.iter().map(CaseRef::Fixture));
        if name.contains('.') {
            cases.find(|c| self.qualified_name(*c) == name)
        } else {
            cases.find(|c| match c {
                CaseRef::Fixture(e) => e.test_name == name,
                CaseRef::Presence(g) => g.presence_check == name,
            })
        }
    }

    /// Absolute (or project-relative) location of a fixture.
    pub fn resolve(&self, entry: &FixtureEntry) -> PathBuf {
        self.project_root.join(&entry.relative_path)
    }

    /// The one test case of `entry`: dispatch its fixture to `runner` with the
    /// registry's platform marker.
    pub fn run_entry<R: FixtureRunner + ?Sized>(
        &self,
        entry: &FixtureEntry,
        runner: &R,
    ) -> Result<RunOutcome> {
        run_fixture(&entry.test_name, &self.resolve(entry), self.target, runner)
    }

    /// The presence check of `group`.
    pub fn check_group(&self, group: &Group) -> Result<()> {
        let registered: BTreeSet<&str> = self.entries_in(group).map(|e| e.file_name()).collect();
        let child_groups: BTreeSet<&str> = self
            .groups
            .iter()
            .filter(|g| g.path.len() == group.path.len() + 1 && g.path.starts_with(&group.path))
            .filter_map(|g| g.path.last().map(String::as_str))
            .collect();
        let check = PresenceCheck {
            name: &group.presence_check,
            group: group.label(),
            directory: self.project_root.join(&group.directory),
            pattern: &self.pattern,
            target: self.target,
            registered,
            child_groups,
        };
        check_all_fixtures_registered(&check)
    }

    /// Runs one case, whichever kind it is.
    pub fn run_case<R: FixtureRunner + ?Sized>(
        &self,
        case: CaseRef<'_>,
        runner: &R,
    ) -> Result<RunOutcome> {
        match case {
            CaseRef::Fixture(entry) => self.run_entry(entry, runner),
            CaseRef::Presence(group) => self.check_group(group).map(|_| RunOutcome::Passed),
        }
    }

    /// Runs a case by name, whichever kind it is.
    pub fn run_named<R: FixtureRunner + ?Sized>(&self, name: &str, runner: &R) -> Result<RunOutcome> {
        match self.find(name) {
            Some(case) => self.run_case(case, runner),
            None => Err(HarnessError::UnknownTest {
                test_name: name.to_string(),
            }),
        }
    }

    /// Every case in declaration order: each group's presence check followed
    /// by the group's fixtures.
    pub fn cases(&self) -> Vec<CaseRef<'_>> {
        let mut out = Vec::with_capacity(self.groups.len() + self.entries.len());
        for group in &self.groups {
            out.push(CaseRef::Presence(group));
            out.extend(self.entries_in(group).map(CaseRef::Fixture));
        }
        out
    }
}

fn make_group(root: &Path, root_class: &str, path: &[String]) -> Group {
    let class_name = match path.last() {
        Some(segment) => naming::group_class_name(segment),
        None => root_class.to_string(),
    };
    let directory = path.iter().fold(root.to_path_buf(), |dir, seg| dir.join(seg));
    Group {
        path: path.to_vec(),
        directory,
        presence_check: naming::presence_check_name(&class_name),
        class_name,
    }
}

/// Sibling directories whose names escape to the same class (`a-b`, `a_b`)
/// would share qualified names.
fn reject_class_collision(groups: &[Group], group: &Group) -> Result<()> {
    let Some((_, parent)) = group.path.split_last() else {
        return Ok(());
    };
    let clash = groups.iter().find(|g| {
        g.class_name == group.class_name && g.path.split_last().map(|(_, p)| p) == Some(parent)
    });
    match clash {
        Some(existing) => Err(HarnessError::GroupNameCollision {
            class_name: group.class_name.clone(),
            first: existing.label(),
            second: group.label(),
        }),
        None => Ok(()),
    }
}

fn make_entry(group: &Group, spec: &FixtureSpec, pattern: &Regex) -> Result<FixtureEntry> {
    let file = spec.file();
    if file.contains(['/', '\\']) {
        return Err(HarnessError::UnknownGroup {
            group: group.label(),
            file: file.to_string(),
        });
    }
    let derived = naming::test_name_for(file, pattern).ok_or_else(|| {
        HarnessError::PatternMismatch {
            file: file.to_string(),
            pattern: pattern.as_str().to_string(),
        }
    })?;
    let test_name = spec.explicit_name().map(str::to_string).unwrap_or(derived);
    Ok(FixtureEntry {
        test_name,
        relative_path: group.directory.join(file),
        group_path: group.path.clone(),
    })
}
