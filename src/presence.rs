//! Presence checks: every fixture on disk has a registry entry and every
//! registry entry has a fixture on disk.
//!
//! A check only compares files directly inside its directory. Subdirectories
//! are groups of their own and carry their own check; a check only verifies
//! that every subdirectory holding fixtures has such a group.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::diagnostics::{HarnessError, Result};
use crate::directives::FixtureDirectives;
use crate::platform::TargetBackend;

#[derive(Debug, Clone)]
pub struct PresenceCheck<'a> {
    /// Name of the check, e.g. `testAllFilesPresentInDynamic`.
    pub name: &'a str,
    /// Group label used in failure messages.
    pub group: String,
    pub directory: PathBuf,
    pub pattern: &'a Regex,
    pub target: TargetBackend,
    /// File names registered for this directory.
    pub registered: BTreeSet<&'a str>,
    /// Names of the subdirectories registered as child groups.
    pub child_groups: BTreeSet<&'a str>,
}

/// Lists the fixture files directly inside `directory` whose names match
/// `pattern`, sorted by name.
pub fn list_fixture_files(directory: &Path, pattern: &Regex) -> Result<BTreeSet<String>> {
    if !directory.is_dir() {
        return Err(HarnessError::FixtureNotFound {
            path: directory.to_path_buf(),
        });
    }
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| HarnessError::Walk { source })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if pattern.is_match(name) {
            files.insert(name.to_string());
        }
    }
    Ok(files)
}

/// Names of the direct subdirectories of `directory` that contain a fixture
/// for `target` at any depth.
pub fn list_fixture_dirs(
    directory: &Path,
    pattern: &Regex,
    target: TargetBackend,
) -> Result<BTreeSet<String>> {
    let mut dirs = BTreeSet::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| HarnessError::Walk { source })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if holds_fixtures(entry.path(), pattern, target)? {
            dirs.insert(name.to_string());
        }
    }
    Ok(dirs)
}

fn holds_fixtures(directory: &Path, pattern: &Regex, target: TargetBackend) -> Result<bool> {
    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| HarnessError::Walk { source })?;
        let matches = entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(|n| pattern.is_match(n));
        if matches && targets_backend(entry.path(), target)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Fails with [`HarnessError::FixtureDrift`] unless the fixtures on disk and
/// the registered fixtures of `check.directory` are the same set, and every
/// subdirectory holding fixtures is a registered child group.
///
/// Unregistered files whose `TARGET_BACKEND` directive rules out the check's
/// target are not expected to be registered and are ignored.
pub fn check_all_fixtures_registered(check: &PresenceCheck<'_>) -> Result<()> {
    let on_disk = list_fixture_files(&check.directory, check.pattern)?;

    let mut unregistered = Vec::new();
    for name in on_disk.iter().filter(|n| !check.registered.contains(n.as_str())) {
        if targets_backend(&check.directory.join(name), check.target)? {
            unregistered.push(name.clone());
        } else {
            tracing::debug!(fixture = %name, backend = %check.target, "skipping fixture for another backend");
        }
    }
    let missing: Vec<String> = check
        .registered
        .iter()
        .filter(|n| !on_disk.contains(**n))
        .map(|n| n.to_string())
        .collect();
    let unregistered_groups: Vec<String> =
        list_fixture_dirs(&check.directory, check.pattern, check.target)?
            .into_iter()
            .filter(|d| !check.child_groups.contains(d.as_str()))
            .collect();

    if unregistered.is_empty() && missing.is_empty() && unregistered_groups.is_empty() {
        tracing::debug!(check = check.name, files = on_disk.len(), "presence check passed");
        return Ok(());
    }

    tracing::warn!(
        check = check.name,
        unregistered = unregistered.len(),
        missing = missing.len(),
        unregistered_groups = unregistered_groups.len(),
        "fixture directory drifted from the registry"
    );
    Err(HarnessError::FixtureDrift {
        group: check.group.clone(),
        check: check.name.to_string(),
        directory: check.directory.clone(),
        unregistered,
        missing,
        unregistered_groups,
    })
}

fn targets_backend(path: &Path, target: TargetBackend) -> Result<bool> {
    if target == TargetBackend::Any {
        return Ok(true);
    }
    let source = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    let backends = FixtureDirectives::parse_file(path, &source).target_backends()?;
    Ok(target.accepts(&backends))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn check<'a>(dir: &Path, pattern: &'a Regex, registered: &[&'a str]) -> PresenceCheck<'a> {
        PresenceCheck {
            name: "testAllFilesPresentInDynamic",
            group: "dynamic".to_string(),
            directory: dir.to_path_buf(),
            pattern,
            target: TargetBackend::Any,
            registered: registered.iter().copied().collect(),
            child_groups: BTreeSet::new(),
        }
    }

    #[test]
    fn listing_is_direct_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.kt", "");
        write(tmp.path(), "a.txt", "");
        fs::create_dir(tmp.path().join("nested")).unwrap();
        write(&tmp.path().join("nested"), "b.kt", "");
        let re = Regex::new(r"^(.+)\.kt$").unwrap();
        let files = list_fixture_files(tmp.path(), &re).unwrap();
        assert_eq!(files.into_iter().collect::<Vec<_>>(), ["a.kt"]);
    }

    #[test]
    fn exact_cover_passes() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.kt", "");
        write(tmp.path(), "b.kt", "");
        let re = Regex::new(r"^(.+)\.kt$").unwrap();
        assert!(check_all_fixtures_registered(&check(tmp.path(), &re, &["a.kt", "b.kt"])).is_ok());
    }

    #[test]
    fn reports_both_directions() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.kt", "");
        write(tmp.path(), "new.kt", "");
        let re = Regex::new(r"^(.+)\.kt$").unwrap();
        let err = check_all_fixtures_registered(&check(tmp.path(), &re, &["a.kt", "gone.kt"]))
            .unwrap_err();
        match err {
            HarnessError::FixtureDrift {
                unregistered,
                missing,
                check,
                ..
            } => {
                assert_eq!(unregistered, ["new.kt"]);
                assert_eq!(missing, ["gone.kt"]);
                assert_eq!(check, "testAllFilesPresentInDynamic");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn other_backend_fixtures_are_not_required() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "jvmOnly.kt", "// TARGET_BACKEND: JVM\nfun f() {}\n");
        let re = Regex::new(r"^(.+)\.kt$").unwrap();
        let mut c = check(tmp.path(), &re, &[]);
        c.target = TargetBackend::JsIr;
        assert!(check_all_fixtures_registered(&c).is_ok());
        c.target = TargetBackend::JvmIr;
        assert!(check_all_fixtures_registered(&c).is_err());
    }

    #[test]
    fn subdirectory_with_fixtures_needs_a_group() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.kt", "");
        fs::create_dir_all(tmp.path().join("brandNew/deeper")).unwrap();
        write(&tmp.path().join("brandNew/deeper"), "x.kt", "");
        fs::create_dir(tmp.path().join("notes")).unwrap();
        write(&tmp.path().join("notes"), "readme.md", "");
        let re = Regex::new(r"^(.+)\.kt$").unwrap();

        let mut c = check(tmp.path(), &re, &["a.kt"]);
        match check_all_fixtures_registered(&c).unwrap_err() {
            HarnessError::FixtureDrift {
                unregistered,
                missing,
                unregistered_groups,
                ..
            } => {
                assert!(unregistered.is_empty() && missing.is_empty());
                assert_eq!(unregistered_groups, ["brandNew"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        c.child_groups.insert("brandNew");
        assert!(check_all_fixtures_registered(&c).is_ok());
    }

    #[test]
    fn subdirectory_for_other_backend_needs_no_group() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("jvm")).unwrap();
        write(&tmp.path().join("jvm"), "box.kt", "// TARGET_BACKEND: JVM\n");
        let re = Regex::new(r"^(.+)\.kt$").unwrap();
        let mut c = check(tmp.path(), &re, &[]);
        c.target = TargetBackend::JsIr;
        assert!(check_all_fixtures_registered(&c).is_ok());
        c.target = TargetBackend::Any;
        assert!(check_all_fixtures_registered(&c).is_err());
    }

    #[test]
    fn missing_directory_is_not_found() {
        let re = Regex::new(r"^(.+)\.kt$").unwrap();
        let c = check(Path::new("/definitely/not/here"), &re, &[]);
        assert!(matches!(
            check_all_fixtures_registered(&c),
            Err(HarnessError::FixtureNotFound { .. })
        ));
    }
}
