//! Shared helpers for the integration tests: the shipped irJsText registry and
//! scratch copies of it that tests can add or remove files in.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fixture_registry::{Fixture, Registry, RunnerError, TargetBackend};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const MANIFEST: &str = "testData/irJsText.fixtures.yaml";
pub const FIXTURE_ROOT: &str = "testData/ir/irJsText";

pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn shipped_registry() -> Registry {
    let root = project_root();
    Registry::load(root.join(MANIFEST), root).unwrap()
}

/// Copies the manifest and the fixture tree into a fresh directory laid out
/// like the project root.
pub fn scratch_project() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let src = project_root();
    for entry in WalkDir::new(src.join(FIXTURE_ROOT)) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(&src).unwrap();
        let dest = tmp.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    fs::create_dir_all(tmp.path().join("testData")).unwrap();
    fs::copy(src.join(MANIFEST), tmp.path().join(MANIFEST)).unwrap();
    tmp
}

pub fn scratch_registry(project: &Path) -> Registry {
    Registry::load(project.join(MANIFEST), project).unwrap()
}

pub fn fixture_path(project: &Path, group: &str, file: &str) -> PathBuf {
    project.join(FIXTURE_ROOT).join(group).join(file)
}

/// Passes every fixture that has any content.
pub fn non_empty(fixture: &Fixture, _target: TargetBackend) -> Result<(), RunnerError> {
    if fixture.source.trim().is_empty() {
        return Err(format!("{} is empty", fixture.path.display()).into());
    }
    Ok(())
}

/// Fails every fixture.
pub fn always_fails(fixture: &Fixture, _target: TargetBackend) -> Result<(), RunnerError> {
    Err(format!("cannot compile {}", fixture.test_name).into())
}

/// A stand-in IR dump: one `FUN` line per top-level function.
pub fn function_dump(fixture: &Fixture, target: TargetBackend) -> Result<String, RunnerError> {
    let mut out = format!("FILE {} target:{target}\n", fixture.test_name);
    for line in fixture.source.lines() {
        if let Some(rest) = line.strip_prefix("fun ") {
            let name = rest.split(['(', '<']).next().unwrap_or(rest);
            out.push_str(&format!("  FUN name:{name}\n"));
        }
    }
    Ok(out)
}
