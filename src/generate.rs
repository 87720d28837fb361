//! Regenerating a manifest from the fixture tree.
//!
//! Every directory below the root that holds a fixture at any depth becomes a
//! group, every matching file a fixture. Groups come out in path order with
//! the root first and fixtures are sorted by file name, so regenerating an unchanged tree gives an identical
//! manifest.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use regex::Regex;
use walkdir::WalkDir;

use crate::diagnostics::{HarnessError, Result};
use crate::directives::FixtureDirectives;
use crate::platform::TargetBackend;
use crate::registry::naming;
use crate::registry::{FixtureSpec, GroupSpec, Manifest};

/// Scans `project_root/root` and returns the manifest describing it. `root`
/// is recorded relative to the project root.
pub fn generate_manifest(
    project_root: &Path,
    root: &Path,
    pattern: &str,
    target: TargetBackend,
) -> Result<Manifest> {
    let regex = naming::compile_pattern(pattern)?;
    let base = project_root.join(root);
    if !base.is_dir() {
        return Err(HarnessError::FixtureNotFound { path: base });
    }

    let mut groups: BTreeMap<Vec<String>, Vec<String>> = BTreeMap::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|source| HarnessError::Walk { source })?;
        let rel = entry.path().strip_prefix(&base).unwrap_or(entry.path());
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if entry.file_type().is_dir() {
            groups.entry(segments).or_default();
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let Some((file, dir)) = segments.split_last() else {
            continue;
        };
        if !regex.is_match(file) || !is_registered_for(entry.path(), target)? {
            continue;
        }
        groups.entry(dir.to_vec()).or_default().push(file.clone());
    }

    // Directories without fixtures anywhere below them get no group; the root
    // always keeps one.
    let populated: Vec<Vec<String>> = groups
        .iter()
        .filter(|(_, files)| !files.is_empty())
        .map(|(path, _)| path.clone())
        .collect();
    groups.retain(|path, _| path.is_empty() || populated.iter().any(|p| p.starts_with(path)));

    let groups = groups
        .into_iter()
        .map(|(path, mut files)| {
            files.sort();
            GroupSpec {
                fixtures: disambiguate(&files, &regex),
                path,
            }
        })
        .collect::<Vec<_>>();

    let manifest = Manifest {
        root: root.to_path_buf(),
        pattern: pattern.to_string(),
        target,
        groups,
    };
    tracing::info!(
        root = %root.display(),
        groups = manifest.groups.len(),
        fixtures = manifest.fixture_count(),
        "manifest generated"
    );
    Ok(manifest)
}

fn is_registered_for(path: &Path, target: TargetBackend) -> Result<bool> {
    if target == TargetBackend::Any {
        return Ok(true);
    }
    let source = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(target.accepts(&FixtureDirectives::parse_file(path, &source).target_backends()?))
}

/// Derived test names can collide (`a-b.kt` and `a_b.kt`); later files get a
/// numbered explicit name.
fn disambiguate(files: &[String], regex: &Regex) -> Vec<FixtureSpec> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    files
        .iter()
        .map(|file| {
            let name = naming::test_name_for(file, regex).unwrap_or_default();
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                FixtureSpec::File(file.clone())
            } else {
                FixtureSpec::Named {
                    file: file.clone(),
                    name: format!("{name}_{count}"),
                }
            }
        })
        .collect()
}
