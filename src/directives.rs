//! In-text fixture directives.
//!
//! Fixtures annotate themselves with line comments of the form
//! `// NAME` or `// NAME: value, value`. A `!` right after the slashes
//! (`//!LANGUAGE: +Feature`) is accepted as well. Only whole-line comments are
//! considered; trailing comments after code are ignored.

use std::path::{Path, PathBuf};

use miette::{NamedSource, SourceSpan};

use crate::diagnostics::{HarnessError, Result};
use crate::platform::TargetBackend;

pub const TARGET_BACKEND: &str = "TARGET_BACKEND";
pub const IGNORE_BACKEND: &str = "IGNORE_BACKEND";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub values: Vec<String>,
    /// Byte span of each value in the fixture source.
    pub spans: Vec<SourceSpan>,
    /// 1-based line number in the fixture.
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureDirectives {
    entries: Vec<Directive>,
    origin: Option<PathBuf>,
    source: String,
}

impl FixtureDirectives {
    pub fn parse(source: &str) -> Self {
        let mut entries = Vec::new();
        let mut offset = 0;
        for (idx, raw) in source.split_inclusive('\n').enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            if let Some(directive) = parse_line(line, idx + 1, offset) {
                entries.push(directive);
            }
            offset += raw.len();
        }
        Self {
            entries,
            origin: None,
            source: source.to_string(),
        }
    }

    /// Like [`FixtureDirectives::parse`], remembering where the text came from
    /// so invalid values can be reported against the file.
    pub fn parse_file(path: &Path, source: &str) -> Self {
        Self {
            origin: Some(path.to_path_buf()),
            ..Self::parse(source)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|d| d.name == name)
    }

    /// All values of every occurrence of `name`, in file order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|d| d.name == name)
            .flat_map(|d| d.values.iter().map(String::as_str))
            .collect()
    }

    pub fn target_backends(&self) -> Result<Vec<TargetBackend>> {
        self.backends(TARGET_BACKEND)
    }

    pub fn ignored_backends(&self) -> Result<Vec<TargetBackend>> {
        self.backends(IGNORE_BACKEND)
    }

    fn backends(&self, name: &str) -> Result<Vec<TargetBackend>> {
        let mut out = Vec::new();
        for directive in self.entries.iter().filter(|d| d.name == name) {
            for (value, span) in directive.values.iter().zip(&directive.spans) {
                let backend = value
                    .parse::<TargetBackend>()
                    .map_err(|_| self.invalid_value(directive, value, *span))?;
                out.push(backend);
            }
        }
        Ok(out)
    }

    fn invalid_value(&self, directive: &Directive, value: &str, span: SourceSpan) -> HarnessError {
        let path = self
            .origin
            .clone()
            .unwrap_or_else(|| PathBuf::from("<inline>"));
        HarnessError::InvalidDirective {
            src: NamedSource::new(path.display().to_string(), self.source.clone()),
            path,
            line: directive.line,
            directive: directive.name.clone(),
            value: value.to_string(),
            span,
        }
    }
}

/// `offset` is the byte offset of `line` in the whole source.
fn parse_line(line: &str, line_no: usize, offset: usize) -> Option<Directive> {
    let rest = line.trim_start().strip_prefix("//")?;
    let rest = rest.strip_prefix('!').unwrap_or(rest).trim_start();

    let name_len = rest
        .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 || !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let (name, tail) = rest.split_at(name_len);
    let tail = tail.trim_start();

    let mut values = Vec::new();
    let mut spans = Vec::new();
    match tail.strip_prefix(':') {
        Some(list) => {
            let mut pos = offset + line.len() - list.len();
            for piece in list.split(',') {
                let value = piece.trim();
                if !value.is_empty() {
                    let lead = piece.len() - piece.trim_start().len();
                    values.push(value.to_string());
                    spans.push(SourceSpan::from((pos + lead, value.len())));
                }
                pos += piece.len() + 1;
            }
        }
        None if tail.trim_end().is_empty() => {}
        // `// Something else entirely` is prose, not a directive.
        None => return None,
    }

    Some(Directive {
        name: name.to_string(),
        values,
        spans,
        line: line_no,
    })
}
