//! Test and group naming rules.
//!
//! Names follow the conventions of generated test classes: a fixture
//! `dynamicCall.kt` becomes `testDynamicCall`, a directory `dynamic` becomes
//! the group `Dynamic` whose presence check is `testAllFilesPresentInDynamic`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::{HarnessError, Result};
use crate::registry::manifest::DEFAULT_PATTERN;

static DEFAULT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_PATTERN).expect("default fixture pattern is valid"));

pub const TEST_PREFIX: &str = "test";
pub const PRESENCE_PREFIX: &str = "testAllFilesPresentIn";

/// Replaces every character that cannot appear in an identifier with `_`,
/// and prefixes `_` when the first character cannot start one.
pub fn escape_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) || out.is_empty() {
        out.insert(0, '_');
    }
    out
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The part of a file name the test name is built from: the first capture
/// group of `pattern` when it has one, otherwise the whole match.
pub fn fixture_stem<'a>(file_name: &'a str, pattern: &Regex) -> Option<&'a str> {
    let caps = pattern.captures(file_name)?;
    caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
}

pub fn test_name_for(file_name: &str, pattern: &Regex) -> Option<String> {
    fixture_stem(file_name, pattern)
        .map(|stem| format!("{TEST_PREFIX}{}", capitalize(&escape_identifier(stem))))
}

/// Compiles a fixture pattern, reusing the shared default when possible.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    if pattern == DEFAULT_PATTERN {
        return Ok(DEFAULT_REGEX.clone());
    }
    Regex::new(pattern).map_err(|source| HarnessError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

pub fn group_class_name(segment: &str) -> String {
    capitalize(&escape_identifier(segment))
}

pub fn presence_check_name(class_name: &str) -> String {
    format!("{PRESENCE_PREFIX}{class_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kt() -> Regex {
        compile_pattern(DEFAULT_PATTERN).unwrap()
    }

    #[test]
    fn derives_generated_style_names() {
        assert_eq!(test_name_for("dynamicCall.kt", &kt()).as_deref(), Some("testDynamicCall"));
        assert_eq!(
            test_name_for("nativeNativeKotlin.kt", &kt()).as_deref(),
            Some("testNativeNativeKotlin")
        );
        assert_eq!(test_name_for("kt-1234.kt", &kt()).as_deref(), Some("testKt_1234"));
        assert_eq!(test_name_for("1st.kt", &kt()).as_deref(), Some("test_1st"));
        assert_eq!(test_name_for("notes.txt", &kt()), None);
    }

    #[test]
    fn group_names() {
        assert_eq!(group_class_name("dynamic"), "Dynamic");
        assert_eq!(group_class_name("irJsText"), "IrJsText");
        assert_eq!(presence_check_name("Dynamic"), "testAllFilesPresentInDynamic");
    }

    #[test]
    fn rejects_invalid_pattern() {
        assert!(matches!(
            compile_pattern("(unclosed"),
            Err(HarnessError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn stem_without_capture_group_uses_whole_match() {
        let re = Regex::new(r"^\w+").unwrap();
        assert_eq!(fixture_stem("abc.kt", &re), Some("abc"));
    }
}
