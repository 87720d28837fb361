//! Backend-target markers.
//!
//! A fixture registry dispatches every fixture with one constant marker. `ANY`
//! means the fixture is backend-independent; the concrete markers only matter
//! when a fixture narrows itself down with `TARGET_BACKEND` or
//! `IGNORE_BACKEND` directives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diagnostics::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetBackend {
    #[default]
    Any,
    Jvm,
    JvmIr,
    Js,
    JsIr,
    JsIrEs6,
    Native,
    Wasm,
}

impl TargetBackend {
    pub const ALL: [TargetBackend; 8] = [
        TargetBackend::Any,
        TargetBackend::Jvm,
        TargetBackend::JvmIr,
        TargetBackend::Js,
        TargetBackend::JsIr,
        TargetBackend::JsIrEs6,
        TargetBackend::Native,
        TargetBackend::Wasm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetBackend::Any => "ANY",
            TargetBackend::Jvm => "JVM",
            TargetBackend::JvmIr => "JVM_IR",
            TargetBackend::Js => "JS",
            TargetBackend::JsIr => "JS_IR",
            TargetBackend::JsIrEs6 => "JS_IR_ES6",
            TargetBackend::Native => "NATIVE",
            TargetBackend::Wasm => "WASM",
        }
    }

    /// The backend this one is a refinement of, if any.
    pub fn compatible_with(&self) -> Option<TargetBackend> {
        match self {
            TargetBackend::JvmIr => Some(TargetBackend::Jvm),
            TargetBackend::JsIr => Some(TargetBackend::Js),
            TargetBackend::JsIrEs6 => Some(TargetBackend::JsIr),
            _ => None,
        }
    }

    /// Walks the refinement chain starting at `self`.
    pub fn lineage(self) -> impl Iterator<Item = TargetBackend> {
        std::iter::successors(Some(self), |b| b.compatible_with())
    }

    /// Whether a fixture restricted to `backends` may run against `self`.
    ///
    /// `ANY` accepts every fixture, and an empty restriction list accepts every
    /// target.
    pub fn accepts(&self, backends: &[TargetBackend]) -> bool {
        if *self == TargetBackend::Any
            || backends.is_empty()
            || backends.contains(&TargetBackend::Any)
        {
            return true;
        }
        self.lineage().any(|b| backends.contains(&b))
    }

    /// Whether an `IGNORE_BACKEND` list mutes `self`.
    pub fn is_ignored_by(&self, ignored: &[TargetBackend]) -> bool {
        if *self == TargetBackend::Any {
            return ignored.contains(&TargetBackend::Any);
        }
        ignored.contains(&TargetBackend::Any) || self.lineage().any(|b| ignored.contains(&b))
    }
}

impl fmt::Display for TargetBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetBackend {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TargetBackend::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HarnessError::InvalidBackend {
                value: wanted.to_string(),
            })
    }
}

impl TryFrom<String> for TargetBackend {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetBackend> for String {
    fn from(value: TargetBackend) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("js_ir".parse::<TargetBackend>().unwrap(), TargetBackend::JsIr);
        assert_eq!(" ANY ".parse::<TargetBackend>().unwrap(), TargetBackend::Any);
        assert!("LLVM".parse::<TargetBackend>().is_err());
    }

    #[test]
    fn any_accepts_everything() {
        assert!(TargetBackend::Any.accepts(&[TargetBackend::Jvm]));
        assert!(TargetBackend::Any.accepts(&[]));
    }

    #[test]
    fn refinements_accept_their_parents() {
        assert!(TargetBackend::JsIrEs6.accepts(&[TargetBackend::Js]));
        assert!(TargetBackend::JsIr.accepts(&[TargetBackend::JsIr]));
        assert!(!TargetBackend::Js.accepts(&[TargetBackend::JsIr]));
        assert!(!TargetBackend::Jvm.accepts(&[TargetBackend::Js]));
    }

    #[test]
    fn any_is_only_muted_by_any() {
        assert!(!TargetBackend::Any.is_ignored_by(&[TargetBackend::Js]));
        assert!(TargetBackend::Any.is_ignored_by(&[TargetBackend::Any]));
        assert!(TargetBackend::JsIr.is_ignored_by(&[TargetBackend::Js]));
        assert!(TargetBackend::Native.is_ignored_by(&[TargetBackend::Any]));
    }
}
