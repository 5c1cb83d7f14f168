//! Rule names: a cheap, independently-constructible string handle keying a
//! [`crate::grammar::Grammar`] (grammars are usually built as Rust literals,
//! not through a shared interner, so `Rule` wraps an `Arc<str>` rather than
//! an index into one).

use std::fmt;
use std::sync::Arc;

/// The name of a grammar rule.
///
/// Rules whose name starts with `.` are special (only `.wrapRE` is defined by this
/// crate). Rules matching `[A-Z_][A-Z0-9_]*` are terminal rules by convention.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Rule(Arc<str>);

impl Rule {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rules beginning with `.` are special (only `.wrapRE` is defined).
    pub fn is_special(&self) -> bool {
        self.0.starts_with('.')
    }

    /// Terminal rules are uppercase by convention and are exempt from `.wrapRE` wrapping.
    pub fn is_terminal(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_ascii_uppercase() => {}
            _ => return false,
        }
        chars.all(|c| c == '_' || c.is_ascii_uppercase() || c.is_ascii_digit())
    }
}

impl From<&str> for Rule {
    fn from(name: &str) -> Self {
        Rule::new(name)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({:?})", self.0)
    }
}

/// A special rule name reserved for the regex/literal wrapping prefix/suffix.
pub const WRAP_RE: &str = ".wrapRE";
