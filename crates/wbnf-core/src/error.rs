//! The error kinds shared across the grammar engine.
//!
//! Grounded on the teacher's per-crate `thiserror` enums (e.g. `plotnik_lib::Error`,
//! `compile::CompileError`): one flat enum per concern, no nested error trees.

use crate::rule::Rule;

/// Errors produced anywhere in the grammar engine.
///
/// `ParseFailure` and `UnconsumedInput` are recoverable internally by the
/// `Oneof`/`Quant` drivers and only ever surface to a caller as the final
/// outcome of a whole parse. `BadInput` and `Inconceivable` are programmer
/// errors: a malformed grammar, or a branch the code structurally proves
/// unreachable.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("expected {expected} at byte {position} while parsing {rule}")]
    ParseFailure { rule: Rule, position: usize, expected: String },

    #[error("unconsumed input at byte {position}: {context}")]
    UnconsumedInput { position: usize, context: String },

    #[error("validation failed for {rule} at {path}: {reason}")]
    ValidationFailure { rule: Rule, path: String, reason: String },

    #[error("bad grammar input: {0}")]
    BadInput(String),

    #[error("inconceivable: {0}")]
    Inconceivable(String),
}

impl Error {
    pub fn parse_failure(rule: &Rule, position: usize, expected: impl Into<String>) -> Self {
        Error::ParseFailure { rule: rule.clone(), position, expected: expected.into() }
    }

    pub fn validation_failure(rule: &Rule, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ValidationFailure { rule: rule.clone(), path: path.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
