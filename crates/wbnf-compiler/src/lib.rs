//! Compiles `wbnf_core::Grammar` values into runnable parsers, runs them, and
//! lifts/validates/diffs the results.
//!
//! `compile` desugars `Stack` into precedence-level rules and wraps literals
//! with the grammar's `.wrapRE` pattern; `engine` interprets the desugared
//! terms against a `Scanner`; `ast` converts between the raw `ParserNode` the
//! engine produces and the name-keyed `BranchNode` callers actually want;
//! `unparse` walks a `ParserNode` back to text; `diff` backs the self-hosting
//! bootstrap check that lives in `wbnf`.

pub mod ast;
pub mod compile;
pub mod config;
pub mod desugar;
pub mod diff;
pub mod engine;
pub mod singletons;
pub mod unparse;
pub mod wrap;

pub use compile::{compile as compile_grammar, Parsers};
pub use config::ParseOptions;
pub use diff::{diff as diff_grammars, Mismatch};
pub use singletons::PathSet;
