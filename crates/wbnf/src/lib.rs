//! wbnf: a self-describing grammar engine.
//!
//! A grammar written in wbnf's own extended-BNF notation compiles into an
//! executable [`wbnf_compiler::Parsers`] bundle: one parser per rule, a
//! validator, an unparser, and a diff against another grammar. The notation
//! is itself a wbnf grammar — [`bootstrap::core`] hand-builds it, parses its
//! own textual form with itself, and checks the two representations agree
//! before any caller ever touches it.
//!
//! - `bootstrap` — the grammar of grammars and its self-consistency check
//! - `surface` — `Grammar::parse_text`, the entry point from source text
//! - `diagnostics` — renders an `Error` against its source as a snippet

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod bootstrap;
pub mod diagnostics;
pub mod surface;

pub use diagnostics::DiagnosticPrinter;
pub use surface::GrammarExt;
pub use wbnf_compiler::{compile_grammar, diff_grammars, Mismatch, ParseOptions, Parsers, PathSet};
pub use wbnf_core::{
    any, eq, l2r, non_assoc, opt, r2l, some, Associativity, BranchNode, Child, Delim, Error,
    Grammar, Leaf, Named, ParserNode, Quant, Result, Rule, Scanner, Term, ANON_KEY, AT,
};
