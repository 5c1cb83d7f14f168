//! The public entry point for turning wbnf source text into a [`Grammar`]:
//! parse it under [`bootstrap::core`] and interpret the parse with
//! [`bootstrap::build_grammar`].

use wbnf_compiler::{compile_grammar, ParseOptions, Parsers};
use wbnf_core::{Error, Grammar, Rule};

use crate::bootstrap;

/// Extension methods on [`Grammar`] for moving between wbnf source text and
/// the term algebra, since `Grammar` itself lives in `wbnf-core` and cannot
/// carry inherent methods that depend on the bootstrap grammar.
pub trait GrammarExt: Sized {
    fn parse_text(src: &str) -> Result<Self, Error>;
    fn compile_with(&self, options: ParseOptions) -> Result<Parsers, Error>;
    fn compile(&self) -> Result<Parsers, Error> {
        self.compile_with(ParseOptions::default())
    }
}

impl GrammarExt for Grammar {
    fn parse_text(src: &str) -> Result<Grammar, Error> {
        let parsers = bootstrap::core();
        let node = parsers.parse(&Rule::new("grammar"), src.to_string())?;
        bootstrap::build_grammar(parsers, &node)
    }

    fn compile_with(&self, options: ParseOptions) -> Result<Parsers, Error> {
        compile_grammar(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_two_rule_grammar_from_text() {
        let grammar = Grammar::parse_text(r#"digits -> /{[0-9]+}; expr -> digits "+" digits;"#).unwrap();
        assert!(grammar.contains_rule(&Rule::new("digits")));
        assert!(grammar.contains_rule(&Rule::new("expr")));
    }

    #[test]
    fn a_parsed_grammar_compiles_and_runs() {
        let grammar = Grammar::parse_text(r#"num -> /{[0-9]+};"#).unwrap();
        let parsers = grammar.compile().unwrap();
        let node = parsers.parse(&Rule::new("num"), "42").unwrap();
        assert_eq!(node.text(), Some("42"));
    }
}
