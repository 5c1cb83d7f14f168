//! The parser engine: walks a compiled [`Parsers`] bundle's resolved terms
//! against a [`Scanner`], producing a [`ParserNode`] per rule invocation.
//!
//! There is no tokenizing pass and no backtracking beyond what `Oneof` and
//! `Quant` explicitly perform: every other term kind either matches once and
//! advances, or fails the whole production. Failed attempts restore the
//! scanner and the in-flight back-reference captures by value, the same way
//! [`Scanner`] itself snapshots and restores.

use std::collections::HashMap;
use std::sync::Arc;

use wbnf_core::{Associativity, Child, Error, ParserNode, Result, Rule, Scanner, Term};

use crate::compile::Parsers;

/// Captures of rule-reference text made so far within one production, keyed by
/// the referenced rule's name, for `Ref` (`\name`) back-reference matching.
type Captures = HashMap<Rule, String>;

impl Parsers {
    /// Parses `source` in full against `rule`, failing with
    /// [`Error::UnconsumedInput`] if anything is left over.
    pub fn parse(&self, rule: &Rule, source: impl Into<Arc<str>>) -> Result<ParserNode> {
        let mut scanner = Scanner::new(source);
        let node = self.parse_rule(rule, &mut scanner, 0)?;
        if !scanner.is_empty() {
            return Err(Error::UnconsumedInput { position: scanner.offset(), context: scanner.context() });
        }
        Ok(node)
    }

    fn parse_rule(&self, rule: &Rule, scanner: &mut Scanner, depth: u32) -> Result<ParserNode> {
        if let Some(max) = self.options.max_recursion_depth {
            if depth > max {
                return Err(Error::Inconceivable(format!(
                    "recursion depth exceeded while parsing {rule}"
                )));
            }
        }
        let term = self.term_for(rule)?.clone();
        let mut children = Vec::new();
        let mut extra = Vec::new();
        let mut captures = Captures::new();
        self.parse_into(rule, &term, scanner, depth, &mut children, &mut extra, &mut captures)?;
        let mut node = ParserNode::with_children(rule.clone(), children);
        node.extra = extra;
        Ok(node)
    }

    fn parse_into(
        &self,
        owner: &Rule,
        term: &Term,
        scanner: &mut Scanner,
        depth: u32,
        children: &mut Vec<Child>,
        extra: &mut Vec<usize>,
        captures: &mut Captures,
    ) -> Result<()> {
        match term {
            Term::Literal(s) => {
                let leaf = scanner
                    .consume_literal(s)
                    .ok_or_else(|| Error::parse_failure(owner, scanner.offset(), format!("{s:?}")))?;
                children.push(Child::Leaf(leaf));
                Ok(())
            }
            Term::Regex(p) => {
                let re = self.regex_for(p)?;
                let leaf = scanner
                    .consume_regex(re)
                    .ok_or_else(|| Error::parse_failure(owner, scanner.offset(), format!("/{p}/")))?;
                children.push(Child::Leaf(leaf));
                Ok(())
            }
            Term::Rule(r) => {
                let node = self.parse_rule(r, scanner, depth + 1)?;
                if let Some(text) = node.text() {
                    captures.insert(r.clone(), text.to_string());
                }
                children.push(Child::Node(node));
                Ok(())
            }
            Term::Ref(name) => {
                let text = captures.get(name).cloned().ok_or_else(|| {
                    Error::parse_failure(owner, scanner.offset(), format!("a prior capture of {name}"))
                })?;
                let leaf = scanner.consume_literal(&text).ok_or_else(|| {
                    Error::parse_failure(owner, scanner.offset(), format!("{text:?} (back-reference to {name})"))
                })?;
                children.push(Child::Leaf(leaf));
                Ok(())
            }
            Term::Seq(ts) => {
                for t in ts {
                    self.parse_into(owner, t, scanner, depth, children, extra, captures)?;
                }
                Ok(())
            }
            Term::Named(n) => self.parse_into(owner, &n.term, scanner, depth, children, extra, captures),
            Term::Oneof(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    let before_scanner = scanner.clone();
                    let before_captures = captures.clone();
                    let mut trial_children = Vec::new();
                    let mut trial_extra = Vec::new();
                    match self.parse_into(owner, t, scanner, depth, &mut trial_children, &mut trial_extra, captures) {
                        Ok(()) => {
                            children.extend(trial_children);
                            extra.push(i);
                            extra.extend(trial_extra);
                            return Ok(());
                        }
                        Err(_) => {
                            *scanner = before_scanner;
                            *captures = before_captures;
                        }
                    }
                }
                Err(Error::parse_failure(owner, scanner.offset(), "one of the alternatives"))
            }
            Term::Quant(q) => {
                let mut count = 0u32;
                loop {
                    if q.max != 0 && count >= q.max {
                        break;
                    }
                    if let Some(max_iters) = self.options.max_quant_iterations {
                        if count >= max_iters {
                            return Err(Error::Inconceivable(format!(
                                "quantifier exceeded {max_iters} iterations while parsing {owner}"
                            )));
                        }
                    }
                    let before_scanner = scanner.clone();
                    let before_captures = captures.clone();
                    let mut trial_children = Vec::new();
                    let mut trial_extra = Vec::new();
                    match self.parse_into(owner, &q.term, scanner, depth, &mut trial_children, &mut trial_extra, captures) {
                        Ok(()) if scanner.offset() == before_scanner.offset() => {
                            // no progress: stop without treating this as a failed iteration
                            *scanner = before_scanner;
                            *captures = before_captures;
                            break;
                        }
                        Ok(()) => {
                            children.extend(trial_children);
                            extra.extend(trial_extra);
                            count += 1;
                        }
                        Err(_) => {
                            *scanner = before_scanner;
                            *captures = before_captures;
                            break;
                        }
                    }
                }
                if count < q.min {
                    Err(Error::parse_failure(owner, scanner.offset(), format!("at least {} repetitions", q.min)))
                } else {
                    Ok(())
                }
            }
            Term::Delim(d) => {
                if d.can_start_with_sep {
                    let before_scanner = scanner.clone();
                    let before_captures = captures.clone();
                    let mut sep_children = Vec::new();
                    let mut sep_extra = Vec::new();
                    match self.parse_into(owner, &d.sep, scanner, depth, &mut sep_children, &mut sep_extra, captures) {
                        Ok(()) => {
                            children.extend(sep_children);
                            extra.extend(sep_extra);
                        }
                        Err(_) => {
                            *scanner = before_scanner;
                            *captures = before_captures;
                        }
                    }
                }

                self.parse_into(owner, &d.term, scanner, depth, children, extra, captures)?;

                let mut sep_count = 0u32;
                loop {
                    let before_sep = scanner.clone();
                    let before_sep_captures = captures.clone();
                    let mut sep_children = Vec::new();
                    let mut sep_extra = Vec::new();
                    if self
                        .parse_into(owner, &d.sep, scanner, depth, &mut sep_children, &mut sep_extra, captures)
                        .is_err()
                    {
                        *scanner = before_sep;
                        *captures = before_sep_captures;
                        break;
                    }

                    sep_count += 1;
                    if d.assoc == Associativity::NonAssociative && sep_count > 1 {
                        return Err(Error::parse_failure(
                            owner,
                            before_sep.offset(),
                            "a non-associative separator occurring more than once at this level",
                        ));
                    }

                    let before_term = scanner.clone();
                    let before_term_captures = captures.clone();
                    let mut term_children = Vec::new();
                    let mut term_extra = Vec::new();
                    match self.parse_into(owner, &d.term, scanner, depth, &mut term_children, &mut term_extra, captures) {
                        Ok(()) => {
                            children.extend(sep_children);
                            extra.extend(sep_extra);
                            children.extend(term_children);
                            extra.extend(term_extra);
                        }
                        Err(_) => {
                            if d.can_end_with_sep {
                                *scanner = before_term;
                                *captures = before_term_captures;
                                children.extend(sep_children);
                                extra.extend(sep_extra);
                            } else {
                                *scanner = before_sep;
                                *captures = before_sep_captures;
                            }
                            break;
                        }
                    }
                }
                Ok(())
            }
            Term::Stack(_) => {
                Err(Error::Inconceivable(format!("{owner}: Stack reached the engine unresolved")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use wbnf_core::{any, eq, l2r, Grammar};

    fn arithmetic() -> Grammar {
        let mut g = Grammar::new();
        g.insert(
            Rule::new("expr"),
            Term::Stack(vec![
                Term::Delim(l2r(
                    Term::Named(eq("operand", Term::Rule(Rule::new("@")))),
                    Term::Named(eq("op", Term::Literal("+".into()))),
                )),
                Term::Delim(l2r(
                    Term::Named(eq("operand", Term::Rule(Rule::new("@")))),
                    Term::Named(eq("op", Term::Literal("*".into()))),
                )),
                Term::Regex(r"[0-9]+".into()),
            ]),
        );
        g
    }

    #[test]
    fn parses_left_associative_precedence_climbing_arithmetic() {
        let parsers = crate::compile::compile(&arithmetic(), ParseOptions::default()).unwrap();
        let node = parsers.parse(&Rule::new("expr"), "1+2*3").unwrap();
        assert_eq!(node.text(), Some("1+2*3"));
    }

    #[test]
    fn unconsumed_trailing_input_is_an_error() {
        let parsers = crate::compile::compile(&arithmetic(), ParseOptions::default()).unwrap();
        let err = parsers.parse(&Rule::new("expr"), "1+2*3)").unwrap_err();
        assert!(matches!(err, Error::UnconsumedInput { .. }));
    }

    #[test]
    fn back_reference_requires_an_identical_prior_capture() {
        let mut g = Grammar::new();
        g.insert(Rule::new("NAME"), Term::Regex("[a-z]+".into()));
        g.insert(
            Rule::new("tag"),
            Term::Seq(vec![
                Term::Literal("<".into()),
                Term::Rule(Rule::new("NAME")),
                Term::Literal(">".into()),
                Term::Literal("</".into()),
                Term::Ref(Rule::new("NAME")),
                Term::Literal(">".into()),
            ]),
        );
        let parsers = crate::compile::compile(&g, ParseOptions::default()).unwrap();
        assert!(parsers.parse(&Rule::new("tag"), "<a></a>").is_ok());
        assert!(parsers.parse(&Rule::new("tag"), "<a></b>").is_err());
    }

    #[test]
    fn quant_stops_on_no_progress_instead_of_looping_forever() {
        let mut g = Grammar::new();
        g.insert(
            Rule::new("r"),
            Term::Quant(any(Term::Quant(wbnf_core::opt(Term::Literal("".into()))))),
        );
        let parsers = crate::compile::compile(&g, ParseOptions::default()).unwrap();
        assert!(parsers.parse(&Rule::new("r"), "").is_ok());
    }

    #[test]
    fn non_associative_delim_rejects_a_second_separator_at_the_same_level() {
        let mut g = Grammar::new();
        g.insert(
            Rule::new("cmp"),
            Term::Delim(wbnf_core::non_assoc(
                Term::Regex("[a-z]+".into()),
                Term::Literal("==".into()),
            )),
        );
        let parsers = crate::compile::compile(&g, ParseOptions::default()).unwrap();
        assert!(parsers.parse(&Rule::new("cmp"), "a==b").is_ok());
        assert!(parsers.parse(&Rule::new("cmp"), "a==b==c").is_err());
    }

    #[test]
    fn delim_permits_a_trailing_separator_only_when_marked() {
        let mut g = Grammar::new();
        g.insert(
            Rule::new("csv"),
            Term::Delim(wbnf_core::Delim {
                term: Box::new(Term::Regex("[a-z]+".into())),
                sep: Box::new(Term::Literal(",".into())),
                assoc: wbnf_core::Associativity::LeftToRight,
                can_start_with_sep: false,
                can_end_with_sep: true,
            }),
        );
        let parsers = crate::compile::compile(&g, ParseOptions::default()).unwrap();
        assert!(parsers.parse(&Rule::new("csv"), "a,b,c,").is_ok());
        assert!(parsers.parse(&Rule::new("csv"), "a,b,c").is_ok());
    }
}
