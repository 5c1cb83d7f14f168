//! Compiles a [`Grammar`] into a [`Parsers`] bundle ready to run.
//!
//! Desugaring replaces every `Stack` with a chain of precedence-level rules
//! (see [`crate::desugar`]) and wraps every `Literal`/`Regex` leaf of a
//! non-terminal rule with the grammar's `.wrapRE` pattern (see [`crate::wrap`]).
//! The result is a flat map of mutually recursive rules: no further laziness is
//! needed at parse time, a `Rule` reference is just a lookup by name.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use wbnf_core::{Error, Grammar, Result, Rule, Term, WRAP_RE};

use crate::config::ParseOptions;
use crate::singletons::{self, PathSet};

/// A compiled grammar: the desugared, wrapped rule map plus everything derived
/// from it once and reused across every `parse` call.
#[derive(Debug)]
pub struct Parsers {
    pub(crate) grammar: Grammar,
    pub(crate) resolved: HashMap<Rule, Term>,
    pub(crate) synthetic: HashSet<Rule>,
    pub(crate) regexes: HashMap<String, Regex>,
    pub(crate) singletons: PathSet,
    pub(crate) options: ParseOptions,
}

impl Parsers {
    /// The original (pre-desugar, pre-wrap) grammar, as retained for
    /// [`crate::validate`], [`crate::unparse`] and [`crate::diff`].
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn singletons(&self) -> &PathSet {
        &self.singletons
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub(crate) fn term_for(&self, rule: &Rule) -> Result<&Term> {
        self.resolved
            .get(rule)
            .ok_or_else(|| Error::BadInput(format!("undefined rule: {rule}")))
    }

    pub(crate) fn regex_for(&self, pattern: &str) -> Result<&Regex> {
        self.regexes
            .get(pattern)
            .ok_or_else(|| Error::Inconceivable(format!("regex never compiled: {pattern}")))
    }
}

/// Compiles `grammar`, producing every mutually recursive parser it defines.
pub fn compile(grammar: &Grammar, options: ParseOptions) -> Result<Parsers> {
    let wrap = grammar.wrap_re();
    let mut resolved = HashMap::new();
    let mut synthetic = HashSet::new();

    for (rule, term) in grammar.iter() {
        if rule.as_str() == WRAP_RE {
            continue;
        }
        let terminal = rule.is_terminal();
        let wrapped = crate::wrap::wrap_term(term, terminal, wrap);
        if let Term::Stack(levels) = wrapped {
            crate::desugar::desugar_stack(rule, &levels, &mut resolved, &mut synthetic)?;
        } else {
            resolved.insert(rule.clone(), wrapped);
        }
    }

    validate_rule_refs(&resolved)?;
    let regexes = build_regex_cache(&resolved)?;
    let singletons = singletons::compute(&resolved, &synthetic);

    Ok(Parsers { grammar: grammar.clone(), resolved, synthetic, regexes, singletons, options })
}

fn validate_rule_refs(resolved: &HashMap<Rule, Term>) -> Result<()> {
    for term in resolved.values() {
        walk_rule_refs(term, &mut |r| {
            if resolved.contains_key(r) {
                Ok(())
            } else {
                Err(Error::BadInput(format!("undefined rule reference: {r}")))
            }
        })?;
    }
    Ok(())
}

fn walk_rule_refs(term: &Term, visit: &mut impl FnMut(&Rule) -> Result<()>) -> Result<()> {
    match term {
        Term::Literal(_) | Term::Regex(_) | Term::Ref(_) => Ok(()),
        Term::Rule(r) => visit(r),
        Term::Seq(ts) | Term::Oneof(ts) | Term::Stack(ts) => {
            ts.iter().try_for_each(|t| walk_rule_refs(t, visit))
        }
        Term::Delim(d) => walk_rule_refs(&d.term, visit).and_then(|_| walk_rule_refs(&d.sep, visit)),
        Term::Quant(q) => walk_rule_refs(&q.term, visit),
        Term::Named(n) => walk_rule_refs(&n.term, visit),
    }
}

fn build_regex_cache(resolved: &HashMap<Rule, Term>) -> Result<HashMap<String, Regex>> {
    let mut patterns = HashSet::new();
    for term in resolved.values() {
        collect_patterns(term, &mut patterns);
    }
    let mut regexes = HashMap::with_capacity(patterns.len());
    for pattern in patterns {
        let anchored = format!("^(?:{pattern})");
        let re = Regex::new(&anchored)
            .map_err(|e| Error::BadInput(format!("invalid regex /{pattern}/: {e}")))?;
        regexes.insert(pattern, re);
    }
    Ok(regexes)
}

fn collect_patterns(term: &Term, out: &mut HashSet<String>) {
    match term {
        Term::Regex(p) => {
            out.insert(p.clone());
        }
        Term::Literal(_) | Term::Rule(_) | Term::Ref(_) => {}
        Term::Seq(ts) | Term::Oneof(ts) | Term::Stack(ts) => {
            ts.iter().for_each(|t| collect_patterns(t, out))
        }
        Term::Delim(d) => {
            collect_patterns(&d.term, out);
            collect_patterns(&d.sep, out);
        }
        Term::Quant(q) => collect_patterns(&q.term, out),
        Term::Named(n) => collect_patterns(&n.term, out),
    }
}
