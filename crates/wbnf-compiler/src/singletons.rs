//! Computes, for each rule, which of its named captures are guaranteed to
//! produce exactly one child — used by [`wbnf_core::BranchNode::push`] to pick
//! `ChildSlot::One` over `ChildSlot::Many` when a branch node is first built.
//!
//! A capture is a singleton only if no `Oneof`, `Delim`, or `Quant` sits between
//! the rule's top-level (desugared) term and the `Named` occurrence, and the
//! name occurs exactly once on that path. `Quant{1,1}` — the only bound that
//! would otherwise still guarantee one occurrence — is excluded from the term
//! algebra entirely, so any `Quant` ancestor disqualifies the capture.

use std::collections::{HashMap, HashSet};

use wbnf_core::{Rule, Term};

/// The set of `(rule, capture name)` pairs known to produce exactly one child.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSet(HashSet<(Rule, String)>);

impl PathSet {
    pub fn contains(&self, rule: &Rule, name: &str) -> bool {
        self.0.contains(&(rule.clone(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Default)]
struct Occurrences {
    clean: usize,
    dirty: bool,
}

/// Walks every rule's desugared term and records singleton captures. `synthetic`
/// rules fold into the original rule that owns them (a `Stack`'s precedence
/// levels are one logical rule for capture purposes).
pub fn compute(resolved: &HashMap<Rule, Term>, synthetic: &HashSet<Rule>) -> PathSet {
    let mut set = HashSet::new();
    for rule in resolved.keys() {
        if synthetic.contains(rule) {
            continue;
        }
        let mut seen: HashMap<String, Occurrences> = HashMap::new();
        walk(rule, &resolved[rule], false, resolved, synthetic, &mut seen);
        for (name, occ) in seen {
            if !occ.dirty && occ.clean == 1 {
                set.insert((rule.clone(), name));
            }
        }
    }
    PathSet(set)
}

fn walk(
    owner: &Rule,
    term: &Term,
    dirty: bool,
    resolved: &HashMap<Rule, Term>,
    synthetic: &HashSet<Rule>,
    seen: &mut HashMap<String, Occurrences>,
) {
    match term {
        Term::Literal(_) | Term::Regex(_) | Term::Ref(_) => {}
        Term::Rule(r) => {
            // Only follow references that belong to the same logical (stack-desugared)
            // rule; a reference to a genuinely different rule is a new capture scope.
            if synthetic.contains(r) || r == owner {
                if let Some(t) = resolved.get(r) {
                    walk(owner, t, dirty, resolved, synthetic, seen);
                }
            }
        }
        Term::Seq(ts) => {
            for t in ts {
                walk(owner, t, dirty, resolved, synthetic, seen);
            }
        }
        Term::Oneof(ts) => {
            for t in ts {
                walk(owner, t, true, resolved, synthetic, seen);
            }
        }
        Term::Stack(ts) => {
            for t in ts {
                walk(owner, t, true, resolved, synthetic, seen);
            }
        }
        Term::Delim(d) => {
            walk(owner, &d.term, true, resolved, synthetic, seen);
            walk(owner, &d.sep, true, resolved, synthetic, seen);
        }
        Term::Quant(q) => {
            walk(owner, &q.term, true, resolved, synthetic, seen);
        }
        Term::Named(n) => {
            let entry = seen.entry(n.name.clone()).or_default();
            if dirty {
                entry.dirty = true;
            } else {
                entry.clean += 1;
            }
            walk(owner, &n.term, dirty, resolved, synthetic, seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbnf_core::{any, eq, l2r};

    #[test]
    fn a_bare_seq_field_is_a_singleton() {
        let mut resolved = HashMap::new();
        let rule = Rule::new("pair");
        resolved.insert(
            rule.clone(),
            Term::Seq(vec![
                Term::Named(eq("key", Term::Regex("[a-z]+".into()))),
                Term::Named(eq("value", Term::Regex("[a-z]+".into()))),
            ]),
        );
        let set = compute(&resolved, &HashSet::new());
        assert!(set.contains(&rule, "key"));
        assert!(set.contains(&rule, "value"));
    }

    #[test]
    fn a_field_under_quant_is_not_a_singleton() {
        let mut resolved = HashMap::new();
        let rule = Rule::new("list");
        resolved.insert(
            rule.clone(),
            Term::Quant(any(Term::Named(eq("item", Term::Regex("[a-z]+".into()))))),
        );
        let set = compute(&resolved, &HashSet::new());
        assert!(!set.contains(&rule, "item"));
    }

    #[test]
    fn a_field_repeated_via_a_stack_delim_chain_is_not_a_singleton() {
        let mut resolved = HashMap::new();
        let mut synthetic = HashSet::new();
        let rule = Rule::new("expr");
        let synth = Rule::new("expr@1");
        synthetic.insert(synth.clone());
        resolved.insert(
            rule.clone(),
            Term::Delim(l2r(
                Term::Named(eq("operand", Term::Rule(synth.clone()))),
                Term::Literal("+".into()),
            )),
        );
        resolved.insert(synth, Term::Regex(r"\d+".into()));
        let set = compute(&resolved, &synthetic);
        assert!(!set.contains(&rule, "operand"));
    }

    #[test]
    fn a_name_occurring_twice_in_one_seq_is_not_a_singleton() {
        let mut resolved = HashMap::new();
        let rule = Rule::new("r");
        resolved.insert(
            rule.clone(),
            Term::Seq(vec![
                Term::Named(eq("x", Term::Literal("a".into()))),
                Term::Named(eq("x", Term::Literal("b".into()))),
            ]),
        );
        let set = compute(&resolved, &HashSet::new());
        assert!(!set.contains(&rule, "x"));
    }
}
