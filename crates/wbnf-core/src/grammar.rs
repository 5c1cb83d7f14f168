//! A grammar: a mapping from [`Rule`] to [`Term`].

use std::fmt;

use indexmap::IndexMap;

use crate::rule::{Rule, WRAP_RE};
use crate::term::Term;

/// A grammar: rule name -> term. Iteration order is insertion order (irrelevant to
/// semantics); [`Grammar`]'s `Display` sorts by name so printing is deterministic
/// and round-trips through the grammar parser.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Grammar(IndexMap<Rule, Term>);

impl Grammar {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, rule: Rule, term: Term) -> Option<Term> {
        self.0.insert(rule, term)
    }

    pub fn get(&self, rule: &Rule) -> Option<&Term> {
        self.0.get(rule)
    }

    pub fn contains_rule(&self, rule: &Rule) -> bool {
        self.0.contains_key(rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rule, &Term)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.0.keys()
    }

    /// The `.wrapRE` entry, if present, as a compiled `(prefix, suffix)` pair taken
    /// from the `pre()post` regex shape (the empty group marks the insertion
    /// point).
    pub fn wrap_re(&self) -> Option<(&str, &str)> {
        let rule = Rule::new(WRAP_RE);
        let term = self.0.get(&rule)?;
        let Term::Regex(pattern) = term else {
            return None;
        };
        let (pre, rest) = pattern.split_once("()")?;
        Some((pre, rest))
    }
}

impl FromIterator<(Rule, Term)> for Grammar {
    fn from_iter<I: IntoIterator<Item = (Rule, Term)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&Rule> = self.0.keys().collect();
        names.sort();
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{} -> {};", name, self.0[*name])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_sorts_by_rule_name_regardless_of_insertion_order() {
        let mut g = Grammar::new();
        g.insert(Rule::new("b"), Term::Literal("B".into()));
        g.insert(Rule::new("a"), Term::Literal("A".into()));
        assert_eq!(g.to_string(), "a -> \"A\"; b -> \"B\";");
    }

    #[test]
    fn wrap_re_extracts_prefix_and_suffix_around_empty_group() {
        let mut g = Grammar::new();
        g.insert(Rule::new(WRAP_RE), Term::Regex(r"\s*()\s*".into()));
        assert_eq!(g.wrap_re(), Some((r"\s*", r"\s*")));
    }

    #[test]
    fn wrap_re_absent_by_default() {
        assert_eq!(Grammar::new().wrap_re(), None);
    }
}
