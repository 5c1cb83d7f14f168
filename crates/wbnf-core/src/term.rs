//! The term algebra: the closed family of term kinds a grammar rule can be built
//! from, plus their canonical printed form and resolution under rule renaming.

use std::fmt;

use crate::rule::Rule;

/// Associativity of a [`Term::Delim`] list, controlling the tree shape produced
/// when the parsed list is lifted to a branch node. `NonAssociative` also
/// bounds what the parser accepts: a list under it may contain at most one
/// `sep` occurrence, so a third operand is a parse error rather than a tree
/// the lift step would have to arbitrarily group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Associativity {
    RightToLeft,
    NonAssociative,
    LeftToRight,
}

impl Associativity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ":" => Some(Associativity::NonAssociative),
            ":>" => Some(Associativity::LeftToRight),
            "<:" => Some(Associativity::RightToLeft),
            _ => None,
        }
    }
}

impl fmt::Display for Associativity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Associativity::RightToLeft => "<:",
            Associativity::NonAssociative => ":",
            Associativity::LeftToRight => ":>",
        })
    }
}

/// A list of `term`s separated by `sep`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Delim {
    pub term: Box<Term>,
    pub sep: Box<Term>,
    pub assoc: Associativity,
    pub can_start_with_sep: bool,
    pub can_end_with_sep: bool,
}

/// A bounded repetition. `max == 0` means unbounded.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quant {
    pub term: Box<Term>,
    pub min: u32,
    pub max: u32,
}

impl Quant {
    pub fn contains(&self, i: u32) -> bool {
        self.min <= i && (self.max == 0 || i <= self.max)
    }
}

impl fmt::Display for Quant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, 0) => write!(f, "{}*", self.term),
            (0, 1) => write!(f, "{}?", self.term),
            (1, 0) => write!(f, "{}+", self.term),
            (1, 1) => unreachable!("Quant{{1,1}} is forbidden by the term algebra"),
            (min, 0) => write!(f, "{}{{{min},}}", self.term),
            (0, max) => write!(f, "{}{{,{max}}}", self.term),
            (min, max) => write!(f, "{}{{{min},{max}}}", self.term),
        }
    }
}

/// A named capture slot. `name == ""` means anonymous (the match position is still
/// recorded, under the empty key).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Named {
    pub name: String,
    pub term: Box<Term>,
}

/// The closed family of grammar term kinds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Term {
    /// Match an exact string.
    Literal(String),
    /// Match the compiled regex, anchored at the current position.
    Regex(String),
    /// An ordinary nonterminal reference: parse according to the named rule's
    /// own term. Also used as the `@` placeholder inside a `Stack` level before
    /// compilation rewrites it to the next tighter precedence level.
    Rule(Rule),
    /// Back-reference to a previously captured occurrence of `rule` within the
    /// same production (wbnf user grammars only): matches only if the input
    /// equals that capture's text verbatim.
    Ref(Rule),
    /// Concatenation.
    Seq(Vec<Term>),
    /// Ordered alternation; first successful branch wins.
    Oneof(Vec<Term>),
    /// Precedence levels, written loosest-binding first.
    Stack(Vec<Term>),
    Delim(Delim),
    Quant(Quant),
    Named(Named),
}

// --- constructors mirroring the reference implementation's helpers ---

pub fn non_assoc(term: Term, sep: Term) -> Delim {
    Delim { term: Box::new(term), sep: Box::new(sep), assoc: Associativity::NonAssociative, can_start_with_sep: false, can_end_with_sep: false }
}

pub fn l2r(term: Term, sep: Term) -> Delim {
    Delim { term: Box::new(term), sep: Box::new(sep), assoc: Associativity::LeftToRight, can_start_with_sep: false, can_end_with_sep: false }
}

pub fn r2l(term: Term, sep: Term) -> Delim {
    Delim { term: Box::new(term), sep: Box::new(sep), assoc: Associativity::RightToLeft, can_start_with_sep: false, can_end_with_sep: false }
}

/// `term?`
pub fn opt(term: Term) -> Quant {
    Quant { term: Box::new(term), min: 0, max: 1 }
}

/// `term*`
pub fn any(term: Term) -> Quant {
    Quant { term: Box::new(term), min: 0, max: 0 }
}

/// `term+`
pub fn some(term: Term) -> Quant {
    Quant { term: Box::new(term), min: 1, max: 0 }
}

/// `name=term`
pub fn eq(name: impl Into<String>, term: Term) -> Named {
    Named { name: name.into(), term: Box::new(term) }
}

/// The placeholder rule name written `@` inside a `Stack` level, standing for
/// "the next tighter precedence level" until the compiler resolves it.
pub const AT: &str = "@";

fn join(terms: &[Term], sep: &str) -> String {
    terms.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(sep)
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Literal(s) => write!(f, "{s:?}"),
            Term::Regex(p) => write!(f, "/{{{p}}}"),
            Term::Rule(r) => write!(f, "{r}"),
            Term::Ref(r) => write!(f, "\\{r}"),
            Term::Seq(terms) => write!(f, "({})", join(terms, " ")),
            Term::Oneof(terms) => write!(f, "{}", join(terms, " | ")),
            Term::Stack(terms) => write!(f, "{}", join(terms, " > ")),
            Term::Delim(d) => {
                let leading = if d.can_start_with_sep { "," } else { "" };
                let trailing = if d.can_end_with_sep { "," } else { "" };
                write!(f, "{}{}{}{}{}", d.term, d.assoc, leading, d.sep, trailing)
            }
            Term::Quant(q) => write!(f, "{q}"),
            Term::Named(n) => {
                if n.name.is_empty() {
                    write!(f, "{}", n.term)
                } else {
                    write!(f, "{}={}", n.name, n.term)
                }
            }
        }
    }
}

impl Term {
    /// Replaces every `Ref(old)` usage with `Ref(new)`, recursively. Used by the
    /// compiler when desugaring `Stack` terms into freshly named precedence-level
    /// rules.
    pub fn resolve(&self, old: &Rule, new: &Rule) -> Term {
        match self {
            Term::Rule(r) if r == old => Term::Rule(new.clone()),
            Term::Ref(r) if r == old => Term::Ref(new.clone()),
            Term::Rule(_) | Term::Ref(_) | Term::Literal(_) | Term::Regex(_) => self.clone(),
            Term::Seq(terms) => Term::Seq(terms.iter().map(|t| t.resolve(old, new)).collect()),
            Term::Oneof(terms) => Term::Oneof(terms.iter().map(|t| t.resolve(old, new)).collect()),
            Term::Stack(terms) => Term::Stack(terms.iter().map(|t| t.resolve(old, new)).collect()),
            Term::Delim(d) => Term::Delim(Delim {
                term: Box::new(d.term.resolve(old, new)),
                sep: Box::new(d.sep.resolve(old, new)),
                assoc: d.assoc,
                can_start_with_sep: d.can_start_with_sep,
                can_end_with_sep: d.can_end_with_sep,
            }),
            Term::Quant(q) => Term::Quant(Quant {
                term: Box::new(q.term.resolve(old, new)),
                min: q.min,
                max: q.max,
            }),
            Term::Named(n) => Term::Named(Named {
                name: n.name.clone(),
                term: Box::new(n.term.resolve(old, new)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quant_display_matches_conventional_shorthand() {
        assert_eq!(any(Term::Literal("x".into())).to_string(), "\"x\"*");
        assert_eq!(opt(Term::Literal("x".into())).to_string(), "\"x\"?");
        assert_eq!(some(Term::Literal("x".into())).to_string(), "\"x\"+");
        let bounded = Quant { term: Box::new(Term::Literal("x".into())), min: 1, max: 3 };
        assert_eq!(bounded.to_string(), "\"x\"{1,3}");
    }

    #[test]
    #[should_panic(expected = "forbidden")]
    fn quant_one_one_is_forbidden() {
        let q = Quant { term: Box::new(Term::Literal("x".into())), min: 1, max: 1 };
        let _ = q.to_string();
    }

    #[test]
    fn resolve_rewrites_matching_refs_only() {
        let term = Term::Seq(vec![Term::Ref(Rule::new("a")), Term::Ref(Rule::new("b"))]);
        let resolved = term.resolve(&Rule::new("a"), &Rule::new("a@0"));
        assert_eq!(
            resolved,
            Term::Seq(vec![Term::Ref(Rule::new("a@0")), Term::Ref(Rule::new("b"))])
        );
    }

    #[test]
    fn resolve_rewrites_the_at_placeholder_as_an_ordinary_rule_reference() {
        let term = Term::Seq(vec![Term::Rule(Rule::new(AT)), Term::Literal("+".into())]);
        let resolved = term.resolve(&Rule::new(AT), &Rule::new("expr@1"));
        assert_eq!(
            resolved,
            Term::Seq(vec![Term::Rule(Rule::new("expr@1")), Term::Literal("+".into())])
        );
    }

    #[test]
    fn rule_displays_as_bare_name_unlike_backreference() {
        assert_eq!(Term::Rule(Rule::new("term")).to_string(), "term");
        assert_eq!(Term::Ref(Rule::new("term")).to_string(), "\\term");
    }

    #[test]
    fn delim_display_includes_assoc_and_sep_flags() {
        let mut d = l2r(Term::Ref(Rule::new("x")), Term::Literal(",".into()));
        d.can_end_with_sep = true;
        assert_eq!(Term::Delim(d).to_string(), "\\x:>\",\",");
    }
}
