//! Structural comparison of two grammars, used by the self-hosting bootstrap
//! check: a hand-built grammar must equal the grammar recovered by parsing its
//! own textual form.

use std::collections::BTreeSet;
use std::fmt;

use wbnf_core::{Grammar, Rule, Term};

/// One point where two grammars disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub rule: Rule,
    pub path: String,
    pub reason: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.rule, self.reason)
        } else {
            write!(f, "{}{}: {}", self.rule, self.path, self.reason)
        }
    }
}

/// Every point where `a` and `b` disagree. Empty iff the two grammars are
/// structurally identical (rule names and term shapes, not textual form).
pub fn diff(a: &Grammar, b: &Grammar) -> Vec<Mismatch> {
    let mut out = Vec::new();
    let rules: BTreeSet<&Rule> = a.rules().chain(b.rules()).collect();
    for rule in rules {
        match (a.get(rule), b.get(rule)) {
            (Some(ta), Some(tb)) => diff_term(rule, ta, tb, "", &mut out),
            (Some(_), None) => out.push(mismatch(rule, "", "present only in the left-hand grammar")),
            (None, Some(_)) => out.push(mismatch(rule, "", "present only in the right-hand grammar")),
            (None, None) => unreachable!("rule came from one of the two grammars"),
        }
    }
    out
}

fn mismatch(rule: &Rule, path: &str, reason: impl Into<String>) -> Mismatch {
    Mismatch { rule: rule.clone(), path: path.to_string(), reason: reason.into() }
}

fn diff_term(rule: &Rule, a: &Term, b: &Term, path: &str, out: &mut Vec<Mismatch>) {
    match (a, b) {
        (Term::Literal(x), Term::Literal(y)) if x == y => {}
        (Term::Regex(x), Term::Regex(y)) if x == y => {}
        (Term::Rule(x), Term::Rule(y)) if x == y => {}
        (Term::Ref(x), Term::Ref(y)) if x == y => {}
        (Term::Seq(xs), Term::Seq(ys)) if xs.len() == ys.len() => {
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                diff_term(rule, x, y, &format!("{path}/seq[{i}]"), out);
            }
        }
        (Term::Oneof(xs), Term::Oneof(ys)) if xs.len() == ys.len() => {
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                diff_term(rule, x, y, &format!("{path}/oneof[{i}]"), out);
            }
        }
        (Term::Stack(xs), Term::Stack(ys)) if xs.len() == ys.len() => {
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                diff_term(rule, x, y, &format!("{path}/stack[{i}]"), out);
            }
        }
        (Term::Delim(x), Term::Delim(y)) => {
            if x.assoc != y.assoc {
                out.push(mismatch(rule, path, format!("associativity {} != {}", x.assoc, y.assoc)));
            }
            if x.can_start_with_sep != y.can_start_with_sep || x.can_end_with_sep != y.can_end_with_sep {
                out.push(mismatch(rule, path, "leading/trailing separator flags differ"));
            }
            diff_term(rule, &x.term, &y.term, &format!("{path}/delim.term"), out);
            diff_term(rule, &x.sep, &y.sep, &format!("{path}/delim.sep"), out);
        }
        (Term::Quant(x), Term::Quant(y)) => {
            if x.min != y.min || x.max != y.max {
                out.push(mismatch(rule, path, format!("quant bound ({},{}) != ({},{})", x.min, x.max, y.min, y.max)));
            }
            diff_term(rule, &x.term, &y.term, &format!("{path}/quant"), out);
        }
        (Term::Named(x), Term::Named(y)) => {
            if x.name != y.name {
                out.push(mismatch(rule, path, format!("capture name {:?} != {:?}", x.name, y.name)));
            }
            diff_term(rule, &x.term, &y.term, &format!("{path}/={}", x.name), out);
        }
        _ => out.push(mismatch(rule, path, format!("{a} != {b}"))),
    }
}
