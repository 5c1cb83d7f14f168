//! Applies the grammar's `.wrapRE` entry to string/regex literals inside
//! non-terminal rules, so every production may be separated by (for example)
//! whitespace and comments without every rule having to say so.

use wbnf_core::Term;

/// Rewrites `Literal`/`Regex` leaves of `term` to `{pre}(?:{body}){post}` when
/// `wrap` is `Some` and `terminal` is `false`. Terminal rules (conventionally
/// `UPPER_SNAKE_CASE`) are left untouched: they define the lexical layer the
/// wrapping pattern itself runs over, so wrapping them would be circular.
///
/// A reference to a terminal rule is itself a leaf from the caller's point of
/// view (nothing between it and its neighbors is ever wrapped), so it gets
/// surrounded by `{pre}`/`{post}` too, as an anonymous sibling rather than by
/// folding into the regex: `Seq[Regex(pre), Rule(IDENT), Regex(post)]`. Without
/// this, two adjacent terminal references with nothing literal between them
/// (`named quant*`, say) would have no wrapped leaf nearby to absorb the
/// whitespace between them.
pub fn wrap_term(term: &Term, terminal: bool, wrap: Option<(&str, &str)>) -> Term {
    let Some((pre, post)) = wrap else {
        return term.clone();
    };
    if terminal {
        return term.clone();
    }
    wrap_recursive(term, pre, post)
}

fn wrap_recursive(term: &Term, pre: &str, post: &str) -> Term {
    match term {
        Term::Literal(s) => Term::Regex(format!("{pre}(?:{}){post}", regex::escape(s))),
        Term::Regex(p) => Term::Regex(format!("{pre}(?:{p}){post}")),
        Term::Rule(r) if r.is_terminal() => {
            Term::Seq(vec![Term::Regex(pre.to_string()), term.clone(), Term::Regex(post.to_string())])
        }
        Term::Ref(r) if r.is_terminal() => {
            Term::Seq(vec![Term::Regex(pre.to_string()), term.clone(), Term::Regex(post.to_string())])
        }
        Term::Rule(_) | Term::Ref(_) => term.clone(),
        Term::Seq(ts) => Term::Seq(ts.iter().map(|t| wrap_recursive(t, pre, post)).collect()),
        Term::Oneof(ts) => Term::Oneof(ts.iter().map(|t| wrap_recursive(t, pre, post)).collect()),
        Term::Stack(ts) => Term::Stack(ts.iter().map(|t| wrap_recursive(t, pre, post)).collect()),
        Term::Delim(d) => Term::Delim(wbnf_core::Delim {
            term: Box::new(wrap_recursive(&d.term, pre, post)),
            sep: Box::new(wrap_recursive(&d.sep, pre, post)),
            assoc: d.assoc,
            can_start_with_sep: d.can_start_with_sep,
            can_end_with_sep: d.can_end_with_sep,
        }),
        Term::Quant(q) => Term::Quant(wbnf_core::Quant {
            term: Box::new(wrap_recursive(&q.term, pre, post)),
            min: q.min,
            max: q.max,
        }),
        Term::Named(n) => Term::Named(wbnf_core::Named {
            name: n.name.clone(),
            term: Box::new(wrap_recursive(&n.term, pre, post)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbnf_core::Rule;

    #[test]
    fn wraps_literals_and_regexes_inside_a_non_terminal_rule() {
        let term = Term::Seq(vec![Term::Literal("+".into()), Term::Regex(r"\d+".into())]);
        let wrapped = wrap_term(&term, false, Some((r"\s*", r"\s*")));
        assert_eq!(
            wrapped,
            Term::Seq(vec![
                Term::Regex(r"\s*(?:\+)\s*".into()),
                Term::Regex(r"\s*(?:\d+)\s*".into()),
            ])
        );
    }

    #[test]
    fn terminal_rules_are_never_wrapped() {
        let term = Term::Regex(r"[a-z]+".into());
        assert_eq!(wrap_term(&term, true, Some((r"\s*", r"\s*"))), term);
    }

    #[test]
    fn rule_and_ref_terms_pass_through_unwrapped() {
        let term = Term::Rule(Rule::new("term"));
        assert_eq!(wrap_term(&term, false, Some((r"\s*", ""))), term);
    }

    #[test]
    fn a_reference_to_a_terminal_rule_is_surrounded_by_the_wrap_pattern() {
        let term = Term::Rule(Rule::new("IDENT"));
        let wrapped = wrap_term(&term, false, Some((r"\s*", r"\s*")));
        assert_eq!(
            wrapped,
            Term::Seq(vec![Term::Regex(r"\s*".into()), term, Term::Regex(r"\s*".into())])
        );
    }
}
