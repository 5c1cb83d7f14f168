//! Lowers `Stack` terms into a chain of freshly named precedence-level rules.
//!
//! A rule `R` whose term is `Stack[L0, L1, ..., Lk-1]` desugars to: `R` itself
//! becomes `L0` (with every `@` placeholder rewritten to a reference to the next
//! level), and synthetic rules `R@1 .. R@(k-1)` hold the remaining levels, each
//! rewritten the same way. The tightest level `Lk-1` has no `@` to rewrite — it
//! is already the atom below the stack.

use std::collections::HashMap;

use wbnf_core::{Error, Result, Rule, Term, AT};

/// Inserts `rule` and its synthetic sibling rules into `resolved`, and records
/// the synthetic names (everything but `rule` itself) in `synthetic`.
pub fn desugar_stack(
    rule: &Rule,
    levels: &[Term],
    resolved: &mut HashMap<Rule, Term>,
    synthetic: &mut std::collections::HashSet<Rule>,
) -> Result<()> {
    let k = levels.len();
    if k == 0 {
        return Err(Error::BadInput(format!("{rule}: Stack has no levels")));
    }
    let names: Vec<Rule> = (0..k)
        .map(|i| if i == 0 { rule.clone() } else { Rule::new(format!("{rule}@{i}")) })
        .collect();

    for (i, level) in levels.iter().enumerate() {
        let body = if i + 1 < k {
            level.resolve(&Rule::new(AT), &names[i + 1])
        } else {
            if mentions_at(level) {
                return Err(Error::BadInput(format!(
                    "{rule}: the tightest stack level may not use `@` (no level below it)"
                )));
            }
            level.clone()
        };
        if i > 0 {
            synthetic.insert(names[i].clone());
        }
        resolved.insert(names[i].clone(), body);
    }
    Ok(())
}

fn mentions_at(term: &Term) -> bool {
    match term {
        Term::Rule(r) => r.as_str() == AT,
        Term::Ref(_) | Term::Literal(_) | Term::Regex(_) => false,
        Term::Seq(ts) | Term::Oneof(ts) | Term::Stack(ts) => ts.iter().any(mentions_at),
        Term::Delim(d) => mentions_at(&d.term) || mentions_at(&d.sep),
        Term::Quant(q) => mentions_at(&q.term),
        Term::Named(n) => mentions_at(&n.term),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbnf_core::{l2r, some};
    use std::collections::HashSet;

    fn at() -> Term {
        Term::Rule(Rule::new(AT))
    }

    #[test]
    fn desugars_three_levels_into_rule_and_two_synthetic_siblings() {
        let levels = vec![
            Term::Delim(l2r(at(), Term::Literal("+".into()))),
            Term::Delim(l2r(at(), Term::Literal("*".into()))),
            Term::Regex(r"\d+".into()),
        ];
        let mut resolved = HashMap::new();
        let mut synthetic = HashSet::new();
        let rule = Rule::new("expr");
        desugar_stack(&rule, &levels, &mut resolved, &mut synthetic).unwrap();

        assert_eq!(synthetic, HashSet::from([Rule::new("expr@1")]));
        assert_eq!(resolved.len(), 2);
        let Term::Delim(d0) = &resolved[&rule] else { panic!() };
        assert_eq!(*d0.term, Term::Rule(Rule::new("expr@1")));
        let Term::Delim(d1) = &resolved[&Rule::new("expr@1")] else { panic!() };
        assert_eq!(*d1.term, Term::Regex(r"\d+".into()));
    }

    #[test]
    fn rejects_at_in_the_tightest_level() {
        let levels = vec![Term::Quant(some(at()))];
        let mut resolved = HashMap::new();
        let mut synthetic = HashSet::new();
        let err = desugar_stack(&Rule::new("x"), &levels, &mut resolved, &mut synthetic).unwrap_err();
        assert!(matches!(err, Error::BadInput(_)));
    }
}
