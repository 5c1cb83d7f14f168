//! The grammar of grammars: wbnf's own surface syntax, hand-built as term
//! values and checked against its own textual form once at first use.
//!
//! Two variants exist. [`grammar_of_grammars`] is the `>` + `REF` form callers
//! actually parse ordinary wbnf source with. [`bootstrap_grammar_of_grammars`]
//! differs only by using `^` in place of `>` for `term`'s top stack level and
//! omitting `REF` from `atom` — [`core`] renders *this* variant with its own
//! `Display` impl, parses that text with the very parsers just compiled from
//! it, interprets the result back into a [`Grammar`] via [`build_grammar`],
//! and diffs the two. A mismatch means the grammar cannot describe itself,
//! which is a programmer error rather than a recoverable one, so this is the
//! one place in the crate allowed to panic. `core()` itself then returns
//! parsers compiled from the `>` + `REF` grammar, the one callers need.

use std::sync::OnceLock;

use wbnf_compiler::{compile_grammar, diff_grammars, ParseOptions, Parsers};
use wbnf_core::{
    any, eq, l2r, opt, some, Associativity, BranchNode, Child, Delim, Error, Grammar, ParserNode,
    Quant, Result, Rule, Term, ANON_KEY, AT, WRAP_RE,
};

fn r(name: &str) -> Term {
    Term::Rule(Rule::new(name))
}

fn at() -> Term {
    Term::Rule(Rule::new(AT))
}

fn lit(s: &str) -> Term {
    Term::Literal(s.into())
}

/// The hand-built grammar of grammars: wbnf's own surface syntax, expressed in
/// the same term algebra it is used to describe.
pub fn grammar_of_grammars() -> Grammar {
    let mut g = Grammar::new();

    g.insert(Rule::new("grammar"), Term::Quant(some(r("stmt"))));
    g.insert(Rule::new("stmt"), Term::Oneof(vec![r("COMMENT"), r("prod")]));
    g.insert(
        Rule::new("prod"),
        Term::Seq(vec![r("IDENT"), lit("->"), Term::Quant(some(r("term"))), lit(";")]),
    );
    g.insert(
        Rule::new("term"),
        Term::Stack(vec![
            // The meta-level `>`/`|` joins must accept any number of precedence
            // levels or oneof arms (e.g. this very rule has 4 `>`-joined levels,
            // `atom` has 6 `|`-joined arms) — not limited to the author-declared
            // associativity of a *user* grammar's own operator, which is a
            // separate, dynamically-parsed Delim built in `apply_quant`.
            Term::Delim(l2r(at(), lit(">"))),
            Term::Delim(l2r(at(), lit("|"))),
            Term::Quant(some(at())),
            Term::Seq(vec![r("named"), Term::Quant(any(r("quant")))]),
        ]),
    );
    g.insert(
        Rule::new("named"),
        Term::Seq(vec![
            Term::Quant(opt(Term::Seq(vec![r("IDENT"), Term::Named(eq("op", lit("=")))]))),
            r("atom"),
        ]),
    );
    g.insert(
        Rule::new("quant"),
        Term::Oneof(vec![
            Term::Regex("[?*+]".into()),
            Term::Seq(vec![
                lit("{"),
                Term::Quant(opt(r("INT"))),
                lit(","),
                Term::Quant(opt(r("INT"))),
                lit("}"),
            ]),
            Term::Seq(vec![
                Term::Regex("<:|:>|:".into()),
                Term::Quant(opt(lit(","))),
                r("named"),
                Term::Quant(opt(lit(","))),
            ]),
        ]),
    );
    g.insert(
        Rule::new("atom"),
        Term::Oneof(vec![
            r("IDENT"),
            r("STR"),
            r("RE"),
            r("REF"),
            Term::Seq(vec![lit("("), r("term"), lit(")")]),
            Term::Seq(vec![lit("("), lit(")")]),
        ]),
    );

    g.insert(Rule::new("IDENT"), Term::Regex(r"@|[A-Za-z_.][A-Za-z0-9_]*".into()));
    g.insert(Rule::new("STR"), Term::Regex(r#""(?:\\.|[^\\"])*""#.into()));
    g.insert(Rule::new("INT"), Term::Regex(r"\d+".into()));
    g.insert(Rule::new("RE"), Term::Regex(r"/\{(?:\\.|[^\\}])*\}".into()));
    g.insert(Rule::new("REF"), Term::Seq(vec![lit("\\"), r("IDENT")]));
    g.insert(
        Rule::new("COMMENT"),
        Term::Regex(r"//[^\n]*|(?s:/\*(?:[^*]|\*+[^*/])*\*/)".into()),
    );

    g.insert(Rule::new(WRAP_RE), Term::Regex(r"\s*()\s*".into()));

    g
}

/// The bootstrap variant of the grammar of grammars: like [`grammar_of_grammars`]
/// but with `^` as `term`'s top stack separator and no `REF` alternative in
/// `atom`. This is the form [`core`]'s self-hosting check parses against
/// itself; the `>` + `REF` grammar is reserved for parsing ordinary wbnf
/// source, since `core`'s returned parsers must understand `\name`
/// back-references and the conventional `>` stack syntax a caller writes.
pub fn bootstrap_grammar_of_grammars() -> Grammar {
    let mut g = Grammar::new();

    g.insert(Rule::new("grammar"), Term::Quant(some(r("stmt"))));
    g.insert(Rule::new("stmt"), Term::Oneof(vec![r("COMMENT"), r("prod")]));
    g.insert(
        Rule::new("prod"),
        Term::Seq(vec![r("IDENT"), lit("->"), Term::Quant(some(r("term"))), lit(";")]),
    );
    g.insert(
        Rule::new("term"),
        Term::Stack(vec![
            Term::Delim(l2r(at(), lit("^"))),
            Term::Delim(l2r(at(), lit("|"))),
            Term::Quant(some(at())),
            Term::Seq(vec![r("named"), Term::Quant(any(r("quant")))]),
        ]),
    );
    g.insert(
        Rule::new("named"),
        Term::Seq(vec![
            Term::Quant(opt(Term::Seq(vec![r("IDENT"), Term::Named(eq("op", lit("=")))]))),
            r("atom"),
        ]),
    );
    g.insert(
        Rule::new("quant"),
        Term::Oneof(vec![
            Term::Regex("[?*+]".into()),
            Term::Seq(vec![
                lit("{"),
                Term::Quant(opt(r("INT"))),
                lit(","),
                Term::Quant(opt(r("INT"))),
                lit("}"),
            ]),
            Term::Seq(vec![
                Term::Regex("<:|:>|:".into()),
                Term::Quant(opt(lit(","))),
                r("named"),
                Term::Quant(opt(lit(","))),
            ]),
        ]),
    );
    g.insert(
        Rule::new("atom"),
        Term::Oneof(vec![
            r("IDENT"),
            r("STR"),
            r("RE"),
            Term::Seq(vec![lit("("), r("term"), lit(")")]),
            Term::Seq(vec![lit("("), lit(")")]),
        ]),
    );

    g.insert(Rule::new("IDENT"), Term::Regex(r"@|[A-Za-z_.][A-Za-z0-9_]*".into()));
    g.insert(Rule::new("STR"), Term::Regex(r#""(?:\\.|[^\\"])*""#.into()));
    g.insert(Rule::new("INT"), Term::Regex(r"\d+".into()));
    g.insert(Rule::new("RE"), Term::Regex(r"/\{(?:\\.|[^\\}])*\}".into()));
    g.insert(
        Rule::new("COMMENT"),
        Term::Regex(r"//[^\n]*|(?s:/\*(?:[^*]|\*+[^*/])*\*/)".into()),
    );

    g.insert(Rule::new(WRAP_RE), Term::Regex(r"\s*()\s*".into()));

    g
}

/// Renders a grammar the way [`Grammar`]'s own `Display` does, except `term`'s
/// `Stack` levels are joined with `stack_sep` instead of the hardcoded `>`.
/// `Term::Stack::Display` always prints `>` (the conventional wbnf stack
/// syntax, used by [`grammar_of_grammars`]); the bootstrap variant's `term`
/// rule instead separates its levels with `^`, so reusing `Display` verbatim
/// would render text the bootstrap grammar's own compiled parser can't read
/// back. The Go original carries the same distinction as two independently
/// hardcoded `Stack.String()` methods, one per grammar package; this plays
/// the same role for the one shared `Term::Stack` representation here.
fn render_with_stack_sep(g: &Grammar, stack_sep: &str) -> String {
    let mut names: Vec<&Rule> = g.rules().collect();
    names.sort();
    let mut out = String::new();
    for name in names {
        let term = g.get(name).expect("name came from rules()");
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{name} -> "));
        match term {
            Term::Stack(levels) => {
                let joined = levels.iter().map(Term::to_string).collect::<Vec<_>>().join(&format!(" {stack_sep} "));
                out.push_str(&joined);
            }
            other => out.push_str(&other.to_string()),
        }
        out.push(';');
    }
    out
}

/// The compiled grammar of grammars, with its bootstrap variant (see
/// [`bootstrap_grammar_of_grammars`]) self-checked exactly once.
pub fn core() -> &'static Parsers {
    static CORE: OnceLock<Parsers> = OnceLock::new();
    CORE.get_or_init(|| {
        let hand_built = bootstrap_grammar_of_grammars();
        let meta = compile_grammar(&hand_built, ParseOptions::default())
            .expect("the bootstrap grammar of grammars must compile");

        let text = render_with_stack_sep(&hand_built, "^");
        let node = meta
            .parse(&Rule::new("grammar"), text.clone())
            .unwrap_or_else(|e| panic!("the bootstrap grammar of grammars cannot parse its own textual form: {e}\n{text}"));
        let rebuilt = build_grammar(&meta, &node)
            .unwrap_or_else(|e| panic!("could not interpret the bootstrap grammar of grammars' own parse: {e}"));

        let mismatches = diff_grammars(&hand_built, &rebuilt);
        if !mismatches.is_empty() {
            let report = mismatches.iter().map(|m| m.to_string()).collect::<Vec<_>>().join("\n");
            panic!("the bootstrap grammar of grammars does not match its own textual form:\n{report}");
        }

        compile_grammar(&grammar_of_grammars(), ParseOptions::default())
            .expect("the grammar of grammars must compile")
    })
}

/// Interprets a `grammar` [`ParserNode`] — the parse of some wbnf source text
/// under [`core`]'s `grammar` rule — into a [`Grammar`] value. This is the one
/// place the engine is told what the surface syntax *means*, as opposed to
/// merely what shape it has.
pub fn build_grammar(parsers: &Parsers, root: &ParserNode) -> Result<Grammar> {
    let branch = parsers.from_parser_node(root)?;
    let mut g = Grammar::new();
    for stmt in tagged(anon(&branch), "stmt") {
        build_stmt(parsers, stmt, &mut g)?;
    }
    Ok(g)
}

fn anon(branch: &BranchNode) -> &[Child] {
    branch.get(ANON_KEY).map(|s| s.as_slice()).unwrap_or(&[])
}

fn tagged<'a>(slice: &'a [Child], tag: &str) -> Vec<&'a ParserNode> {
    slice
        .iter()
        .filter_map(|c| match c {
            Child::Node(n) if n.tag.as_str() == tag => Some(n),
            _ => None,
        })
        .collect()
}

fn first_tagged<'a>(slice: &'a [Child], tag: &str) -> Result<&'a ParserNode> {
    tagged(slice, tag)
        .into_iter()
        .next()
        .ok_or_else(|| Error::Inconceivable(format!("expected a `{tag}` node, found none")))
}

fn text_of(node: &ParserNode) -> Result<String> {
    node.text()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Inconceivable(format!("{}: empty match", node.tag)))
}

fn build_stmt(parsers: &Parsers, stmt: &ParserNode, g: &mut Grammar) -> Result<()> {
    let branch = parsers.from_parser_node(stmt)?;
    if let Some(prod) = tagged(anon(&branch), "prod").into_iter().next() {
        build_prod(parsers, prod, g)?;
    }
    Ok(())
}

fn build_prod(parsers: &Parsers, prod: &ParserNode, g: &mut Grammar) -> Result<()> {
    let branch = parsers.from_parser_node(prod)?;
    let slice = anon(&branch);
    let name = text_of(first_tagged(slice, "IDENT")?)?;
    let terms = tagged(slice, "term")
        .into_iter()
        .map(|t| build_term(parsers, t))
        .collect::<Result<Vec<_>>>()?;
    g.insert(Rule::new(name), collapse_seq(terms));
    Ok(())
}

/// `term` (stack level, separated by `>`).
fn build_term(parsers: &Parsers, node: &ParserNode) -> Result<Term> {
    let branch = parsers.from_parser_node(node)?;
    let levels = tagged(anon(&branch), "term@1")
        .into_iter()
        .map(|n| build_oneof_level(parsers, n))
        .collect::<Result<Vec<_>>>()?;
    Ok(collapse_stack(levels))
}

/// `term@1` (oneof level, separated by `|`).
fn build_oneof_level(parsers: &Parsers, node: &ParserNode) -> Result<Term> {
    let branch = parsers.from_parser_node(node)?;
    let alts = tagged(anon(&branch), "term@2")
        .into_iter()
        .map(|n| build_seq_level(parsers, n))
        .collect::<Result<Vec<_>>>()?;
    Ok(collapse_oneof(alts))
}

/// `term@2` (implicit concatenation: one or more `term@3` units).
fn build_seq_level(parsers: &Parsers, node: &ParserNode) -> Result<Term> {
    let branch = parsers.from_parser_node(node)?;
    let units = tagged(anon(&branch), "term@3")
        .into_iter()
        .map(|n| build_named_quant(parsers, n))
        .collect::<Result<Vec<_>>>()?;
    Ok(collapse_seq(units))
}

/// `term@3` (`named quant*`).
fn build_named_quant(parsers: &Parsers, node: &ParserNode) -> Result<Term> {
    let branch = parsers.from_parser_node(node)?;
    let slice = anon(&branch);
    let named = build_named(parsers, first_tagged(slice, "named")?)?;
    tagged(slice, "quant").into_iter().try_fold(named, |acc, q| apply_quant(parsers, q, acc))
}

fn build_named(parsers: &Parsers, node: &ParserNode) -> Result<Term> {
    let branch = parsers.from_parser_node(node)?;
    let slice = anon(&branch);
    let atom = build_atom(parsers, first_tagged(slice, "atom")?)?;
    match tagged(slice, "IDENT").into_iter().next() {
        Some(ident) => Ok(Term::Named(eq(text_of(ident)?, atom))),
        None => Ok(atom),
    }
}

fn build_atom(parsers: &Parsers, node: &ParserNode) -> Result<Term> {
    let branch = parsers.from_parser_node(node)?;
    let slice = anon(&branch);
    if let Some(n) = tagged(slice, "IDENT").into_iter().next() {
        return Ok(Term::Rule(Rule::new(text_of(n)?)));
    }
    if let Some(n) = tagged(slice, "STR").into_iter().next() {
        return Ok(Term::Literal(unescape_rust_literal(&text_of(n)?)?));
    }
    if let Some(n) = tagged(slice, "RE").into_iter().next() {
        return Ok(Term::Regex(extract_re_body(&text_of(n)?)?));
    }
    if let Some(n) = tagged(slice, "REF").into_iter().next() {
        let raw = text_of(n)?;
        let name = raw.trim_start_matches('\\');
        return Ok(Term::Ref(Rule::new(name.to_string())));
    }
    if let Some(n) = tagged(slice, "term").into_iter().next() {
        return build_term(parsers, n);
    }
    Ok(Term::Seq(Vec::new()))
}

fn apply_quant(_parsers: &Parsers, node: &ParserNode, inner: Term) -> Result<Term> {
    let branch = _parsers.from_parser_node(node)?;
    let slice = anon(&branch);

    for c in slice {
        if let Child::Leaf(l) = c {
            match l.as_str().trim() {
                "?" => return Ok(Term::Quant(opt(inner))),
                "*" => return Ok(Term::Quant(any(inner))),
                "+" => return Ok(Term::Quant(some(inner))),
                _ => {}
            }
        }
    }

    let has_brace = slice.iter().any(|c| matches!(c, Child::Leaf(l) if l.as_str().trim() == "{"));
    if has_brace {
        let mut before_comma = Vec::new();
        let mut after_comma = Vec::new();
        let mut seen_comma = false;
        for c in slice {
            match c {
                Child::Leaf(l) if l.as_str().trim() == "," => seen_comma = true,
                Child::Node(n) if n.tag.as_str() == "INT" => {
                    let v: u32 = text_of(n)?.parse().unwrap_or(0);
                    if seen_comma {
                        after_comma.push(v);
                    } else {
                        before_comma.push(v);
                    }
                }
                _ => {}
            }
        }
        let min = before_comma.first().copied().unwrap_or(0);
        let max = after_comma.first().copied().unwrap_or(0);
        return Ok(Term::Quant(Quant { term: Box::new(inner), min, max }));
    }

    let mut assoc = None;
    let mut can_start = false;
    let mut can_end = false;
    let mut seen_named = false;
    for c in slice {
        match c {
            Child::Leaf(l) => {
                let t = l.as_str().trim();
                if let Some(a) = Associativity::from_str(t) {
                    assoc = Some(a);
                } else if t == "," {
                    if seen_named {
                        can_end = true;
                    } else {
                        can_start = true;
                    }
                }
            }
            Child::Node(n) if n.tag.as_str() == "named" => seen_named = true,
            _ => {}
        }
    }
    let assoc = assoc.ok_or_else(|| Error::Inconceivable(format!("{}: unrecognized quant form", node.tag)))?;
    let sep_node = first_tagged(slice, "named")?;
    let sep = build_named(_parsers, sep_node)?;
    Ok(Term::Delim(Delim {
        term: Box::new(inner),
        sep: Box::new(sep),
        assoc,
        can_start_with_sep: can_start,
        can_end_with_sep: can_end,
    }))
}

fn collapse_seq(mut terms: Vec<Term>) -> Term {
    if terms.len() == 1 {
        terms.pop().unwrap()
    } else {
        Term::Seq(terms)
    }
}

fn collapse_oneof(mut terms: Vec<Term>) -> Term {
    if terms.len() == 1 {
        terms.pop().unwrap()
    } else {
        Term::Oneof(terms)
    }
}

fn collapse_stack(mut terms: Vec<Term>) -> Term {
    if terms.len() == 1 {
        terms.pop().unwrap()
    } else {
        Term::Stack(terms)
    }
}

/// Unescapes a `STR` token's text (quotes included) the way `Term::Literal`'s
/// own `Display` (Rust's `{:?}` string debug format) encoded it: `\\`, `\"`,
/// `\'`, `\n`, `\r`, `\t`, `\0`, and `\u{XXXX}`.
fn unescape_rust_literal(quoted: &str) -> Result<String> {
    let body = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| Error::Inconceivable(format!("malformed string literal: {quoted}")))?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err(Error::Inconceivable(format!("malformed \\u escape in {quoted}")));
                }
                let mut hex = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(h) => hex.push(h),
                        None => return Err(Error::Inconceivable(format!("unterminated \\u escape in {quoted}"))),
                    }
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| Error::Inconceivable(format!("invalid \\u escape in {quoted}")))?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| Error::Inconceivable(format!("invalid unicode scalar in {quoted}")))?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => return Err(Error::Inconceivable(format!("trailing backslash in {quoted}"))),
        }
    }
    Ok(out)
}

/// Strips the `/{...}` delimiter from an `RE` token, returning the regex body
/// verbatim (this is the inverse of `Term::Regex`'s `Display`).
fn extract_re_body(raw: &str) -> Result<String> {
    raw.strip_prefix("/{")
        .and_then(|s| s.strip_suffix('}'))
        .map(str::to_string)
        .ok_or_else(|| Error::Inconceivable(format!("malformed regex literal: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_grammar_of_grammars_compiles_and_self_checks() {
        let _ = core();
    }

    #[test]
    fn the_bootstrap_variant_uses_a_caret_separator_and_omits_ref() {
        let text = bootstrap_grammar_of_grammars().to_string();
        assert!(text.contains("\"^\""));
        assert!(!text.contains("REF"));
    }

    #[test]
    fn core_still_parses_the_conventional_gt_and_back_reference_syntax() {
        let parsers = core();
        let node = parsers
            .parse(&Rule::new("grammar"), r#"q -> open=/{["']} close=\open;"#)
            .unwrap();
        let grammar = build_grammar(parsers, &node).unwrap();
        assert!(grammar.contains_rule(&Rule::new("q")));
    }

    #[test]
    fn core_parses_a_tiny_arithmetic_grammar() {
        let parsers = core();
        let node = parsers
            .parse(&Rule::new("grammar"), "expr -> operand=@ op=\"+\" > /{[0-9]+};")
            .unwrap();
        let grammar = build_grammar(parsers, &node).unwrap();
        assert!(grammar.contains_rule(&Rule::new("expr")));
    }

    #[test]
    fn unescape_rust_literal_round_trips_special_characters() {
        assert_eq!(unescape_rust_literal("\"a\\nb\"").unwrap(), "a\nb");
        assert_eq!(unescape_rust_literal("\"\\\\\"").unwrap(), "\\");
    }

    #[test]
    fn extract_re_body_strips_the_delimiter() {
        assert_eq!(extract_re_body("/{[0-9]+}").unwrap(), "[0-9]+");
    }
}
