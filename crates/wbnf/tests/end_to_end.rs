//! End-to-end scenarios exercising the full pipeline: surface text ->
//! `Grammar` -> `Parsers` -> parse -> lift/round-trip/diff.

use indoc::indoc;
use wbnf::{diff_grammars, BranchNode, Child, GrammarExt, Rule, ANON_KEY};

/// S1 — arithmetic precedence: `+` binds loosest, `*` tighter, digits tightest.
#[test]
fn arithmetic_precedence_nests_the_tighter_operator_on_the_right_operand() {
    let grammar = wbnf::Grammar::parse_text(r#"expr -> @:op="+" > @:op="*" > /{\d+};"#).unwrap();
    let parsers = grammar.compile().unwrap();

    let node = parsers.parse(&Rule::new("expr"), "1+2*3").unwrap();
    let branch = parsers.from_parser_node(&node).unwrap();

    let operands: Vec<&Child> = branch.get("").map(|s| s.as_slice()).unwrap_or(&[]).iter().collect();
    assert!(!operands.is_empty());

    let second_operand = operands
        .iter()
        .rev()
        .find_map(|c| match c {
            Child::Node(n) => Some(n),
            _ => None,
        })
        .expect("a nested `*`-level operand");
    let inner = parsers.from_parser_node(second_operand).unwrap();
    assert_eq!(inner.get("").map(|s| s.as_slice().len()), Some(2));
}

/// S2 — a tiny XML grammar parses a short document into the expected shape.
#[test]
fn tiny_xml_grammar_parses_nested_elements_and_attributes() {
    let src = indoc! {r#"
        xml  -> s "<" s NAME attr* s ">" xml* "</" s NAME s ">" | CDATA=/{[^<]+};
        attr -> s NAME s "=" s value=/{"[^"]*"};
        NAME -> /{[A-Za-z_:][-A-Za-z0-9._:]*};
        s    -> /{\s*};
    "#};
    let grammar = wbnf::Grammar::parse_text(src).unwrap();
    let parsers = grammar.compile().unwrap();

    let node = parsers.parse(&Rule::new("xml"), r#"<a x="1">hello <b>world!</b></a>"#).unwrap();
    let root = parsers.from_parser_node(&node).unwrap();

    // `NAME`, `attr`, `xml` and `s` are all bare (unnamed) rule references, so
    // per the anonymous-capture rule they share the "" slot, distinguished
    // only by each nested node's own tag.
    let names = nodes_tagged(&root, "NAME");
    let name_texts: Vec<&str> = names.iter().map(|n| n.text().unwrap()).collect();
    assert_eq!(name_texts, vec!["a", "a"]);

    let attrs = nodes_tagged(&root, "attr");
    assert_eq!(attrs.len(), 1);
    let attr_branch = parsers.from_parser_node(attrs[0]).unwrap();
    let attr_names: Vec<&str> = nodes_tagged(&attr_branch, "NAME").iter().map(|n| n.text().unwrap()).collect();
    assert_eq!(attr_names, vec!["x"]);
    let value_text: Vec<String> = attr_branch
        .get("value")
        .map(|s| s.as_slice())
        .unwrap_or(&[])
        .iter()
        .filter_map(|c| match c {
            Child::Leaf(l) => Some(l.as_str().to_string()),
            Child::Node(n) => n.text().map(str::to_string),
        })
        .collect();
    assert_eq!(value_text, vec![r#""1""#]);

    let nested = nodes_tagged(&root, "xml");
    assert_eq!(nested.len(), 2);
}

fn nodes_tagged<'a>(branch: &'a BranchNode, tag: &str) -> Vec<&'a wbnf::ParserNode> {
    branch
        .get(ANON_KEY)
        .map(|s| s.as_slice())
        .unwrap_or(&[])
        .iter()
        .filter_map(|c| match c {
            Child::Node(n) if n.tag.as_str() == tag => Some(n),
            _ => None,
        })
        .collect()
}

/// S3 — the grammar of grammars agrees with its own textual form. Merely
/// resolving `bootstrap::core()` already runs this check (it panics on a
/// mismatch), so a successful call is the assertion.
#[test]
fn the_bootstrap_grammar_self_checks_without_panicking() {
    let parsers = wbnf::bootstrap::core();
    assert!(parsers.grammar().contains_rule(&Rule::new("grammar")));
}

/// S4 — round-trip: lifting a parsed node to a branch and lowering it back
/// produces an identical node.
#[test]
fn round_trips_a_parsed_node_through_branch_node_and_back() {
    let grammar = wbnf::Grammar::parse_text(r#"expr -> @:op="+" > @:op="*" > /{\d+};"#).unwrap();
    let parsers = grammar.compile().unwrap();

    let node = parsers.parse(&Rule::new("expr"), "1+2*3").unwrap();
    let branch = parsers.from_parser_node(&node).unwrap();
    let rebuilt = parsers.to_parser_node(&branch).unwrap();
    assert_eq!(node, rebuilt);
}

/// S5 — trailing input the grammar cannot account for is an error, not a
/// silent partial parse.
#[test]
fn unconsumed_trailing_input_is_rejected() {
    let grammar = wbnf::Grammar::parse_text(r#"expr -> @:op="+" > @:op="*" > /{\d+};"#).unwrap();
    let parsers = grammar.compile().unwrap();
    let err = parsers.parse(&Rule::new("expr"), "1+2x").unwrap_err();
    assert!(matches!(err, wbnf::Error::UnconsumedInput { .. } | wbnf::Error::ParseFailure { .. }));
}

/// S6 — a back-reference matches only a literal repeat of its capture.
#[test]
fn a_back_reference_matches_only_an_identical_repeat() {
    let grammar =
        wbnf::Grammar::parse_text(r#"q -> open=/{["']} text=/{[^"']*} close=\open;"#).unwrap();
    let parsers = grammar.compile().unwrap();

    assert!(parsers.parse(&Rule::new("q"), r#""hi""#).is_ok());
    assert!(parsers.parse(&Rule::new("q"), "'hi'").is_ok());
    assert!(parsers.parse(&Rule::new("q"), r#""hi'"#).is_err());
}

/// A `NonAssociative` stack level (`:`) rejects a third operand: exactly one
/// separator is allowed at that level.
#[test]
fn non_associative_stack_level_rejects_a_second_separator() {
    let grammar = wbnf::Grammar::parse_text(r#"cmp -> @:op="==" > /{[a-z]+};"#).unwrap();
    let parsers = grammar.compile().unwrap();

    assert!(parsers.parse(&Rule::new("cmp"), "a==b").is_ok());
    assert!(parsers.parse(&Rule::new("cmp"), "a==b==c").is_err());
}

/// Diffing a grammar against itself (after a text round-trip) finds nothing.
#[test]
fn diffing_a_grammar_against_its_own_text_round_trip_is_empty() {
    let grammar = wbnf::Grammar::parse_text(r#"expr -> @:op="+" > @:op="*" > /{\d+};"#).unwrap();
    let reparsed = wbnf::Grammar::parse_text(&grammar.to_string()).unwrap();
    assert!(diff_grammars(&grammar, &reparsed).is_empty());
}

/// Diffing two grammars that disagree on a rule's body reports the mismatch,
/// naming the offending rule.
#[test]
fn diffing_grammars_with_a_changed_rule_reports_a_mismatch() {
    let a = wbnf::Grammar::parse_text(r#"expr -> /{\d+};"#).unwrap();
    let b = wbnf::Grammar::parse_text(r#"expr -> /{[a-z]+};"#).unwrap();
    let mismatches = diff_grammars(&a, &b);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].rule, Rule::new("expr"));
}

/// A lifted `BranchNode` round-trips through JSON, confirming its
/// `Serialize` shape is actually usable by a caller reaching for it, not
/// just derivable.
#[test]
fn a_lifted_branch_node_round_trips_through_json() {
    let grammar = wbnf::Grammar::parse_text(
        "greeting -> hello=\"hello\" s target=/{\\w+};\ns -> /{\\s*};",
    )
    .unwrap();
    let parsers = grammar.compile().unwrap();
    let node = parsers.parse(&Rule::new("greeting"), "hello world").unwrap();
    let branch = parsers.from_parser_node(&node).unwrap();

    let json = serde_json::to_value(&branch).unwrap();
    let target = json
        .get("children")
        .and_then(|c| c.get("target"))
        .expect("a `target` capture in the serialized tree");
    assert!(!target.is_null());
}

/// Unparsing a parsed node replays its source text exactly.
#[test]
fn unparsing_a_parsed_node_reproduces_the_source_text() {
    let grammar = wbnf::Grammar::parse_text(r#"expr -> @:op="+" > @:op="*" > /{\d+};"#).unwrap();
    let parsers = grammar.compile().unwrap();
    let node = parsers.parse(&Rule::new("expr"), "1+2*3").unwrap();
    let mut out = String::new();
    parsers.unparse(&node, &mut out).unwrap();
    assert_eq!(out, "1+2*3");
}
