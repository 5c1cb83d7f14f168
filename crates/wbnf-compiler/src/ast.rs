//! Lifts a low-level [`ParserNode`] to a name-keyed [`BranchNode`] and back,
//! and validates a [`ParserNode`]'s shape against its grammar.
//!
//! Both directions share one joint traversal of (grammar term, node-or-branch):
//! a `Named{name, t}` switches the active capture key for its subtree; every
//! other term kind just consumes or produces the next position along that key.
//! `validate_parse` runs the lift and keeps only its success/failure, since a
//! malformed node is exactly one that this traversal cannot consume exactly.

use std::collections::HashMap;

use wbnf_core::{BranchNode, Child, Error, ParserNode, Result, Rule, Term, ANON_KEY};

use crate::compile::Parsers;

/// Prior captures of rule-reference text within one rule's term tree, keyed
/// by the referenced rule's name — the structural-validation counterpart of
/// [`crate::engine::Captures`], used to check a `Ref` leaf's text against the
/// sibling capture it claims to repeat.
type RefCaptures = HashMap<Rule, String>;

/// The text a `Rule`/`Ref` child spans, for back-reference capture and
/// comparison — a leaf's own slice, or a node's full matched text.
fn child_text(child: &Child) -> Option<String> {
    match child {
        Child::Leaf(l) => Some(l.as_str().to_string()),
        Child::Node(n) => n.text().map(str::to_string),
    }
}

impl Parsers {
    /// Lifts `node` to its name-keyed form. Fails if `node`'s shape (arity,
    /// nested tags, `@choice` markers) does not match the grammar.
    pub fn from_parser_node(&self, node: &ParserNode) -> Result<BranchNode> {
        let term = self.term_for(&node.tag)?.clone();
        let mut branch = BranchNode::new(node.tag.clone());
        let mut idx = 0usize;
        let mut eidx = 0usize;
        let mut captures = RefCaptures::new();
        self.lift(&node.tag, &term, &node.children, &mut idx, &node.extra, &mut eidx, &mut branch, ANON_KEY, &mut captures)?;
        if idx != node.children.len() {
            return Err(Error::validation_failure(
                &node.tag,
                "children",
                format!("{} unconsumed trailing children", node.children.len() - idx),
            ));
        }
        if eidx != node.extra.len() {
            return Err(Error::validation_failure(
                &node.tag,
                "extra",
                format!("{} unconsumed trailing @choice markers", node.extra.len() - eidx),
            ));
        }
        branch.choice = node.extra.clone();
        Ok(branch)
    }

    /// Reassembles a [`ParserNode`] from a (possibly user-edited) [`BranchNode`].
    pub fn to_parser_node(&self, branch: &BranchNode) -> Result<ParserNode> {
        let term = self.term_for(&branch.rule)?.clone();
        let mut children = Vec::new();
        let mut cursors: HashMap<String, usize> = HashMap::new();
        let mut eidx = 0usize;
        self.lower(&branch.rule, &term, branch, &mut cursors, &branch.choice, &mut eidx, &mut children, ANON_KEY)?;
        let mut node = ParserNode::with_children(branch.rule.clone(), children);
        node.extra = branch.choice.clone();
        Ok(node)
    }

    /// Checks that `node` is a well-formed parse of its own tag under this
    /// grammar: every position the term requires is present, exactly once,
    /// with no children left over.
    pub fn validate_parse(&self, node: &ParserNode) -> Result<()> {
        self.from_parser_node(node).map(|_| ())
    }

    #[allow(clippy::too_many_arguments)]
    fn lift(
        &self,
        owner: &Rule,
        term: &Term,
        children: &[Child],
        idx: &mut usize,
        extra: &[usize],
        eidx: &mut usize,
        branch: &mut BranchNode,
        name: &str,
        captures: &mut RefCaptures,
    ) -> Result<()> {
        match term {
            Term::Literal(_) | Term::Regex(_) => {
                let child = children
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| Error::validation_failure(owner, name, "expected a capture, found none"))?;
                *idx += 1;
                let singleton = name != ANON_KEY && self.singletons.contains(owner, name);
                branch.push(name, child, singleton);
                Ok(())
            }
            Term::Rule(r) => {
                let child = children
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| Error::validation_failure(owner, name, "expected a capture, found none"))?;
                *idx += 1;
                if let Some(text) = child_text(&child) {
                    captures.insert(r.clone(), text);
                }
                let singleton = name != ANON_KEY && self.singletons.contains(owner, name);
                branch.push(name, child, singleton);
                Ok(())
            }
            Term::Ref(r) => {
                let child = children
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| Error::validation_failure(owner, name, "expected a capture, found none"))?;
                *idx += 1;
                let expected = captures.get(r).ok_or_else(|| {
                    Error::validation_failure(owner, name, format!("back-reference to `{r}` with no preceding capture of it"))
                })?;
                let actual = child_text(&child).unwrap_or_default();
                if actual != *expected {
                    return Err(Error::validation_failure(
                        owner,
                        name,
                        format!("back-reference to `{r}` does not match its prior capture: expected {expected:?}, found {actual:?}"),
                    ));
                }
                let singleton = name != ANON_KEY && self.singletons.contains(owner, name);
                branch.push(name, child, singleton);
                Ok(())
            }
            Term::Seq(ts) => {
                for t in ts {
                    self.lift(owner, t, children, idx, extra, eidx, branch, name, captures)?;
                }
                Ok(())
            }
            Term::Named(n) => self.lift(owner, &n.term, children, idx, extra, eidx, branch, &n.name, captures),
            Term::Oneof(ts) => {
                let choice = *extra
                    .get(*eidx)
                    .ok_or_else(|| Error::validation_failure(owner, "@choice", "missing choice marker"))?;
                *eidx += 1;
                let t = ts
                    .get(choice)
                    .ok_or_else(|| Error::validation_failure(owner, "@choice", format!("choice {choice} out of range")))?;
                self.lift(owner, t, children, idx, extra, eidx, branch, name, captures)
            }
            Term::Quant(q) => {
                let mut count = 0u32;
                loop {
                    if q.max != 0 && count >= q.max {
                        break;
                    }
                    let save_idx = *idx;
                    let save_eidx = *eidx;
                    if self.lift(owner, &q.term, children, idx, extra, eidx, branch, name, captures).is_err() {
                        *idx = save_idx;
                        *eidx = save_eidx;
                        break;
                    }
                    count += 1;
                }
                if count < q.min {
                    Err(Error::validation_failure(owner, "quant", format!("expected at least {} repetitions, found {count}", q.min)))
                } else {
                    Ok(())
                }
            }
            Term::Delim(d) => {
                if d.can_start_with_sep {
                    let save_idx = *idx;
                    let save_eidx = *eidx;
                    if self.lift(owner, &d.sep, children, idx, extra, eidx, branch, name, captures).is_err() {
                        *idx = save_idx;
                        *eidx = save_eidx;
                    }
                }
                self.lift(owner, &d.term, children, idx, extra, eidx, branch, name, captures)?;
                loop {
                    let save_idx = *idx;
                    let save_eidx = *eidx;
                    if self.lift(owner, &d.sep, children, idx, extra, eidx, branch, name, captures).is_err() {
                        *idx = save_idx;
                        *eidx = save_eidx;
                        break;
                    }
                    let after_sep_idx = *idx;
                    let after_sep_eidx = *eidx;
                    if self.lift(owner, &d.term, children, idx, extra, eidx, branch, name, captures).is_err() {
                        if d.can_end_with_sep {
                            // keep the trailing separator already pushed above.
                        } else {
                            *idx = save_idx;
                            *eidx = save_eidx;
                        }
                        let _ = after_sep_idx;
                        let _ = after_sep_eidx;
                        break;
                    }
                }
                Ok(())
            }
            Term::Stack(_) => Err(Error::Inconceivable(format!("{owner}: Stack reached the AST lifter unresolved"))),
        }
    }

    fn lower(
        &self,
        owner: &Rule,
        term: &Term,
        branch: &BranchNode,
        cursors: &mut HashMap<String, usize>,
        choice: &[usize],
        eidx: &mut usize,
        children: &mut Vec<Child>,
        name: &str,
    ) -> Result<()> {
        match term {
            Term::Literal(_) | Term::Regex(_) | Term::Ref(_) | Term::Rule(_) => {
                let slot = branch
                    .get(name)
                    .ok_or_else(|| Error::validation_failure(owner, name, "no capture recorded under this name"))?;
                let cursor = cursors.entry(name.to_string()).or_insert(0);
                let child = slot
                    .as_slice()
                    .get(*cursor)
                    .cloned()
                    .ok_or_else(|| Error::validation_failure(owner, name, "capture list exhausted"))?;
                *cursor += 1;
                children.push(child);
                Ok(())
            }
            Term::Seq(ts) => {
                for t in ts {
                    self.lower(owner, t, branch, cursors, choice, eidx, children, name)?;
                }
                Ok(())
            }
            Term::Named(n) => self.lower(owner, &n.term, branch, cursors, choice, eidx, children, &n.name),
            Term::Oneof(ts) => {
                let c = *choice
                    .get(*eidx)
                    .ok_or_else(|| Error::validation_failure(owner, "@choice", "missing choice marker"))?;
                *eidx += 1;
                let t = ts
                    .get(c)
                    .ok_or_else(|| Error::validation_failure(owner, "@choice", format!("choice {c} out of range")))?;
                self.lower(owner, t, branch, cursors, choice, eidx, children, name)
            }
            Term::Quant(q) => {
                let mut count = 0u32;
                loop {
                    if q.max != 0 && count >= q.max {
                        break;
                    }
                    let before_len = children.len();
                    let before_cursors = cursors.clone();
                    match self.lower(owner, &q.term, branch, cursors, choice, eidx, children, name) {
                        Ok(()) => count += 1,
                        Err(_) => {
                            children.truncate(before_len);
                            *cursors = before_cursors;
                            break;
                        }
                    }
                }
                if count < q.min {
                    Err(Error::validation_failure(owner, "quant", format!("expected at least {} repetitions, found {count}", q.min)))
                } else {
                    Ok(())
                }
            }
            Term::Delim(d) => {
                if d.can_start_with_sep {
                    let before_len = children.len();
                    let before_cursors = cursors.clone();
                    if self.lower(owner, &d.sep, branch, cursors, choice, eidx, children, name).is_err() {
                        children.truncate(before_len);
                        *cursors = before_cursors;
                    }
                }
                self.lower(owner, &d.term, branch, cursors, choice, eidx, children, name)?;
                loop {
                    let before_sep_len = children.len();
                    let before_sep_cursors = cursors.clone();
                    if self.lower(owner, &d.sep, branch, cursors, choice, eidx, children, name).is_err() {
                        children.truncate(before_sep_len);
                        *cursors = before_sep_cursors;
                        break;
                    }
                    let before_term_len = children.len();
                    let before_term_cursors = cursors.clone();
                    if self.lower(owner, &d.term, branch, cursors, choice, eidx, children, name).is_err() {
                        if !d.can_end_with_sep {
                            children.truncate(before_sep_len);
                            *cursors = before_sep_cursors;
                        } else {
                            children.truncate(before_term_len);
                            *cursors = before_term_cursors;
                        }
                        break;
                    }
                }
                Ok(())
            }
            Term::Stack(_) => Err(Error::Inconceivable(format!("{owner}: Stack reached the AST lowerer unresolved"))),
        }
    }
}
