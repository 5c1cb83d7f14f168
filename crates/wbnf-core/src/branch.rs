//! The branch node: the user-facing AST form, keyed by named-capture slot rather
//! than by position.

use indexmap::IndexMap;

use crate::node::Child;
use crate::rule::Rule;

/// Reserved key holding the rule name at the top of a [`BranchNode`].
pub const RULE_KEY: &str = "@rule";
/// Reserved key holding the path of chosen branch indices through nested
/// `Oneof`/`Stack` terms.
pub const CHOICE_KEY: &str = "@choice";
/// Key under which anonymous (unnamed) captures accumulate, in source order.
pub const ANON_KEY: &str = "";

/// A capture slot: exactly one child if the grammar's shape guarantees it
/// (a [`crate::singletons::PathSet`] membership), otherwise an ordered list.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum ChildSlot {
    One(Child),
    Many(Vec<Child>),
}

impl ChildSlot {
    pub fn as_slice(&self) -> &[Child] {
        match self {
            ChildSlot::One(c) => std::slice::from_ref(c),
            ChildSlot::Many(cs) => cs,
        }
    }

    pub fn push(&mut self, child: Child) {
        match self {
            ChildSlot::One(existing) => {
                let existing = existing.clone();
                *self = ChildSlot::Many(vec![existing, child]);
            }
            ChildSlot::Many(cs) => cs.push(child),
        }
    }
}

/// The AST lifted from a [`crate::node::ParserNode`] for user consumption: a
/// mapping from capture name to ordered child list, plus the reserved `@rule`
/// and `@choice` bookkeeping keys.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BranchNode {
    pub rule: Rule,
    pub choice: Vec<usize>,
    children: IndexMap<String, ChildSlot>,
}

impl BranchNode {
    pub fn new(rule: Rule) -> Self {
        Self { rule, choice: Vec::new(), children: IndexMap::new() }
    }

    /// Accumulates `child` under `name` (`""` for anonymous captures), preserving
    /// sibling order among same-named captures.
    pub fn push(&mut self, name: &str, child: Child, singleton: bool) {
        match self.children.get_mut(name) {
            Some(slot) => slot.push(child),
            None => {
                let slot = if singleton { ChildSlot::One(child) } else { ChildSlot::Many(vec![child]) };
                self.children.insert(name.to_string(), slot);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ChildSlot> {
        self.children.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChildSlot)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }
}
