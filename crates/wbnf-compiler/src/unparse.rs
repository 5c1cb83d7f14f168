//! Turns a [`ParserNode`] back into text by replaying the source slices its
//! leaves already carry, in order. Every leaf is a verbatim slice of the
//! scanner's input (including whatever surrounding whitespace `.wrapRE`
//! folded into it), so walking the tree reproduces the parsed span exactly;
//! this also makes unparse-after-edit meaningful once [`Parsers::to_parser_node`]
//! has reassembled a node from a user-edited [`BranchNode`].

use wbnf_core::{Child, ParserNode};

use crate::compile::Parsers;

impl Parsers {
    /// Writes `node`'s full matched text to `w`, recursively.
    pub fn unparse(&self, node: &ParserNode, w: &mut dyn std::fmt::Write) -> std::fmt::Result {
        unparse_node(node, w)
    }
}

fn unparse_node(node: &ParserNode, w: &mut dyn std::fmt::Write) -> std::fmt::Result {
    for child in &node.children {
        match child {
            Child::Leaf(l) => w.write_str(l.as_str())?,
            Child::Node(n) => unparse_node(n, w)?,
        }
    }
    Ok(())
}
