//! The low-level parser node form: a `Tag` plus ordered children, each either a
//! nested node or a leaf slice of the scanner's source.

use std::fmt;
use std::sync::Arc;

use crate::rule::Rule;

/// A scanner slice: an `(offset, len)` pair into a shared source buffer.
#[derive(Clone)]
pub struct Leaf {
    source: Arc<str>,
    offset: usize,
    len: usize,
}

impl Leaf {
    pub fn new(source: Arc<str>, offset: usize, len: usize) -> Self {
        Self { source, offset, len }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_str(&self) -> &str {
        &self.source[self.offset..self.offset + self.len]
    }

    /// The shared source buffer this leaf slices into, for reassembling the
    /// text spanned by an ancestor node.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }
}

impl PartialEq for Leaf {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.len == other.len && self.as_str() == other.as_str()
    }
}
impl Eq for Leaf {}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leaf({:?}@{}..{})", self.as_str(), self.offset, self.offset + self.len)
    }
}

impl serde::Serialize for Leaf {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut st = s.serialize_struct("Leaf", 3)?;
        st.serialize_field("offset", &self.offset)?;
        st.serialize_field("len", &self.len)?;
        st.serialize_field("text", self.as_str())?;
        st.end()
    }
}

/// A single positional child of a [`ParserNode`]: either a nested node, or a leaf.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum Child {
    Node(ParserNode),
    Leaf(Leaf),
}

impl Child {
    /// The byte range `[start, end)` this child spans in the source, used by the
    /// unparser and by diagnostics.
    pub fn span(&self) -> (usize, usize) {
        match self {
            Child::Leaf(l) => (l.offset(), l.offset() + l.len()),
            Child::Node(n) => n.span(),
        }
    }
}

/// The raw AST produced by the parser engine: a rule tag, its ordered children,
/// and out-of-band `extra` slots recording the chosen branch index for every
/// `Oneof`/`Stack`-level this node represents.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ParserNode {
    pub tag: Rule,
    pub children: Vec<Child>,
    pub extra: Vec<usize>,
}

impl ParserNode {
    pub fn new(tag: Rule) -> Self {
        Self { tag, children: Vec::new(), extra: Vec::new() }
    }

    pub fn with_children(tag: Rule, children: Vec<Child>) -> Self {
        Self { tag, children, extra: Vec::new() }
    }

    pub fn span(&self) -> (usize, usize) {
        match (self.children.first(), self.children.last()) {
            (Some(first), Some(last)) => (first.span().0, last.span().1),
            _ => (0, 0),
        }
    }

    /// The full source text this node spans, found via any descendant leaf.
    /// `None` only for a node with no children at all (an empty production).
    pub fn text(&self) -> Option<&str> {
        let leaf = self.first_leaf()?;
        let (start, end) = self.span();
        Some(&leaf.source()[start..end])
    }

    fn first_leaf(&self) -> Option<&Leaf> {
        self.children.iter().find_map(|c| match c {
            Child::Leaf(l) => Some(l),
            Child::Node(n) => n.first_leaf(),
        })
    }
}
