//! An immutable source buffer with an advancing cursor.
//!
//! A [`Scanner`] is a small, cheaply-cloned value (an `Arc<str>` plus a byte
//! offset) rather than a mutable reference into a borrowed buffer, so failed
//! parse attempts can snapshot-and-restore by value (`let start = scanner.clone();
//! ... *scanner = start;`) the way the reference implementation's
//! `start := *input` does with a value-typed `parser.Scanner`.

use std::fmt;
use std::sync::Arc;

use crate::node::Leaf;

/// A cursor over a shared, immutable source buffer.
#[derive(Clone)]
pub struct Scanner {
    source: Arc<str>,
    offset: usize,
}

impl Scanner {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self { source: source.into(), offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// The unconsumed tail of the source.
    pub fn remaining(&self) -> &str {
        &self.source[self.offset..]
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.source.len()
    }

    /// Attempts to consume `literal` at the current position. On success, advances
    /// the cursor and returns the matching [`Leaf`]; on failure the cursor is
    /// unchanged.
    pub fn consume_literal(&mut self, literal: &str) -> Option<Leaf> {
        if self.remaining().starts_with(literal) {
            Some(self.advance(literal.len()))
        } else {
            None
        }
    }

    /// Attempts an anchored match of `re` at the current position (the longest
    /// match starting exactly here). `re` must already encode start-anchoring
    /// (the compiler wraps every user pattern in `^(?:...)` before constructing
    /// it) — this method does not itself anchor, since `regex::Regex` has no
    /// "match at this byte offset only" primitive, only "leftmost match in this
    /// string".
    pub fn consume_regex(&mut self, re: &regex::Regex) -> Option<Leaf> {
        let m = re.find(self.remaining())?;
        if m.start() != 0 {
            return None;
        }
        Some(self.advance(m.end()))
    }

    fn advance(&mut self, len: usize) -> Leaf {
        let leaf = Leaf::new(self.source.clone(), self.offset, len);
        self.offset += len;
        leaf
    }

    /// A short, human-readable window around the current position, for error
    /// messages.
    pub fn context(&self) -> String {
        const WINDOW: usize = 40;
        let tail = self.remaining();
        let mut end = tail.len().min(WINDOW);
        while !tail.is_char_boundary(end) {
            end -= 1;
        }
        let snippet = &tail[..end];
        if end < tail.len() {
            format!("{snippet}…")
        } else {
            snippet.to_string()
        }
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("offset", &self.offset)
            .field("remaining", &self.context())
            .finish()
    }
}
