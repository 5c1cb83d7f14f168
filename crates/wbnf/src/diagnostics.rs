//! Builder-pattern renderer turning a [`wbnf_core::Error`] into a
//! human-readable snippet, for callers that want eyeball-friendly output
//! without rolling their own diagnostics UI.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use wbnf_core::Error;

/// Renders a single [`Error`] against the source it was produced from.
pub struct DiagnosticPrinter<'e, 's> {
    error: &'e Error,
    source: &'s str,
    path: Option<&'s str>,
    colored: bool,
}

impl<'e, 's> DiagnosticPrinter<'e, 's> {
    pub fn new(error: &'e Error, source: &'s str) -> Self {
        Self { error, source, path: None, colored: false }
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(range) = error_span(self.error, self.source.len()) else {
            return write!(w, "{}", self.error);
        };

        let renderer = if self.colored { Renderer::styled() } else { Renderer::plain() };
        let message = self.error.to_string();

        let mut snippet = Snippet::source(self.source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(range).label(&message));
        if let Some(p) = self.path {
            snippet = snippet.path(p);
        }

        let report = Level::ERROR.primary_title(&message).element(snippet);
        write!(w, "{}", renderer.render(&[report]))
    }
}

/// The byte range an error should be underlined at, if it names one. A
/// zero-width position is widened by one byte so `annotate-snippets` has
/// something to point at.
fn error_span(error: &Error, limit: usize) -> Option<std::ops::Range<usize>> {
    let start = match error {
        Error::ParseFailure { position, .. } => *position,
        Error::UnconsumedInput { position, .. } => *position,
        Error::ValidationFailure { .. } | Error::BadInput(_) | Error::Inconceivable(_) => return None,
    };
    let end = (start + 1).min(limit);
    Some(start.min(limit)..end)
}
