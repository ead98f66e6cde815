//! Converting parse errors into annotated diagnostic messages.
//!
//! This module defines a small intermediate representation ([`Message`]) for
//! a diagnostic anchored at one or more [`Location`]s. Any error type that
//! implements [`MessageBase`] gets a [`Message`] for free; with the
//! `pretty-errors` feature enabled, a [`Message`] can also be turned into an
//! `annotate_snippets::Renderer`-compatible form for terminal output.

use super::Location;
use std::borrow::Cow;

/// Severity of an [`Annotation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnnotationType {
    Error,
    Warning,
    Info,
    Help,
}

/// One labeled pointer into the source code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Annotation<'a> {
    pub r#type: AnnotationType,
    pub label: Cow<'a, str>,
    pub location: &'a Location,
}

impl<'a> Annotation<'a> {
    #[must_use]
    pub fn new(r#type: AnnotationType, label: Cow<'a, str>, location: &'a Location) -> Self {
        Annotation {
            r#type,
            label,
            location,
        }
    }
}

/// A diagnostic message: a title plus one or more annotated locations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message<'a> {
    pub r#type: AnnotationType,
    pub title: Cow<'a, str>,
    pub annotations: Vec<Annotation<'a>>,
}

/// Trait implemented by error types that can be rendered as a [`Message`].
///
/// Implement this instead of `From<&E> for Message` directly; a blanket
/// `impl<'a, E: MessageBase> From<&'a E> for Message<'a>` is provided below.
pub trait MessageBase {
    fn message_title(&self) -> Cow<'_, str>;
    fn main_annotation(&self) -> Annotation<'_>;
    /// Appends any secondary annotations (e.g. "opened here") to `results`.
    fn additional_annotations<'a, T: Extend<Annotation<'a>>>(&'a self, results: &mut T) {
        let _ = results;
    }
}

impl<'a, E: MessageBase> From<&'a E> for Message<'a> {
    fn from(error: &'a E) -> Self {
        let main = error.main_annotation();
        let mut annotations = vec![main.clone()];
        error.additional_annotations(&mut annotations);
        Message {
            r#type: main.r#type,
            title: error.message_title(),
            annotations,
        }
    }
}

#[cfg(feature = "pretty-errors")]
mod render {
    use super::*;
    use crate::source::SourceBuffer;
    use annotate_snippets::{Annotation as SnippetAnnotation, Level, Renderer, Snippet};

    impl AnnotationType {
        fn level(self) -> Level<'static> {
            match self {
                AnnotationType::Error => Level::ERROR,
                AnnotationType::Warning => Level::WARNING,
                AnnotationType::Info => Level::INFO,
                AnnotationType::Help => Level::HELP,
            }
        }
    }

    /// Renders a [`Message`] against the original source text as a string
    /// suitable for printing to a terminal.
    #[must_use]
    pub fn render(message: &Message<'_>, buffer: SourceBuffer<'_>) -> String {
        let mut snippet = Snippet::source(buffer.text()).line_start(1);
        for annotation in &message.annotations {
            let span = annotation.location.span;
            let range = span.start..span.end.max(span.start + 1).min(buffer.len() + 1);
            let range = range.start..range.end.min(buffer.len());
            snippet = snippet.annotation(
                SnippetAnnotation::new(annotation.r#type.level(), &annotation.label)
                    .span(range),
            );
        }
        let group = message.r#type.level().title(&message.title).snippet(snippet);
        Renderer::styled().render(vec![group])
    }
}

#[cfg(feature = "pretty-errors")]
pub use render::render;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use std::rc::Rc;

    struct Dummy(Location);

    impl MessageBase for Dummy {
        fn message_title(&self) -> Cow<'_, str> {
            "something went wrong".into()
        }
        fn main_annotation(&self) -> Annotation<'_> {
            Annotation::new(AnnotationType::Error, "here".into(), &self.0)
        }
    }

    #[test]
    fn message_from_message_base() {
        let location = Location::new(crate::source::Span::new(3, 5), Rc::new(Source::Main));
        let dummy = Dummy(location);
        let message = Message::from(&dummy);
        assert_eq!(message.r#type, AnnotationType::Error);
        assert_eq!(message.title, "something went wrong");
        assert_eq!(message.annotations.len(), 1);
        assert_eq!(message.annotations[0].label, "here");
    }
}
