use crate::annotated_text::AnnotatedText;
use crate::error::AnnotateError;
use crate::latex::LatexAnnotatedTextBuilder;
use crate::markdown::MarkdownAnnotatedTextBuilder;
use crate::plaintext::PlaintextAnnotatedTextBuilder;
use crate::settings::Settings;

/// A builder that turns one markup document into annotated plain text.
///
/// Builders are stateful and strictly sequential; one instance processes
/// one document at a time. Two concurrent documents need two builders.
pub trait CodeAnnotatedTextBuilder {
    /// Parse `code` and append its segments to the annotated text.
    fn add_code(&mut self, code: &str) -> Result<(), AnnotateError>;

    /// Apply host settings: checking language and user-registered
    /// signatures.
    fn set_settings(&mut self, settings: &Settings);

    /// Abort on no-progress iterations instead of logging and skipping
    /// one character. Builders without a scanning loop ignore this.
    fn set_strict_mode(&mut self, _strict_mode: bool) {}

    /// Consume the builder and return the annotated text.
    fn finish(self: Box<Self>) -> AnnotatedText;
}

/// Create the builder matching a code language id. Unknown ids fall back
/// to the plain-text pass-through builder.
pub fn create_builder(code_language_id: &str) -> Box<dyn CodeAnnotatedTextBuilder> {
    match code_language_id {
        "latex" | "rsweave" => Box::new(LatexAnnotatedTextBuilder::new(code_language_id)),
        "markdown" => Box::new(MarkdownAnnotatedTextBuilder::new()),
        _ => Box::new(PlaintextAnnotatedTextBuilder::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_builder_fallback() {
        let mut builder = create_builder("restructuredtext");
        builder.add_code("Some plain prose.").expect("plaintext");
        assert_eq!(builder.finish().plain_text(), "Some plain prose.");
    }

    #[test]
    fn test_create_builder_latex() {
        let mut builder = create_builder("latex");
        builder.add_code("a~b").expect("latex");
        assert_eq!(builder.finish().plain_text(), "a\u{00a0}b");
    }
}
