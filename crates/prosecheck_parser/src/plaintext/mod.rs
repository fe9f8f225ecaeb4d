use crate::annotated_text::{AnnotatedText, AnnotatedTextBuilder};
use crate::builder::CodeAnnotatedTextBuilder;
use crate::error::AnnotateError;
use crate::settings::Settings;

/// Pass-through builder for documents that carry no markup.
#[derive(Debug, Default)]
pub struct PlaintextAnnotatedTextBuilder {
    text: AnnotatedTextBuilder,
}

impl PlaintextAnnotatedTextBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeAnnotatedTextBuilder for PlaintextAnnotatedTextBuilder {
    fn add_code(&mut self, code: &str) -> Result<(), AnnotateError> {
        self.text.add_text(code);
        Ok(())
    }

    fn set_settings(&mut self, _settings: &Settings) {}

    fn finish(self: Box<Self>) -> AnnotatedText {
        self.text.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let mut builder = Box::new(PlaintextAnnotatedTextBuilder::new());
        builder.add_code("One sentence.\nAnother.").expect("plaintext");
        let annotated_text = builder.finish();
        assert_eq!(annotated_text.plain_text(), "One sentence.\nAnother.");
        assert_eq!(annotated_text.segments().len(), 1);
    }
}
