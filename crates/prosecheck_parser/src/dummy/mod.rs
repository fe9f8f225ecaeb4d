/// Produces the placeholder nouns that stand in for math, verbatim
/// literals and opaque commands in the plain text.
///
/// Tokens are deterministic in the per-run index and lexically distinct
/// from ordinary prose, so the checker never confuses them with document
/// words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DummyGenerator {
    plural: bool,
}

impl DummyGenerator {
    pub fn new() -> Self {
        Self { plural: false }
    }

    pub fn new_plural() -> Self {
        Self { plural: true }
    }

    pub fn generate(&self, language: &str, number: usize) -> String {
        self.generate_with_vowel(language, number, false)
    }

    /// `starts_with_vowel` picks the vowel-initial form, so a preceding
    /// article keeps its natural shape in languages where that matters.
    pub fn generate_with_vowel(
        &self,
        language: &str,
        number: usize,
        starts_with_vowel: bool,
    ) -> String {
        if language == "fr" || language.starts_with("fr-") {
            format!("Jimmy-{}", number)
        } else if self.plural {
            format!("Dummies{}", number)
        } else if starts_with_vowel {
            format!("Ina{}", number)
        } else {
            format!("Dummy{}", number)
        }
    }
}
