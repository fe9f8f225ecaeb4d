mod annotated_text;
mod builder;
mod dummy;
mod error;
mod latex;
mod markdown;
mod plaintext;
mod settings;

pub use annotated_text::{
    AnnotatedSegment, AnnotatedText, AnnotatedTextBuilder, SegmentKind, SpanPair,
};
pub use builder::{create_builder, CodeAnnotatedTextBuilder};
pub use dummy::DummyGenerator;
pub use error::AnnotateError;
pub use latex::{
    ArgumentType, CommandAction, EnvironmentAction, LatexAnnotatedTextBuilder,
    LatexCommandSignature, LatexDialect, LatexEnvironmentSignature,
};
pub use markdown::{MarkdownAnnotatedTextBuilder, MarkdownNodeSignature, NodeAction};
pub use plaintext::PlaintextAnnotatedTextBuilder;
pub use settings::Settings;

#[macro_use]
extern crate rust_i18n;

rust_i18n::i18n!("./locales", fallback = "en");

pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}
