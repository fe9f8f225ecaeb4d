mod defaults;
mod node_signature;
mod test;

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;

use crate::annotated_text::{AnnotatedText, AnnotatedTextBuilder};
use crate::builder::CodeAnnotatedTextBuilder;
use crate::dummy::DummyGenerator;
use crate::error::AnnotateError;
use crate::settings::Settings;

pub use node_signature::{MarkdownNodeSignature, NodeAction};

static YAML_FRONT_MATTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)\A---\s*$.*?^---\s*$").unwrap());

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
}

fn tag_node_kind(tag: &Tag) -> &'static str {
    match tag {
        Tag::Paragraph => "Paragraph",
        Tag::Heading { .. } => "Heading",
        Tag::BlockQuote(_) => "BlockQuote",
        Tag::CodeBlock(_) => "CodeBlock",
        Tag::HtmlBlock => "HtmlBlock",
        Tag::List(Some(_)) => "OrderedList",
        Tag::List(None) => "BulletList",
        Tag::Item => "ListItem",
        Tag::FootnoteDefinition(_) => "FootnoteDefinition",
        Tag::DefinitionList => "DefinitionList",
        Tag::DefinitionListTitle => "DefinitionListTitle",
        Tag::DefinitionListDefinition => "DefinitionListDefinition",
        Tag::Table(_) => "Table",
        Tag::TableHead => "TableHead",
        Tag::TableRow => "TableRow",
        Tag::TableCell => "TableCell",
        Tag::Emphasis => "Emphasis",
        Tag::Strong => "Strong",
        Tag::Strikethrough => "Strikethrough",
        Tag::Superscript => "Superscript",
        Tag::Subscript => "Subscript",
        Tag::Link { link_type, .. } => {
            if matches!(
                link_type,
                pulldown_cmark::LinkType::Autolink | pulldown_cmark::LinkType::Email
            ) {
                "AutoLink"
            } else {
                "Link"
            }
        }
        Tag::Image { .. } => "Image",
        Tag::MetadataBlock(_) => "MetadataBlock",
    }
}

/// Builds annotated plain text from a Markdown document by walking the
/// event stream of the external Markdown parser.
pub struct MarkdownAnnotatedTextBuilder {
    text: AnnotatedTextBuilder,
    language: String,
    node_signatures: Vec<MarkdownNodeSignature>,
}

impl Default for MarkdownAnnotatedTextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownAnnotatedTextBuilder {
    pub fn new() -> Self {
        MarkdownAnnotatedTextBuilder {
            text: AnnotatedTextBuilder::new(),
            language: "en-US".to_string(),
            node_signatures: defaults::default_markdown_node_signatures(),
        }
    }
}

impl CodeAnnotatedTextBuilder for MarkdownAnnotatedTextBuilder {
    fn add_code(&mut self, code: &str) -> Result<(), AnnotateError> {
        let mut base = 0;
        if let Some(front_matter) = YAML_FRONT_MATTER_PATTERN.find(code) {
            self.text.add_markup(front_matter.as_str());
            base = front_matter.end();
        }

        let mut walk = MarkdownWalk {
            code,
            base,
            pos: base,
            sink: &mut self.text,
            language: &self.language,
            node_signatures: &self.node_signatures,
            node_kind_stack: Vec::new(),
            dummy_counter: 0,
        };
        walk.run();
        Ok(())
    }

    fn set_settings(&mut self, settings: &Settings) {
        self.language = settings.language_short_code.clone();

        for (name, action_string) in &settings.markdown_nodes {
            let (action, dummy_generator) = match action_string.as_str() {
                "default" => (NodeAction::Default, DummyGenerator::new()),
                "ignore" => (NodeAction::Ignore, DummyGenerator::new()),
                "dummy" => (NodeAction::Dummy, DummyGenerator::new()),
                "pluralDummy" => (NodeAction::Dummy, DummyGenerator::new_plural()),
                _ => continue,
            };
            self.node_signatures
                .push(MarkdownNodeSignature::new(name, action, dummy_generator));
        }
    }

    fn finish(self: Box<Self>) -> AnnotatedText {
        self.text.build()
    }
}

/// Per-`add_code` walk state over the parser's offset event stream.
struct MarkdownWalk<'a> {
    code: &'a str,
    base: usize,
    pos: usize,
    sink: &'a mut AnnotatedTextBuilder,
    language: &'a str,
    node_signatures: &'a [MarkdownNodeSignature],
    node_kind_stack: Vec<&'static str>,
    dummy_counter: usize,
}

impl<'a> MarkdownWalk<'a> {
    fn run(&mut self) {
        let code: &'a str = self.code;
        let parser = Parser::new_ext(&code[self.base..], parser_options());

        // nodes consumed whole (ignored or replaced by a dummy) still
        // produce events for their children; skip until the matching end
        let mut skip_depth = 0usize;

        for (event, range) in parser.into_offset_iter() {
            let range = (range.start + self.base)..(range.end + self.base);

            if skip_depth > 0 {
                match event {
                    Event::Start(_) => skip_depth += 1,
                    Event::End(_) => skip_depth -= 1,
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(tag) => {
                    let kind = tag_node_kind(&tag);
                    match self.matching_signature(kind) {
                        Some(signature) if signature.action() == NodeAction::Ignore => {
                            self.add_markup_to(range.end);
                            skip_depth = 1;
                        }
                        Some(signature) if signature.action() == NodeAction::Dummy => {
                            let dummy = self.generate_dummy(signature.dummy_generator());
                            self.add_markup_node(range, &dummy);
                            skip_depth = 1;
                        }
                        _ => {
                            if kind == "Paragraph" {
                                self.add_markup_to(range.start);
                            }
                            self.node_kind_stack.push(kind);
                        }
                    }
                }
                Event::End(_) => {
                    self.node_kind_stack.pop();
                }
                Event::Text(text) => match self.matching_signature("Text") {
                    Some(signature) if signature.action() == NodeAction::Ignore => {
                        self.add_markup_to(range.end);
                    }
                    Some(signature) if signature.action() == NodeAction::Dummy => {
                        let dummy = self.generate_dummy(signature.dummy_generator());
                        self.add_markup_node(range, &dummy);
                    }
                    _ => {
                        self.add_markup_to(range.start);
                        let raw = &code[range.start..range.end];
                        if raw == text.as_ref() {
                            self.add_text_to(range.end);
                        } else {
                            // decoded HTML entity or escaped character
                            self.add_markup_node(range, text.as_ref());
                        }
                    }
                },
                Event::Code(text) => self.visit_leaf("Code", range, Some(text.as_ref())),
                Event::InlineMath(_) => self.visit_leaf("InlineMath", range, None),
                Event::DisplayMath(_) => self.visit_leaf("DisplayMath", range, None),
                Event::Html(_) => self.visit_leaf("HtmlBlock", range, None),
                Event::InlineHtml(_) => self.visit_leaf("InlineHtml", range, None),
                Event::FootnoteReference(_) => {
                    self.visit_leaf("FootnoteReference", range, None)
                }
                Event::SoftBreak | Event::HardBreak | Event::Rule | Event::TaskListMarker(_) => {}
            }
        }

        self.add_markup_to(code.len());
    }

    /// Last matching registration wins, so user settings override the
    /// built-in catalogue.
    fn matching_signature(&self, kind: &str) -> Option<&'a MarkdownNodeSignature> {
        let signatures: &'a [MarkdownNodeSignature] = self.node_signatures;
        let mut matching = None;
        for signature in signatures {
            if signature.name() == kind {
                matching = Some(signature);
            }
        }
        matching
    }

    fn generate_dummy(&mut self, dummy_generator: &DummyGenerator) -> String {
        let dummy = dummy_generator.generate(self.language, self.dummy_counter);
        self.dummy_counter += 1;
        dummy
    }

    fn visit_leaf(&mut self, kind: &'static str, range: Range<usize>, verbatim: Option<&str>) {
        match self.matching_signature(kind) {
            Some(signature) if signature.action() == NodeAction::Dummy => {
                let dummy = self.generate_dummy(signature.dummy_generator());
                self.add_markup_node(range, &dummy);
            }
            Some(signature) if signature.action() == NodeAction::Ignore => {
                self.add_markup_to(range.end);
            }
            _ => match verbatim {
                Some(text) => self.add_markup_node(range, text),
                None => self.add_markup_to(range.end),
            },
        }
    }

    /// Close the gap up to `new_pos` as markup. Line breaks inside the gap
    /// become a space inside paragraphs and a line break elsewhere, so the
    /// checker still sees paragraph boundaries.
    fn add_markup_to(&mut self, new_pos: usize) {
        let code: &'a str = self.code;
        let new_pos = new_pos.min(code.len());
        let in_paragraph = self.node_kind_stack.contains(&"Paragraph");

        while self.pos < new_pos {
            let Some(offset) = code[self.pos..new_pos].find(['\r', '\n']) else {
                break;
            };
            let line_break_pos = self.pos + offset;
            if line_break_pos > self.pos {
                self.sink.add_markup(&code[self.pos..line_break_pos]);
            }
            let interpret_as = if in_paragraph { " " } else { "\n" };
            self.sink
                .add_markup_as(&code[line_break_pos..line_break_pos + 1], interpret_as);
            self.pos = line_break_pos + 1;
        }

        if new_pos > self.pos {
            self.sink.add_markup(&code[self.pos..new_pos]);
            self.pos = new_pos;
        }
    }

    fn add_markup_node(&mut self, range: Range<usize>, interpret_as: &str) {
        self.add_markup_to(range.start);
        let code: &'a str = self.code;
        if range.end > self.pos {
            self.sink
                .add_markup_as(&code[self.pos..range.end], interpret_as);
            self.pos = range.end;
        } else {
            self.sink.add_markup_as("", interpret_as);
        }
    }

    fn add_text_to(&mut self, new_pos: usize) {
        if new_pos > self.pos {
            let code: &'a str = self.code;
            self.sink.add_text(&code[self.pos..new_pos]);
            self.pos = new_pos;
        }
    }
}
