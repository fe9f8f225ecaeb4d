use crate::dummy::DummyGenerator;

use super::node_signature::{MarkdownNodeSignature, NodeAction};

/// Node kinds that read as nouns are replaced with dummies; code and raw
/// HTML are discarded.
pub fn default_markdown_node_signatures() -> Vec<MarkdownNodeSignature> {
    const DUMMY_NODE_KINDS: [&str; 4] = ["AutoLink", "Code", "DisplayMath", "InlineMath"];
    const IGNORED_NODE_KINDS: [&str; 5] = [
        "CodeBlock",
        "FootnoteReference",
        "HtmlBlock",
        "InlineHtml",
        "MetadataBlock",
    ];

    let mut signatures = Vec::new();
    for name in DUMMY_NODE_KINDS {
        signatures.push(MarkdownNodeSignature::new(
            name,
            NodeAction::Dummy,
            DummyGenerator::new(),
        ));
    }
    for name in IGNORED_NODE_KINDS {
        signatures.push(MarkdownNodeSignature::new(
            name,
            NodeAction::Ignore,
            DummyGenerator::new(),
        ));
    }
    signatures
}
