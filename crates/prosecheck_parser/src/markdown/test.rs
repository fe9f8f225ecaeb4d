#[cfg(test)]
mod tests {
    use crate::annotated_text::AnnotatedText;
    use crate::builder::CodeAnnotatedTextBuilder;
    use crate::markdown::MarkdownAnnotatedTextBuilder;
    use crate::settings::Settings;

    fn annotate(code: &str) -> AnnotatedText {
        let mut builder = Box::new(MarkdownAnnotatedTextBuilder::new());
        builder.add_code(code).expect("markdown walk never fails");
        builder.finish()
    }

    fn annotate_with_settings(code: &str, settings: &Settings) -> AnnotatedText {
        let mut builder = Box::new(MarkdownAnnotatedTextBuilder::new());
        builder.set_settings(settings);
        builder.add_code(code).expect("markdown walk never fails");
        builder.finish()
    }

    fn plain_text(code: &str) -> String {
        annotate(code).plain_text().to_string()
    }

    #[test]
    fn test_emphasis_passes_through() {
        assert_eq!(plain_text("This is a *test*.\n"), "This is a test.\n");
        assert_eq!(plain_text("Some **bold** text.\n"), "Some bold text.\n");
    }

    #[test]
    fn test_heading() {
        assert_eq!(plain_text("# Heading\n\nPara.\n"), "Heading\n\nPara.\n");
    }

    #[test]
    fn test_inline_code_becomes_dummy() {
        assert_eq!(plain_text("a `b` c\n"), "a Dummy0 c\n");
    }

    #[test]
    fn test_code_block_is_elided() {
        let plain = plain_text("Before.\n\n```\nsecret code\n```\n\nAfter.\n");
        assert!(plain.contains("Before."));
        assert!(plain.contains("After."));
        assert!(!plain.contains("secret"));
    }

    #[test]
    fn test_yaml_front_matter_is_stripped() {
        let plain = plain_text("---\ntitle: x\n---\n\nBody.\n");
        assert!(!plain.contains("title"));
        assert!(plain.ends_with("Body.\n"));
    }

    #[test]
    fn test_html_entity_is_decoded() {
        assert_eq!(plain_text("AT&amp;T\n"), "AT&T\n");
    }

    #[test]
    fn test_autolink_becomes_dummy() {
        assert_eq!(
            plain_text("Visit <https://example.com> now.\n"),
            "Visit Dummy0 now.\n"
        );
    }

    #[test]
    fn test_regular_link_text_is_checked() {
        assert_eq!(
            plain_text("See [the docs](https://example.com) here.\n"),
            "See the docs here.\n"
        );
    }

    #[test]
    fn test_soft_break_inside_paragraph_becomes_space() {
        assert_eq!(plain_text("line one\nline two\n"), "line one line two\n");
    }

    #[test]
    fn test_inline_math_becomes_dummy() {
        assert_eq!(plain_text("Let $x$ be.\n"), "Let Dummy0 be.\n");
    }

    #[test]
    fn test_user_registered_node() {
        let mut settings = Settings::default();
        settings
            .markdown_nodes
            .insert("Emphasis".to_string(), "ignore".to_string());
        assert_eq!(
            annotate_with_settings("a *b* c\n", &settings).plain_text(),
            "a  c\n"
        );
    }

    #[test]
    fn test_text_nodes_honour_registered_action() {
        let mut settings = Settings::default();
        settings
            .markdown_nodes
            .insert("Text".to_string(), "ignore".to_string());
        assert_eq!(
            annotate_with_settings("Hi there\n", &settings).plain_text(),
            "\n"
        );
    }

    #[test]
    fn test_user_override_beats_default() {
        let mut settings = Settings::default();
        settings
            .markdown_nodes
            .insert("Code".to_string(), "ignore".to_string());
        assert_eq!(
            annotate_with_settings("a `b` c\n", &settings).plain_text(),
            "a  c\n"
        );
    }

    #[test]
    fn test_source_conservation() {
        let sources = [
            "This is a *test*.\n",
            "# Heading\n\nPara.\n",
            "a `b` c\n",
            "Before.\n\n```\ncode\n```\n\nAfter.\n",
            "---\ntitle: x\n---\n\nBody.\n",
            "AT&amp;T\n",
            "Visit <https://example.com> now.\n",
        ];

        for source in sources {
            let annotated_text = annotate(source);
            let total: usize = annotated_text
                .segments()
                .iter()
                .map(|segment| segment.span.source.len())
                .sum();
            assert_eq!(total, source.len(), "source conservation failed for {:?}", source);
        }
    }

    #[test]
    fn test_offset_mapping_through_builder() {
        let source = "a `b` c\n";
        let annotated_text = annotate(source);
        assert_eq!(annotated_text.plain_text(), "a Dummy0 c\n");

        // the final "c" maps back to its source position
        assert_eq!(annotated_text.source_offset_for_plain(9), 6);
        // inside the dummy, clamps to the code span start
        assert_eq!(annotated_text.plain_offset_for_source(3), 2);
    }
}
