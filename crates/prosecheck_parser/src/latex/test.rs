#[cfg(test)]
mod tests {
    use crate::annotated_text::AnnotatedText;
    use crate::builder::CodeAnnotatedTextBuilder;
    use crate::latex::LatexAnnotatedTextBuilder;
    use crate::settings::Settings;

    fn annotate(code_language_id: &str, code: &str) -> AnnotatedText {
        let mut builder = Box::new(LatexAnnotatedTextBuilder::new(code_language_id));
        builder.add_code(code).expect("non-strict scan never fails");
        builder.finish()
    }

    fn annotate_with_settings(code: &str, settings: &Settings) -> AnnotatedText {
        let mut builder = Box::new(LatexAnnotatedTextBuilder::new("latex"));
        builder.set_settings(settings);
        builder.add_code(code).expect("non-strict scan never fails");
        builder.finish()
    }

    fn plain_text(code: &str) -> String {
        annotate("latex", code).plain_text().to_string()
    }

    fn total_source_length(annotated_text: &AnnotatedText) -> usize {
        annotated_text
            .segments()
            .iter()
            .map(|segment| segment.span.source.len())
            .sum()
    }

    #[test]
    fn test_plain_prose_passes_through() {
        assert_eq!(plain_text("This is a test."), "This is a test.");
    }

    #[test]
    fn test_single_word_is_one_text_segment() {
        let annotated_text = annotate("latex", "Sentence.");
        assert_eq!(annotated_text.plain_text(), "Sentence.");
        assert_eq!(annotated_text.segments().len(), 1);
    }

    #[test]
    fn test_inline_math_becomes_dummy() {
        // "x" reads "ex", so the vowel-initial form is picked
        assert_eq!(
            plain_text("Let $x$ be a real number."),
            "Let Ina0 be a real number."
        );
        assert_eq!(plain_text("Let $\\beta$ denote it."), "Let Dummy0 denote it.");
    }

    #[test]
    fn test_math_vowel_state_from_commands() {
        assert_eq!(plain_text("$\\ell$"), "Ina0");
        // font-change commands leave the decision to the next atom
        assert_eq!(plain_text("$\\mathbf{x}$"), "Ina0");
        assert_eq!(plain_text("$\\gamma$"), "Dummy0");
    }

    #[test]
    fn test_heading_gets_synthetic_period() {
        assert_eq!(
            plain_text("\\section{Introduction} Hello."),
            "Introduction. Hello."
        );
        // existing sentence-final punctuation is kept as-is
        assert_eq!(plain_text("\\section{Intro.} Next."), "Intro. Next.");
    }

    #[test]
    fn test_heading_with_short_title_argument() {
        assert_eq!(
            plain_text("\\section[short]{Long title} Text."),
            "Long title. Text."
        );
    }

    #[test]
    fn test_smart_quotes() {
        assert_eq!(plain_text("He said ``hello''."), "He said \u{201c}hello\u{201d}.");
        assert_eq!(plain_text("\"`deutsch\"'"), "\u{201e}deutsch\u{201c}");
        assert_eq!(plain_text("a\"=b"), "a-b");
        assert_eq!(plain_text("it's"), "it's");
    }

    #[test]
    fn test_dashes() {
        assert_eq!(plain_text("a---b and c--d"), "a\u{2014}b and c\u{2013}d");
    }

    #[test]
    fn test_non_breaking_space() {
        assert_eq!(plain_text("A~B"), "A\u{00a0}B");
        assert_eq!(plain_text("a\\,b"), "a\u{202f}b");
    }

    #[test]
    fn test_display_math_environment() {
        assert_eq!(
            plain_text("\\begin{equation}a=1\\end{equation} Done."),
            " Dummy0 Done."
        );
        assert_eq!(plain_text("$$x$$"), " Dummy0 ");
        assert_eq!(plain_text("\\[ \\] After."), " Dummy0 After.");
    }

    #[test]
    fn test_empty_environment_math_is_elided() {
        // nothing non-trivial inside, so only a space survives
        assert_eq!(plain_text("\\begin{equation}\\end{equation}"), " ");
        assert_eq!(plain_text("$ $"), "");
    }

    #[test]
    fn test_inline_math_delimiters() {
        assert_eq!(plain_text("\\(x\\) end"), "Ina0 end");
    }

    #[test]
    fn test_math_carries_trailing_punctuation() {
        assert_eq!(plain_text("$a=b,$ c"), "Ina0, c");
    }

    #[test]
    fn test_math_trailing_spacing_command() {
        assert_eq!(plain_text("$a\\;$"), "Ina0 ");
    }

    #[test]
    fn test_text_command_inside_math() {
        assert_eq!(plain_text("$\\text{hi}$"), "hi");
        assert_eq!(
            plain_text("\\begin{equation}\\text{left} = 1\\end{equation} After."),
            " left Dummy0 After."
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(plain_text("% a comment\nNext."), "Next.");
        assert_eq!(plain_text("This is a\n% comment\ntest."), "This is a test.");
        // a comment spanning a blank line keeps the paragraph break
        assert_eq!(plain_text("a%x\n\n b"), "a\n\nb");
    }

    #[test]
    fn test_paragraph_break() {
        assert_eq!(plain_text("One.\n\nTwo."), "One.\n\nTwo.");
        assert_eq!(plain_text("a  \t b"), "a b");
    }

    #[test]
    fn test_accents() {
        assert_eq!(plain_text("\\\"{A}nton"), "\u{00c4}nton");
        assert_eq!(plain_text("caf\\'e"), "caf\u{00e9}");
        assert_eq!(plain_text("gar\\c{c}on"), "gar\u{00e7}on");
        assert_eq!(plain_text("\\r{A}ngstr\\\"om"), "\u{00c5}ngstr\u{00f6}m");
        assert_eq!(plain_text("na\\\"{\\i}ve"), "na\u{00ef}ve");
    }

    #[test]
    fn test_national_letters() {
        assert_eq!(plain_text("\\ss"), "\u{00df}");
        assert_eq!(plain_text("\\O"), "\u{00d8}");
        assert_eq!(plain_text("\\aa"), "\u{00e5}");
    }

    #[test]
    fn test_escaped_specials() {
        assert_eq!(plain_text("100\\% sure"), "100% sure");
        assert_eq!(plain_text("a \\$5 bill"), "a $5 bill");
    }

    #[test]
    fn test_abbreviation_macros() {
        assert_eq!(plain_text("foo \\dots bar"), "foo ... bar");
        assert_eq!(plain_text("\\eg apples"), "e.g. apples");
        assert_eq!(plain_text("$\\dots$"), "Dummy0");
    }

    #[test]
    fn test_lengths_are_consumed() {
        assert_eq!(plain_text("{12pt}"), "");
        assert_eq!(plain_text("{-0.5em}"), "");
        assert_eq!(plain_text("a[5mm]b"), "ab");
    }

    #[test]
    fn test_verb_command() {
        assert_eq!(plain_text("\\verb|code| rest"), "Dummy0 rest");
        assert_eq!(plain_text("\\verb*|a b| x"), "Dummy0 x");
    }

    #[test]
    fn test_ignored_environment() {
        assert_eq!(plain_text("\\begin{verbatim}raw\\end{verbatim}"), "");
        assert_eq!(
            plain_text("a\\begin{lstlisting}x = 1\\end{lstlisting}b"),
            "ab"
        );
    }

    #[test]
    fn test_default_command_catalogue() {
        assert_eq!(plain_text("See \\ref{sec:intro} now."), "See Dummy0 now.");
        assert_eq!(plain_text("As \\cite[p. 3]{key} says."), "As Dummy0 says.");
        assert_eq!(plain_text("\\usepackage[utf8]{inputenc}Text."), "Text.");
        assert_eq!(plain_text("\\label{sec:a}Next."), "Next.");
        // the URL argument is swallowed, the link text stays prose
        assert_eq!(plain_text("\\href{https://example.com}{the site}"), "the site");
    }

    #[test]
    fn test_unknown_command_keeps_arguments_as_text() {
        assert_eq!(plain_text("\\emphx{word} rest"), "word rest");
    }

    #[test]
    fn test_user_registered_commands() {
        let mut settings = Settings::default();
        settings
            .latex_commands
            .insert("\\todo{}".to_string(), "ignore".to_string());
        assert_eq!(
            annotate_with_settings("a \\todo{fix} b", &settings).plain_text(),
            "a b"
        );

        let mut settings = Settings::default();
        settings
            .latex_commands
            .insert("\\todo{}".to_string(), "dummy".to_string());
        assert_eq!(
            annotate_with_settings("See \\todo{x}.", &settings).plain_text(),
            "See Dummy0."
        );

        let mut settings = Settings::default();
        settings
            .latex_commands
            .insert("\\assets{}".to_string(), "pluralDummy".to_string());
        assert_eq!(
            annotate_with_settings("The \\assets{q} are fine.", &settings).plain_text(),
            "The Dummies0 are fine."
        );
    }

    #[test]
    fn test_user_registered_environment() {
        let mut settings = Settings::default();
        settings
            .latex_environments
            .insert("algorithm".to_string(), "ignore".to_string());
        assert_eq!(
            annotate_with_settings("\\begin{algorithm}x\\end{algorithm}done", &settings)
                .plain_text(),
            "done"
        );
    }

    #[test]
    fn test_unknown_action_strings_are_skipped() {
        let mut settings = Settings::default();
        settings
            .latex_commands
            .insert("\\todo{}".to_string(), "obliterate".to_string());
        assert_eq!(
            annotate_with_settings("\\todo{fix} it", &settings).plain_text(),
            "fix it"
        );
    }

    #[test]
    fn test_dummy_language() {
        let mut settings = Settings::default();
        settings.language_short_code = "fr".to_string();
        assert_eq!(
            annotate_with_settings("Soit $x$ un nombre.", &settings).plain_text(),
            "Soit Jimmy-0 un nombre."
        );
    }

    #[test]
    fn test_rsweave_code_chunk() {
        assert_eq!(
            annotate("rsweave", "<<x>>=\ny <- 1\n@\nDone.").plain_text(),
            " Done."
        );
        // the chunk syntax means nothing in the plain LaTeX dialect
        assert_eq!(plain_text("<<x>>=@"), "<<x>>=@");
    }

    #[test]
    fn test_strict_mode_reports_no_progress() {
        let mut builder = Box::new(LatexAnnotatedTextBuilder::new("latex"));
        builder.set_strict_mode(true);
        let error = builder.add_code("ab\\").expect_err("lone backslash stalls");
        assert_eq!(error.pos, 2);

        // non-strict logs, skips one character and keeps going
        let mut builder = Box::new(LatexAnnotatedTextBuilder::new("latex"));
        builder.add_code("ab\\").expect("non-strict recovers");
        assert_eq!(builder.finish().plain_text(), "ab");
    }

    #[test]
    fn test_source_conservation() {
        let sources = [
            "This is a test.",
            "Let $x$ be a real number.",
            "\\section{Introduction} Hello.",
            "\\begin{equation}a=1\\end{equation} Done.",
            "\\begin{verbatim}raw\\end{verbatim}",
            "{12pt}",
            "}{",
            "$",
            "~",
            "%",
            "a\\,b",
            "\\verb|code| rest",
            "He said ``hello''.",
        ];

        for source in sources {
            let annotated_text = annotate("latex", source);
            assert_eq!(
                total_source_length(&annotated_text),
                source.len(),
                "source conservation failed for {:?}",
                source
            );
        }
    }

    #[test]
    fn test_dummy_tokens_distinct_from_prose() {
        let source = "Let $x$ and $y$ be numbers.";
        let annotated_text = annotate("latex", source);
        for word in annotated_text.plain_text().split_whitespace() {
            if word.starts_with("Ina") || word.starts_with("Dummy") {
                assert!(!source.contains(word));
            }
        }
    }

    #[test]
    fn test_offset_mapping_through_builder() {
        let source = "Let $x$ be";
        let annotated_text = annotate("latex", source);
        assert_eq!(annotated_text.plain_text(), "Let Ina0 be");

        // "be" maps back to its source position
        assert_eq!(annotated_text.source_offset_for_plain(9), 8);
        // inside the dummy, clamps to the closing delimiter
        assert_eq!(annotated_text.source_offset_for_plain(5), 6);
        assert_eq!(annotated_text.plain_offset_for_source(8), 9);
    }

    #[test]
    fn test_unmatched_closers_are_harmless() {
        assert_eq!(plain_text("}a"), "a");
        assert_eq!(plain_text("\\end{itemize}b"), "b");
    }
}
