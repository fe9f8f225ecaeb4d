use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::annotated_text::{AnnotatedText, AnnotatedTextBuilder};
use crate::builder::CodeAnnotatedTextBuilder;
use crate::dummy::DummyGenerator;
use crate::error::AnnotateError;
use crate::settings::Settings;

use super::command_signature::{
    match_argument_from_position, ArgumentType, CommandAction, LatexCommandSignature,
};
use super::defaults;
use super::environment_signature::{EnvironmentAction, LatexEnvironmentSignature};

static COMMAND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\\([^A-Za-z@]|[A-Za-z@]+)\*?").unwrap());
static ARGUMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{[^}]*?\}").unwrap());
static COMMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%.*?($|(\n|\r|\r\n)[ \n\r\t]*)").unwrap());
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \n\r\t]+(%.*?($|(\n|\r|\r\n)[ \n\r\t]*))?").unwrap());
static LENGTH_IN_BRACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{-?[0-9]*(\.[0-9]+)?(pt|mm|cm|ex|em|bp|dd|pc|in)\}").unwrap()
});
static LENGTH_IN_BRACKET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[-?[0-9]*(\.[0-9]+)?(pt|mm|cm|ex|em|bp|dd|pc|in)\]").unwrap()
});
static EM_DASH_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^---").unwrap());
static EN_DASH_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--").unwrap());
static ACCENT_PATTERN1: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\\[`'^~"=.])(([A-Za-z]|\\i)|(\{([A-Za-z]|\\i)\}))"#).unwrap()
});
static ACCENT_PATTERN2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\\[cr])( *([A-Za-z])|\{([A-Za-z])\})").unwrap());
static DISPLAY_MATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$\$").unwrap());
static RSWEAVE_BEGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<<.*?>>=").unwrap());
static RSWEAVE_END_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^@").unwrap());

/// Source dialect scanned by the builder. R-Sweave adds `<<…>>=` … `@`
/// literate-code chunks on top of plain LaTeX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatexDialect {
    Latex,
    Rsweave,
}

/// Scanner mode deciding how the current character is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LatexMode {
    ParagraphText,
    InlineText,
    Heading,
    InlineMath,
    DisplayMath,
    IgnoreEnvironment,
    Rsweave,
}

impl LatexMode {
    fn is_math(self) -> bool {
        matches!(self, LatexMode::InlineMath | LatexMode::DisplayMath)
    }

    fn is_ignore_environment(self) -> bool {
        matches!(self, LatexMode::IgnoreEnvironment)
    }

    fn is_text(self) -> bool {
        !self.is_math() && !self.is_ignore_environment()
    }
}

/// Article-governing initial sound of the current math block, inferred
/// from its first non-trivial atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathVowelState {
    Undecided,
    StartsWithVowel,
    StartsWithConsonant,
}

fn is_punctuation(ch: char) -> bool {
    matches!(ch, '.' | ',' | ':' | ';')
}

/// Letters whose English names are pronounced with a leading vowel sound
/// ("f" reads "eff") count as vowels here.
fn is_vowel(ch: char) -> bool {
    matches!(
        ch.to_ascii_lowercase(),
        'a' | 'e' | 'f' | 'h' | 'i' | 'l' | 'm' | 'n' | 'o' | 'r' | 's' | 'x'
    )
}

fn contains_two_ends_of_line(text: &str) -> bool {
    text.contains("\n\n") || text.contains("\r\r") || text.contains("\r\n\r\n")
}

fn convert_accent_to_unicode(accent_command: &str, letter: &str) -> &'static str {
    let accent_char = accent_command.chars().nth(1).unwrap_or('\0');
    match accent_char {
        '`' => match letter {
            "A" => "\u{00c0}",
            "E" => "\u{00c8}",
            "I" => "\u{00cc}",
            "O" => "\u{00d2}",
            "U" => "\u{00d9}",
            "a" => "\u{00e0}",
            "e" => "\u{00e8}",
            "i" | "\\i" => "\u{00ec}",
            "o" => "\u{00f2}",
            "u" => "\u{00f9}",
            _ => "",
        },
        '\'' => match letter {
            "A" => "\u{00c1}",
            "E" => "\u{00c9}",
            "I" => "\u{00cd}",
            "O" => "\u{00d3}",
            "U" => "\u{00da}",
            "Y" => "\u{00dd}",
            "a" => "\u{00e1}",
            "e" => "\u{00e9}",
            "i" | "\\i" => "\u{00ed}",
            "o" => "\u{00f3}",
            "u" => "\u{00fa}",
            "y" => "\u{00fd}",
            _ => "",
        },
        '^' => match letter {
            "A" => "\u{00c2}",
            "E" => "\u{00ca}",
            "I" => "\u{00ce}",
            "O" => "\u{00d4}",
            "U" => "\u{00db}",
            "Y" => "\u{0176}",
            "a" => "\u{00e2}",
            "e" => "\u{00ea}",
            "i" | "\\i" => "\u{00ee}",
            "o" => "\u{00f4}",
            "u" => "\u{00fb}",
            "y" => "\u{0177}",
            _ => "",
        },
        '~' => match letter {
            "A" => "\u{00c3}",
            "E" => "\u{1ebc}",
            "I" => "\u{0128}",
            "N" => "\u{00d1}",
            "O" => "\u{00d5}",
            "U" => "\u{0168}",
            "a" => "\u{00e3}",
            "e" => "\u{1ebd}",
            "i" | "\\i" => "\u{0129}",
            "n" => "\u{00f1}",
            "o" => "\u{00f5}",
            "u" => "\u{0169}",
            _ => "",
        },
        '"' => match letter {
            "A" => "\u{00c4}",
            "E" => "\u{00cb}",
            "I" => "\u{00cf}",
            "O" => "\u{00d6}",
            "U" => "\u{00dc}",
            "Y" => "\u{0178}",
            "a" => "\u{00e4}",
            "e" => "\u{00eb}",
            "i" | "\\i" => "\u{00ef}",
            "o" => "\u{00f6}",
            "u" => "\u{00fc}",
            "y" => "\u{00ff}",
            _ => "",
        },
        '=' => match letter {
            "A" => "\u{0100}",
            "E" => "\u{0112}",
            "I" => "\u{012a}",
            "O" => "\u{014c}",
            "U" => "\u{016a}",
            "Y" => "\u{0232}",
            "a" => "\u{0101}",
            "e" => "\u{0113}",
            "i" | "\\i" => "\u{012b}",
            "o" => "\u{014d}",
            "u" => "\u{016b}",
            "y" => "\u{0233}",
            _ => "",
        },
        '.' => match letter {
            "A" => "\u{0226}",
            "E" => "\u{0116}",
            "I" => "\u{0130}",
            "O" => "\u{022e}",
            "a" => "\u{0227}",
            "e" => "\u{0117}",
            "o" => "\u{022f}",
            _ => "",
        },
        'c' => match letter {
            "C" => "\u{00c7}",
            "c" => "\u{00e7}",
            _ => "",
        },
        'r' => match letter {
            "A" => "\u{00c5}",
            "U" => "\u{016e}",
            "a" => "\u{00e5}",
            "u" => "\u{016f}",
            _ => "",
        },
        _ => "",
    }
}

/// Stateful scanner that turns LaTeX source into annotated plain text.
pub struct LatexAnnotatedTextBuilder {
    text: AnnotatedTextBuilder,
    dialect: LatexDialect,
    language: String,
    command_signatures: Vec<LatexCommandSignature>,
    command_signature_map: HashMap<String, Vec<LatexCommandSignature>>,
    environment_signatures: Vec<LatexEnvironmentSignature>,
    strict_mode: bool,
}

impl LatexAnnotatedTextBuilder {
    pub fn new(code_language_id: &str) -> Self {
        let command_signatures = defaults::default_latex_command_signatures();
        let command_signature_map = create_command_signature_map(&command_signatures);

        LatexAnnotatedTextBuilder {
            text: AnnotatedTextBuilder::new(),
            dialect: if code_language_id == "rsweave" {
                LatexDialect::Rsweave
            } else {
                LatexDialect::Latex
            },
            language: "en-US".to_string(),
            command_signatures,
            command_signature_map,
            environment_signatures: defaults::default_latex_environment_signatures(),
            strict_mode: false,
        }
    }

    pub fn dialect(&self) -> LatexDialect {
        self.dialect
    }
}

fn create_command_signature_map(
    signatures: &[LatexCommandSignature],
) -> HashMap<String, Vec<LatexCommandSignature>> {
    let mut map: HashMap<String, Vec<LatexCommandSignature>> = HashMap::new();
    for signature in signatures {
        map.entry(signature.name().to_string())
            .or_default()
            .push(signature.clone());
    }
    map
}

impl CodeAnnotatedTextBuilder for LatexAnnotatedTextBuilder {
    fn add_code(&mut self, code: &str) -> Result<(), AnnotateError> {
        let mut scanner = LatexScanner {
            code,
            pos: 0,
            sink: &mut self.text,
            dialect: self.dialect,
            language: &self.language,
            command_signature_map: &self.command_signature_map,
            environment_signatures: &self.environment_signatures,
            strict_mode: self.strict_mode,
            mode_stack: vec![LatexMode::ParagraphText],
            dummy_counter: 0,
            last_space: false,
            last_punctuation: false,
            dummy_last_space: "",
            dummy_last_punctuation: String::new(),
            is_math_empty: true,
            math_vowel_state: MathVowelState::Undecided,
            preserve_dummy_last: false,
            can_insert_space_before_dummy: false,
            is_math_char_trivial: false,
            ignore_environment_end_pattern: None,
            cur_char: '\0',
            cur_mode: LatexMode::ParagraphText,
        };
        scanner.run()
    }

    fn set_settings(&mut self, settings: &Settings) {
        self.language = settings.language_short_code.clone();

        for (prototype, action_string) in &settings.latex_commands {
            let (action, dummy_generator) = match action_string.as_str() {
                "default" => (CommandAction::Default, DummyGenerator::new()),
                "ignore" => (CommandAction::Ignore, DummyGenerator::new()),
                "dummy" => (CommandAction::Dummy, DummyGenerator::new()),
                "pluralDummy" => (CommandAction::Dummy, DummyGenerator::new_plural()),
                _ => continue,
            };

            match LatexCommandSignature::parse(prototype, action, dummy_generator) {
                Some(signature) => self.command_signatures.push(signature),
                None => log::warn!(
                    "{}",
                    t!(
                        "skipping malformed command signature prototype '%{prototype}'",
                        prototype = prototype
                    )
                ),
            }
        }

        self.command_signature_map = create_command_signature_map(&self.command_signatures);

        for (name, action_string) in &settings.latex_environments {
            let action = match action_string.as_str() {
                "default" => EnvironmentAction::Default,
                "ignore" => EnvironmentAction::Ignore,
                _ => continue,
            };
            self.environment_signatures
                .push(LatexEnvironmentSignature::new(name, action));
        }
    }

    fn set_strict_mode(&mut self, strict_mode: bool) {
        self.strict_mode = strict_mode;
    }

    fn finish(self: Box<Self>) -> AnnotatedText {
        self.text.build()
    }
}

/// Per-`add_code` scanner state. The mode stack is never empty: popping
/// the last entry re-seeds it with `ParagraphText`.
struct LatexScanner<'a> {
    code: &'a str,
    pos: usize,
    sink: &'a mut AnnotatedTextBuilder,
    dialect: LatexDialect,
    language: &'a str,
    command_signature_map: &'a HashMap<String, Vec<LatexCommandSignature>>,
    environment_signatures: &'a [LatexEnvironmentSignature],
    strict_mode: bool,

    mode_stack: Vec<LatexMode>,
    dummy_counter: usize,
    last_space: bool,
    last_punctuation: bool,
    dummy_last_space: &'static str,
    dummy_last_punctuation: String,
    is_math_empty: bool,
    math_vowel_state: MathVowelState,
    preserve_dummy_last: bool,
    can_insert_space_before_dummy: bool,
    is_math_char_trivial: bool,
    ignore_environment_end_pattern: Option<Regex>,

    cur_char: char,
    cur_mode: LatexMode,
}

impl<'a> LatexScanner<'a> {
    fn run(&mut self) -> Result<(), AnnotateError> {
        while self.pos < self.code.len() {
            let Some(cur_char) = self.code[self.pos..].chars().next() else {
                break;
            };
            self.cur_char = cur_char;
            self.cur_mode = self.top_mode();
            self.is_math_char_trivial = false;
            let last_pos = self.pos;

            if self.cur_mode.is_ignore_environment() {
                self.scan_ignore_environment();
            } else if self.dialect == LatexDialect::Rsweave && self.cur_mode == LatexMode::Rsweave {
                self.scan_rsweave();
            } else {
                match cur_char {
                    '\\' => self.scan_command(),
                    '{' => self.scan_open_brace(),
                    '}' => self.scan_close_brace(),
                    '$' => self.scan_dollar(),
                    '%' => self.scan_comment(),
                    ' ' | '&' | '~' | '\n' | '\r' | '\t' => self.scan_whitespace(),
                    '`' | '\'' | '"' => self.scan_quote(),
                    '-' => self.scan_dash(),
                    '[' => self.scan_bracket(),
                    '<' => self.scan_angle(),
                    _ => self.scan_plain_char(),
                }
            }

            if !self.is_math_char_trivial {
                self.can_insert_space_before_dummy = false;
                self.is_math_empty = false;
            }

            if self.pos == last_pos {
                if self.strict_mode {
                    return Err(AnnotateError::new(
                        t!(
                            "scanner failed to advance: %{state}",
                            state = self.debug_information()
                        )
                        .to_string(),
                        self.pos,
                    ));
                }

                log::warn!(
                    "{}",
                    t!(
                        "scanner failed to advance, skipping one character: %{state}",
                        state = self.debug_information()
                    )
                );
                let cur = self.cur_str();
                self.add_markup(cur);
            }
        }

        Ok(())
    }

    fn top_mode(&self) -> LatexMode {
        self.mode_stack
            .last()
            .copied()
            .unwrap_or(LatexMode::ParagraphText)
    }

    fn cur_str(&self) -> &'a str {
        let code: &'a str = self.code;
        &code[self.pos..self.pos + self.cur_char.len_utf8()]
    }

    fn match_from_position(&self, pattern: &Regex, pos: usize) -> &'a str {
        let code: &'a str = self.code;
        pattern.find(&code[pos..]).map_or("", |m| m.as_str())
    }

    fn pop_mode(&mut self) {
        self.mode_stack.pop();
        if self.mode_stack.is_empty() {
            self.mode_stack.push(LatexMode::ParagraphText);
        }
    }

    fn enter_display_math(&mut self) {
        self.mode_stack.push(LatexMode::DisplayMath);
        self.is_math_empty = true;
        self.math_vowel_state = MathVowelState::Undecided;
        self.can_insert_space_before_dummy = true;
    }

    fn enter_inline_math(&mut self) {
        self.mode_stack.push(LatexMode::InlineMath);
        self.is_math_empty = true;
        self.math_vowel_state = MathVowelState::Undecided;
        self.can_insert_space_before_dummy = true;
        self.is_math_char_trivial = true;
    }

    fn text_added(&mut self, text: &str) {
        let Some(last_char) = text.chars().last() else {
            return;
        };
        self.last_space = matches!(last_char, ' ' | '\n' | '\r');
        self.last_punctuation = is_punctuation(last_char);
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.sink.add_text(text);
        self.pos += text.len();
        self.text_added(text);
    }

    fn add_markup(&mut self, markup: &str) {
        if markup.is_empty() {
            return;
        }
        self.sink.add_markup(markup);
        self.pos += markup.len();

        if self.preserve_dummy_last {
            self.preserve_dummy_last = false;
        } else {
            self.dummy_last_space = "";
            self.dummy_last_punctuation.clear();
        }
    }

    fn add_markup_as(&mut self, markup: &str, interpret_as: &str) {
        if interpret_as.is_empty() {
            self.add_markup(markup);
            return;
        }
        self.sink.add_markup_as(markup, interpret_as);
        self.pos += markup.len();
        self.preserve_dummy_last = false;
        self.text_added(interpret_as);
    }

    fn generate_dummy(&mut self) -> String {
        self.generate_dummy_with(&DummyGenerator::new())
    }

    /// Summarise the math block (or opaque region) that just closed.
    /// Spacing and punctuation carried in `dummy_last_*` are re-attached
    /// so the inserted token does not create a fake sentence boundary.
    fn generate_dummy_with(&mut self, dummy_generator: &DummyGenerator) -> String {
        let starts_with_vowel = self.math_vowel_state == MathVowelState::StartsWithVowel;

        let dummy = if self.cur_mode.is_text() {
            let dummy = dummy_generator.generate_with_vowel(
                self.language,
                self.dummy_counter,
                starts_with_vowel,
            );
            self.dummy_counter += 1;
            dummy
        } else if self.is_math_empty {
            if self.cur_mode == LatexMode::DisplayMath && !self.last_space {
                " ".to_string()
            } else {
                String::new()
            }
        } else if self.cur_mode == LatexMode::DisplayMath {
            let leading_space = if self.last_space { "" } else { " " };
            let trailing_space = if self.top_mode() == LatexMode::InlineText {
                self.dummy_last_space
            } else {
                " "
            };
            let dummy = format!(
                "{}{}{}{}",
                leading_space,
                dummy_generator.generate(self.language, self.dummy_counter),
                self.dummy_last_punctuation,
                trailing_space
            );
            self.dummy_counter += 1;
            dummy
        } else {
            let dummy = format!(
                "{}{}{}",
                dummy_generator.generate_with_vowel(
                    self.language,
                    self.dummy_counter,
                    starts_with_vowel
                ),
                self.dummy_last_punctuation,
                self.dummy_last_space
            );
            self.dummy_counter += 1;
            dummy
        };

        self.dummy_last_space = "";
        self.dummy_last_punctuation.clear();
        self.math_vowel_state = MathVowelState::Undecided;
        dummy
    }

    fn scan_ignore_environment(&mut self) {
        let code: &'a str = self.code;
        let end = match self.ignore_environment_end_pattern.as_ref() {
            Some(pattern) => pattern.find(&code[self.pos..]).map_or("", |m| m.as_str()),
            None => {
                log::warn!("{}", t!("ignored-environment end pattern not set"));
                self.pop_mode();
                return;
            }
        };

        if end.is_empty() {
            let cur = self.cur_str();
            self.add_markup(cur);
        } else {
            self.pop_mode();
            self.add_markup(end);
        }
    }

    fn scan_rsweave(&mut self) {
        let end = self.match_from_position(&RSWEAVE_END_PATTERN, self.pos);
        if end.is_empty() {
            let cur = self.cur_str();
            self.add_markup(cur);
        } else {
            self.pop_mode();
            self.add_markup(end);
        }
    }

    fn scan_command(&mut self) {
        let command = self.match_from_position(&COMMAND_PATTERN, self.pos);

        match command {
            "\\begin" | "\\end" => self.scan_environment_command(command),
            "\\$" | "\\%" | "\\&" => {
                let interpret_as = &command[1..];
                self.add_markup_as(command, interpret_as);
            }
            "\\[" => {
                self.enter_display_math();
                self.add_markup(command);
            }
            "\\(" => {
                self.enter_inline_math();
                self.add_markup(command);
            }
            "\\]" | "\\)" => {
                self.pop_mode();
                let dummy = self.generate_dummy();
                self.add_markup_as(command, &dummy);
            }
            "\\AA" => self.add_markup_as(command, "\u{00c5}"),
            "\\O" => self.add_markup_as(command, "\u{00d8}"),
            "\\aa" => self.add_markup_as(command, "\u{00e5}"),
            "\\ss" => self.add_markup_as(command, "\u{00df}"),
            "\\o" => self.add_markup_as(command, "\u{00f8}"),
            "\\`" | "\\'" | "\\^" | "\\~" | "\\\"" | "\\=" | "\\." => {
                self.scan_accent(&ACCENT_PATTERN1, command)
            }
            "\\c" | "\\r" => self.scan_accent(&ACCENT_PATTERN2, command),
            // soft hyphen
            "\\-" => self.add_markup(command),
            "\\ " | "\\," | "\\;" | "\\\\" | "\\hfill" | "\\hspace" | "\\hspace*" | "\\quad"
            | "\\qquad" | "\\newline" => self.scan_spacing_command(command),
            "\\dots" | "\\eg" | "\\egc" | "\\euro" | "\\ie" | "\\iec" => {
                let interpret_as = if self.cur_mode.is_math() {
                    ""
                } else {
                    match command {
                        "\\dots" => "...",
                        "\\eg" => "e.g.",
                        "\\egc" => "e.g.,",
                        "\\euro" => "\u{20ac}",
                        "\\ie" => "i.e.",
                        "\\iec" => "i.e.,",
                        _ => "",
                    }
                };
                self.add_markup_as(command, interpret_as);
            }
            "\\notag" | "\\qed" => {
                self.preserve_dummy_last = true;
                self.add_markup(command);
            }
            "\\part" | "\\chapter" | "\\section" | "\\subsection" | "\\subsubsection"
            | "\\paragraph" | "\\subparagraph" | "\\part*" | "\\chapter*" | "\\section*"
            | "\\subsection*" | "\\subsubsection*" | "\\paragraph*" | "\\subparagraph*" => {
                self.scan_heading_command(command);
            }
            "\\text" | "\\intertext" => {
                self.mode_stack.push(LatexMode::InlineText);
                let interpret_as = if self.cur_mode.is_math() {
                    self.generate_dummy()
                } else {
                    String::new()
                };
                let markup = format!("{}{{", command);
                self.add_markup_as(&markup, &interpret_as);
            }
            "\\verb" | "\\verb*" => self.scan_verb_command(),
            _ => self.scan_generic_command(command),
        }
    }

    fn scan_environment_command(&mut self, command: &'a str) {
        self.preserve_dummy_last = true;
        self.add_markup(command);

        let argument = self.match_from_position(&ARGUMENT_PATTERN, self.pos);
        let environment_name = if argument.len() >= 2 {
            &argument[1..argument.len() - 1]
        } else {
            ""
        };
        let is_begin = command == "\\begin";
        let mut interpret_as = String::new();

        if defaults::is_math_environment(environment_name) {
            if is_begin {
                if environment_name == "math" {
                    self.enter_inline_math();
                } else {
                    self.enter_display_math();
                }
            } else {
                self.pop_mode();
                interpret_as = self.generate_dummy();
            }
        } else if is_begin {
            let signatures: &'a [LatexEnvironmentSignature] = self.environment_signatures;
            let mut matching: Option<&'a LatexEnvironmentSignature> = None;
            for signature in signatures {
                if signature.name() == environment_name {
                    matching = Some(signature);
                }
            }

            if matching.is_some_and(|signature| signature.action() == EnvironmentAction::Ignore) {
                self.mode_stack.push(LatexMode::IgnoreEnvironment);
                self.ignore_environment_end_pattern =
                    Regex::new(&format!(r"^\\end\{{{}\}}", regex::escape(environment_name)))
                        .ok();
            } else {
                self.mode_stack.push(self.cur_mode);
            }
        } else {
            self.pop_mode();
        }

        if !self.top_mode().is_ignore_environment() {
            self.is_math_char_trivial = true;
            self.preserve_dummy_last = true;
            self.add_markup_as(argument, &interpret_as);
            if is_begin {
                self.consume_environment_arguments(environment_name);
            }
        }
    }

    fn consume_environment_arguments(&mut self, environment_name: &str) {
        let code: &'a str = self.code;

        while self.pos < code.len() {
            let argument = match_argument_from_position(code, self.pos, ArgumentType::Brace);
            if !argument.is_empty() {
                self.add_markup(argument);
                continue;
            }

            let argument = match_argument_from_position(code, self.pos, ArgumentType::Bracket);
            if !argument.is_empty() {
                self.add_markup(argument);
                continue;
            }

            if environment_name == "textblock" || environment_name == "textblock*" {
                let argument =
                    match_argument_from_position(code, self.pos, ArgumentType::Parenthesis);
                if !argument.is_empty() {
                    self.add_markup(argument);
                    continue;
                }
            }

            break;
        }
    }

    fn scan_accent(&mut self, pattern: &Regex, command: &'a str) {
        let code: &'a str = self.code;
        match pattern.captures(&code[self.pos..]) {
            Some(captures) => {
                let accent_command = captures.get(1).map_or("", |m| m.as_str());
                let letter = captures
                    .get(3)
                    .or_else(|| captures.get(5))
                    .or_else(|| captures.get(4))
                    .map_or("", |m| m.as_str());
                let whole = captures.get(0).map_or("", |m| m.as_str());
                let interpret_as = convert_accent_to_unicode(accent_command, letter);
                self.add_markup_as(whole, interpret_as);
            }
            None => self.add_markup(command),
        }
    }

    fn scan_spacing_command(&mut self, command: &'a str) {
        let mut full = command.to_string();
        if command == "\\hspace" || command == "\\hspace*" {
            let argument = self.match_from_position(&ARGUMENT_PATTERN, self.pos + command.len());
            full.push_str(argument);
        }

        if self.cur_mode.is_math() && !self.last_space && self.can_insert_space_before_dummy {
            self.add_markup_as(&full, " ");
        } else {
            self.preserve_dummy_last = true;

            if self.cur_mode.is_math() {
                self.add_markup(&full);
                self.dummy_last_space = " ";
            } else {
                let space = if self.last_space {
                    ""
                } else if command == "\\," {
                    "\u{202f}"
                } else {
                    " "
                };
                self.add_markup_as(&full, space);
            }
        }
    }

    fn scan_heading_command(&mut self, command: &'a str) {
        self.add_markup(command);

        let code: &'a str = self.code;
        let heading_argument = match_argument_from_position(code, self.pos, ArgumentType::Bracket);
        if !heading_argument.is_empty() {
            self.add_markup(heading_argument);
        }

        self.mode_stack.push(LatexMode::Heading);
        self.add_markup("{");
    }

    fn scan_verb_command(&mut self) {
        let verb_command = self.match_verb_literal();
        let dummy = self.generate_dummy();
        self.add_markup_as(verb_command, &dummy);
    }

    /// `\verb` and `\verb*` take a literal delimited by the first
    /// character after the command word; the literal never spans a line
    /// break.
    fn match_verb_literal(&self) -> &'a str {
        let code: &'a str = self.code;
        let tail = &code[self.pos..];
        let Some(rest) = tail.strip_prefix("\\verb") else {
            return "";
        };
        let rest = rest.strip_prefix('*').unwrap_or(rest);
        let prefix_len = tail.len() - rest.len();

        let mut chars = rest.char_indices();
        let Some((_, delimiter)) = chars.next() else {
            return "";
        };
        if delimiter == '\n' || delimiter == '\r' {
            return "";
        }

        for (offset, ch) in chars {
            if ch == delimiter {
                return &tail[..prefix_len + offset + ch.len_utf8()];
            }
            if ch == '\n' || ch == '\r' {
                return "";
            }
        }

        ""
    }

    fn scan_generic_command(&mut self, command: &'a str) {
        let code: &'a str = self.code;
        let map: &'a HashMap<String, Vec<LatexCommandSignature>> = self.command_signature_map;

        let mut best_match = "";
        let mut matching: Option<&'a LatexCommandSignature> = None;

        if let Some(candidates) = map.get(command) {
            for signature in candidates {
                let candidate = signature.match_from_position(code, self.pos);
                // ties go to the later registration
                if !candidate.is_empty() && candidate.len() >= best_match.len() {
                    best_match = candidate;
                    matching = Some(signature);
                }
            }
        }

        match matching {
            Some(signature) if signature.action() == CommandAction::Ignore => {
                self.add_markup(best_match);
            }
            Some(signature) if signature.action() == CommandAction::Dummy => {
                let dummy = self.generate_dummy_with(signature.dummy_generator());
                self.add_markup_as(best_match, &dummy);
            }
            _ => {
                if self.cur_mode.is_math() && self.math_vowel_state == MathVowelState::Undecided {
                    self.math_vowel_state = match command {
                        "\\mathbb" | "\\mathbf" | "\\mathcal" | "\\mathfrak" | "\\mathit"
                        | "\\mathnormal" | "\\mathsf" | "\\mathtt" => MathVowelState::Undecided,
                        "\\ell" => MathVowelState::StartsWithVowel,
                        _ => MathVowelState::StartsWithConsonant,
                    };
                }
                self.add_markup(command);
            }
        }
    }

    fn scan_open_brace(&mut self) {
        let length = self.match_from_position(&LENGTH_IN_BRACE_PATTERN, self.pos);
        if !length.is_empty() {
            self.add_markup(length);
        } else {
            self.mode_stack.push(self.cur_mode);
            let cur = self.cur_str();
            self.add_markup(cur);
        }
    }

    fn scan_close_brace(&mut self) {
        // a heading without sentence-final punctuation gets a synthetic
        // period so the checker sees a complete sentence
        let interpret_as = if self.cur_mode == LatexMode::Heading && !self.last_punctuation {
            "."
        } else {
            ""
        };
        self.pop_mode();
        let cur = self.cur_str();
        self.add_markup_as(cur, interpret_as);
        self.can_insert_space_before_dummy = true;

        if self.cur_mode.is_text() && self.top_mode().is_math() {
            self.is_math_empty = true;
        }

        self.is_math_char_trivial = true;
    }

    fn scan_dollar(&mut self) {
        let display_math = self.match_from_position(&DISPLAY_MATH_PATTERN, self.pos);

        if !display_math.is_empty() {
            if self.cur_mode == LatexMode::DisplayMath {
                self.pop_mode();
                let dummy = self.generate_dummy();
                self.add_markup_as(display_math, &dummy);
            } else {
                self.enter_display_math();
                self.add_markup(display_math);
            }
        } else if self.cur_mode == LatexMode::InlineMath {
            self.pop_mode();
            let dummy = self.generate_dummy();
            let cur = self.cur_str();
            self.add_markup_as(cur, &dummy);
        } else {
            self.enter_inline_math();
            let cur = self.cur_str();
            self.add_markup(cur);
        }
    }

    fn scan_comment(&mut self) {
        let comment = self.match_from_position(&COMMENT_PATTERN, self.pos);
        self.preserve_dummy_last = true;
        self.is_math_char_trivial = true;
        let interpret_as = if contains_two_ends_of_line(comment) {
            "\n\n"
        } else {
            ""
        };
        self.add_markup_as(comment, interpret_as);
    }

    fn scan_whitespace(&mut self) {
        let whitespace = if self.cur_char != '~' && self.cur_char != '&' {
            self.match_from_position(&WHITESPACE_PATTERN, self.pos)
        } else {
            self.cur_str()
        };
        self.preserve_dummy_last = true;
        self.is_math_char_trivial = true;

        if self.cur_mode.is_text() {
            if contains_two_ends_of_line(whitespace) {
                self.add_markup_as(whitespace, "\n\n");
            } else if self.cur_char == '~' {
                let interpret_as = if self.last_space { "" } else { "\u{00a0}" };
                self.add_markup_as(whitespace, interpret_as);
            } else {
                let interpret_as = if self.last_space { "" } else { " " };
                self.add_markup_as(whitespace, interpret_as);
            }
        } else {
            self.add_markup(whitespace);
        }

        if self.cur_char == '~' || self.cur_char == '&' {
            self.dummy_last_space = " ";
        }
    }

    fn scan_quote(&mut self) {
        if !self.cur_mode.is_text() {
            let cur = self.cur_str();
            self.add_markup(cur);
            return;
        }

        let code: &'a str = self.code;
        let mut chars = code[self.pos..].chars();
        let first = chars.next();
        let second = chars.next();

        let mut quote = "";
        let mut smart_quote = "";
        if let (Some(first), Some(second)) = (first, second) {
            quote = &code[self.pos..self.pos + first.len_utf8() + second.len_utf8()];
            smart_quote = match quote {
                "``" | "\"'" => "\u{201c}",
                "''" => "\u{201d}",
                "\"`" => "\u{201e}",
                "\"-" | "\"\"" | "\"|" => "",
                "\"=" | "\"~" => "-",
                _ => {
                    quote = "";
                    ""
                }
            };
        }

        if quote.is_empty() {
            let cur = self.cur_str();
            self.add_text(cur);
        } else {
            self.add_markup_as(quote, smart_quote);
        }
    }

    fn scan_dash(&mut self) {
        if self.cur_mode.is_text() {
            let em_dash = self.match_from_position(&EM_DASH_PATTERN, self.pos);
            if !em_dash.is_empty() {
                self.add_markup_as(em_dash, "\u{2014}");
                return;
            }

            let en_dash = self.match_from_position(&EN_DASH_PATTERN, self.pos);
            if !en_dash.is_empty() {
                self.add_markup_as(en_dash, "\u{2013}");
                return;
            }
        }

        self.scan_bracket();
    }

    fn scan_bracket(&mut self) {
        let length = self.match_from_position(&LENGTH_IN_BRACKET_PATTERN, self.pos);
        if !length.is_empty() {
            self.is_math_char_trivial = true;
            self.preserve_dummy_last = true;
            self.add_markup(length);
            return;
        }

        self.scan_angle();
    }

    fn scan_angle(&mut self) {
        if self.dialect == LatexDialect::Rsweave {
            let rsweave_begin = self.match_from_position(&RSWEAVE_BEGIN_PATTERN, self.pos);
            if !rsweave_begin.is_empty() {
                self.mode_stack.push(LatexMode::Rsweave);
                self.add_markup(rsweave_begin);
                return;
            }
        }

        self.scan_plain_char();
    }

    fn scan_plain_char(&mut self) {
        let cur = self.cur_str();

        if self.cur_mode.is_text() {
            self.add_text(cur);
        } else {
            self.add_markup(cur);
            if is_punctuation(self.cur_char) {
                self.dummy_last_punctuation = cur.to_string();
            }

            if self.math_vowel_state == MathVowelState::Undecided {
                self.math_vowel_state = if is_vowel(self.cur_char) {
                    MathVowelState::StartsWithVowel
                } else {
                    MathVowelState::StartsWithConsonant
                };
            }
        }
    }

    fn debug_information(&self) -> String {
        let remaining: String = self.code[self.pos..].chars().take(100).collect();
        format!(
            "remaining code = {:?}, pos = {}, dummy_counter = {}, last_space = {}, \
             last_punctuation = {}, dummy_last_space = {:?}, dummy_last_punctuation = {:?}, \
             is_math_empty = {}, math_vowel_state = {:?}, preserve_dummy_last = {}, \
             can_insert_space_before_dummy = {}, is_math_char_trivial = {}, mode_stack = {:?}, \
             cur_char = {:?}, cur_mode = {:?}",
            remaining,
            self.pos,
            self.dummy_counter,
            self.last_space,
            self.last_punctuation,
            self.dummy_last_space,
            self.dummy_last_punctuation,
            self.is_math_empty,
            self.math_vowel_state,
            self.preserve_dummy_last,
            self.can_insert_space_before_dummy,
            self.is_math_char_trivial,
            self.mode_stack,
            self.cur_char,
            self.cur_mode,
        )
    }
}
