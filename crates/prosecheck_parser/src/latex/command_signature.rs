use std::sync::LazyLock;

use regex::Regex;

use crate::dummy::DummyGenerator;

/// What the builder does with a matched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Emit only the command word as markup; arguments stay in the stream.
    Default,
    /// Discard the whole match.
    Ignore,
    /// Replace the whole match with a generated dummy token.
    Dummy,
}

/// Shape of one command argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    Brace,
    Bracket,
    Parenthesis,
}

impl ArgumentType {
    fn open_char(self) -> char {
        match self {
            ArgumentType::Brace => '{',
            ArgumentType::Bracket => '[',
            ArgumentType::Parenthesis => '(',
        }
    }

    fn close_char(self) -> char {
        match self {
            ArgumentType::Brace => '}',
            ArgumentType::Bracket => ']',
            ArgumentType::Parenthesis => ')',
        }
    }
}

static PROTOTYPE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\\([^A-Za-z@]|[A-Za-z@]+)\*?").unwrap());

/// Declarative description of a LaTeX command: its name, the shape of its
/// argument list, and what to do with a match.
#[derive(Debug, Clone)]
pub struct LatexCommandSignature {
    name: String,
    argument_types: Vec<ArgumentType>,
    action: CommandAction,
    dummy_generator: DummyGenerator,
}

impl LatexCommandSignature {
    /// Parse a prototype like `\cite[]{}` into a signature. Returns `None`
    /// if the prototype is not a command word followed by `{}`/`[]`/`()`
    /// slots.
    pub fn parse(
        prototype: &str,
        action: CommandAction,
        dummy_generator: DummyGenerator,
    ) -> Option<Self> {
        let name_match = PROTOTYPE_NAME_PATTERN.find(prototype)?;
        let name = name_match.as_str().to_string();

        let mut argument_types = Vec::new();
        let mut rest = &prototype[name_match.end()..];
        loop {
            if let Some(remaining) = rest.strip_prefix("{}") {
                argument_types.push(ArgumentType::Brace);
                rest = remaining;
            } else if let Some(remaining) = rest.strip_prefix("[]") {
                argument_types.push(ArgumentType::Bracket);
                rest = remaining;
            } else if let Some(remaining) = rest.strip_prefix("()") {
                argument_types.push(ArgumentType::Parenthesis);
                rest = remaining;
            } else {
                break;
            }
        }

        if !rest.is_empty() {
            return None;
        }

        Some(LatexCommandSignature {
            name,
            argument_types,
            action,
            dummy_generator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> CommandAction {
        self.action
    }

    pub fn dummy_generator(&self) -> &DummyGenerator {
        &self.dummy_generator
    }

    /// Match this signature against `code` starting at `pos`. Returns the
    /// matched slice (command word plus all argument groups), or an empty
    /// slice if the command or any argument fails to match.
    pub fn match_from_position<'a>(&self, code: &'a str, pos: usize) -> &'a str {
        if !code[pos..].starts_with(self.name.as_str()) {
            return "";
        }

        let mut end = pos + self.name.len();
        for argument_type in &self.argument_types {
            let argument = match_argument_from_position(code, end, *argument_type);
            if argument.is_empty() {
                return "";
            }
            end += argument.len();
        }

        &code[pos..end]
    }
}

/// Match one balanced `{…}`, `[…]` or `(…)` group at `pos`. Backslash
/// escapes the following character; braces and brackets nest.
pub fn match_argument_from_position(
    code: &str,
    pos: usize,
    argument_type: ArgumentType,
) -> &str {
    if pos >= code.len() {
        return "";
    }

    let tail = &code[pos..];
    let mut chars = tail.char_indices();
    match chars.next() {
        Some((_, ch)) if ch == argument_type.open_char() => {}
        _ => return "",
    }

    let mut stack = vec![argument_type];
    let mut skip_next = false;
    for (offset, ch) in chars {
        if skip_next {
            skip_next = false;
            continue;
        }

        match ch {
            '\\' => skip_next = true,
            '{' => stack.push(ArgumentType::Brace),
            '[' => stack.push(ArgumentType::Bracket),
            _ if stack.last().map(|top| top.close_char()) == Some(ch) => {
                stack.pop();
                if stack.is_empty() {
                    return &tail[..offset + ch.len_utf8()];
                }
            }
            _ => {}
        }
    }

    ""
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prototype() {
        let signature = LatexCommandSignature::parse(
            "\\cite[]{}",
            CommandAction::Dummy,
            DummyGenerator::new(),
        )
        .expect("prototype should parse");
        assert_eq!(signature.name(), "\\cite");
        assert_eq!(signature.action(), CommandAction::Dummy);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LatexCommandSignature::parse(
            "\\cite{x}",
            CommandAction::Ignore,
            DummyGenerator::new()
        )
        .is_none());
        assert!(LatexCommandSignature::parse(
            "cite",
            CommandAction::Ignore,
            DummyGenerator::new()
        )
        .is_none());
    }

    #[test]
    fn test_match_from_position() {
        let signature = LatexCommandSignature::parse(
            "\\cite[]{}",
            CommandAction::Dummy,
            DummyGenerator::new(),
        )
        .expect("prototype should parse");

        let code = "\\cite[p. 3]{key} rest";
        assert_eq!(signature.match_from_position(code, 0), "\\cite[p. 3]{key}");
        // missing bracket argument fails the whole signature
        assert_eq!(signature.match_from_position("\\cite{key}", 0), "");
    }

    #[test]
    fn test_match_argument_nesting_and_escapes() {
        assert_eq!(
            match_argument_from_position("{a{b}c} rest", 0, ArgumentType::Brace),
            "{a{b}c}"
        );
        assert_eq!(
            match_argument_from_position("{a\\}b}", 0, ArgumentType::Brace),
            "{a\\}b}"
        );
        assert_eq!(
            match_argument_from_position("[opt]{x}", 0, ArgumentType::Bracket),
            "[opt]"
        );
        assert_eq!(
            match_argument_from_position("(1,2)", 0, ArgumentType::Parenthesis),
            "(1,2)"
        );
        // unclosed group never matches
        assert_eq!(match_argument_from_position("{abc", 0, ArgumentType::Brace), "");
    }
}
