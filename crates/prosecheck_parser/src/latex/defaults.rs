use crate::dummy::DummyGenerator;

use super::command_signature::{CommandAction, LatexCommandSignature};
use super::environment_signature::{EnvironmentAction, LatexEnvironmentSignature};

/// Environments whose body is mathematics. `math` is inline; all others
/// are display math.
const MATH_ENVIRONMENTS: [&str; 16] = [
    "align",
    "align*",
    "alignat",
    "alignat*",
    "displaymath",
    "eqnarray",
    "eqnarray*",
    "equation",
    "equation*",
    "flalign",
    "flalign*",
    "gather",
    "gather*",
    "math",
    "multline",
    "multline*",
];

pub fn is_math_environment(name: &str) -> bool {
    MATH_ENVIRONMENTS.contains(&name)
}

/// Commands whose arguments carry no prose. The whole match is discarded.
const IGNORED_COMMAND_PROTOTYPES: [&str; 53] = [
    "\\addbibresource{}",
    "\\addcontentsline{}{}{}",
    "\\addtocounter{}{}",
    "\\addtolength{}{}",
    "\\bibitem{}",
    "\\bibitem[]{}",
    "\\bibliography{}",
    "\\bibliographystyle{}",
    "\\captionsetup{}",
    "\\crefname{}{}{}",
    "\\Crefname{}{}{}",
    "\\DeclareMathOperator{}{}",
    "\\DeclareMathOperator*{}{}",
    "\\definecolor{}{}{}",
    "\\documentclass{}",
    "\\documentclass[]{}",
    "\\geometry{}",
    "\\graphicspath{}",
    "\\href{}",
    "\\hypersetup{}",
    "\\hyphenation{}",
    "\\include{}",
    "\\includegraphics{}",
    "\\includegraphics[]{}",
    "\\input{}",
    "\\label{}",
    "\\linespread{}",
    "\\newcolumntype{}{}",
    "\\newcommand{}{}",
    "\\newcommand{}[]{}",
    "\\newcommand*{}{}",
    "\\newcommand*{}[]{}",
    "\\newcounter{}",
    "\\newenvironment{}{}{}",
    "\\newenvironment{}[]{}{}",
    "\\newtheorem{}{}",
    "\\newtheorem{}[]{}",
    "\\nocite{}",
    "\\pagenumbering{}",
    "\\pagestyle{}",
    "\\providecommand{}{}",
    "\\providecommand{}[]{}",
    "\\renewcommand{}{}",
    "\\renewcommand{}[]{}",
    "\\renewcommand*{}{}",
    "\\setcounter{}{}",
    "\\setlength{}{}",
    "\\stepcounter{}",
    "\\usepackage{}",
    "\\usepackage[]{}",
    "\\usetikzlibrary{}",
    "\\vspace{}",
    "\\vspace*{}",
];

/// Reference-like commands. The match reads as a noun, so it is replaced
/// with a dummy token to keep the surrounding sentence well-formed.
const DUMMY_COMMAND_PROTOTYPES: [&str; 16] = [
    "\\autoref{}",
    "\\cite{}",
    "\\cite[]{}",
    "\\citep{}",
    "\\citep[]{}",
    "\\citet{}",
    "\\citet[]{}",
    "\\cref{}",
    "\\Cref{}",
    "\\eqref{}",
    "\\gls{}",
    "\\Gls{}",
    "\\pageref{}",
    "\\ref{}",
    "\\url{}",
    "\\vref{}",
];

const PLURAL_DUMMY_COMMAND_PROTOTYPES: [&str; 2] = ["\\glspl{}", "\\Glspl{}"];

pub fn default_latex_command_signatures() -> Vec<LatexCommandSignature> {
    let mut signatures = Vec::new();

    for prototype in IGNORED_COMMAND_PROTOTYPES {
        if let Some(signature) =
            LatexCommandSignature::parse(prototype, CommandAction::Ignore, DummyGenerator::new())
        {
            signatures.push(signature);
        }
    }

    for prototype in DUMMY_COMMAND_PROTOTYPES {
        if let Some(signature) =
            LatexCommandSignature::parse(prototype, CommandAction::Dummy, DummyGenerator::new())
        {
            signatures.push(signature);
        }
    }

    for prototype in PLURAL_DUMMY_COMMAND_PROTOTYPES {
        if let Some(signature) = LatexCommandSignature::parse(
            prototype,
            CommandAction::Dummy,
            DummyGenerator::new_plural(),
        ) {
            signatures.push(signature);
        }
    }

    signatures
}

pub fn default_latex_environment_signatures() -> Vec<LatexEnvironmentSignature> {
    ["lstlisting", "tikzpicture", "verbatim"]
        .iter()
        .map(|name| LatexEnvironmentSignature::new(name, EnvironmentAction::Ignore))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_environments() {
        assert!(is_math_environment("equation"));
        assert!(is_math_environment("align*"));
        assert!(!is_math_environment("verbatim"));
        assert!(!is_math_environment("equation**"));
    }

    #[test]
    fn test_all_default_prototypes_parse() {
        let count = IGNORED_COMMAND_PROTOTYPES.len()
            + DUMMY_COMMAND_PROTOTYPES.len()
            + PLURAL_DUMMY_COMMAND_PROTOTYPES.len();
        assert_eq!(default_latex_command_signatures().len(), count);
    }
}
