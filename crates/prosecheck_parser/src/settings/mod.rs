use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Host-provided check settings, deserialised straight from client JSON.
#[derive(Serialize, Deserialize, Debug, JsonSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// BCP-47-like language tag used when generating dummy tokens.
    #[serde(default = "default_language_short_code")]
    pub language_short_code: String,

    /// Additional LaTeX command signatures, keyed by prototype
    /// (e.g. `\cite[]{}`). Actions: `default`, `ignore`, `dummy`,
    /// `pluralDummy`. Unknown actions are skipped.
    #[serde(default)]
    pub latex_commands: HashMap<String, String>,

    /// Additional LaTeX environments, keyed by name.
    /// Actions: `default`, `ignore`. Unknown actions are skipped.
    #[serde(default)]
    pub latex_environments: HashMap<String, String>,

    /// Additional Markdown node kinds (e.g. `CodeBlock`). Actions:
    /// `default`, `ignore`, `dummy`, `pluralDummy`. Unknown actions are
    /// skipped.
    #[serde(default)]
    pub markdown_nodes: HashMap<String, String>,
}

fn default_language_short_code() -> String {
    "en-US".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            language_short_code: default_language_short_code(),
            latex_commands: HashMap::new(),
            latex_environments: HashMap::new(),
            markdown_nodes: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_client_json() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "languageShortCode": "de-DE",
                "latexCommands": {"\\todo{}": "ignore"},
                "latexEnvironments": {"algorithm": "ignore"}
            }"#,
        )
        .expect("settings should deserialize");

        assert_eq!(settings.language_short_code, "de-DE");
        assert_eq!(
            settings.latex_commands.get("\\todo{}").map(String::as_str),
            Some("ignore")
        );
        assert!(settings.markdown_nodes.is_empty());
    }

    #[test]
    fn test_default() {
        let settings = Settings::default();
        assert_eq!(settings.language_short_code, "en-US");
        assert!(settings.latex_commands.is_empty());
    }
}
