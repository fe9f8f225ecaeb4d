/// What the builder does with a registered environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentAction {
    /// Treat the environment body as the surrounding mode.
    Default,
    /// Discard everything up to the matching `\end{…}`.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct LatexEnvironmentSignature {
    name: String,
    action: EnvironmentAction,
}

impl LatexEnvironmentSignature {
    pub fn new(name: &str, action: EnvironmentAction) -> Self {
        LatexEnvironmentSignature {
            name: name.to_string(),
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> EnvironmentAction {
        self.action
    }
}
