mod builder;
mod command_signature;
mod defaults;
mod environment_signature;
mod test;

pub use builder::{LatexAnnotatedTextBuilder, LatexDialect};
pub use command_signature::{ArgumentType, CommandAction, LatexCommandSignature};
pub use environment_signature::{EnvironmentAction, LatexEnvironmentSignature};
