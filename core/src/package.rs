use serde::{Deserialize, Serialize};

use crate::CommandSpec;

/// Serializable grammar bundle, the content of a grammar file.
///
/// A package names the binary the grammar describes and lists its commands in
/// registration order; a command's position in `commands` is its index in
/// every [`Selection::Command`](crate::Selection::Command).
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let mut package = GrammarPackage::new("yarn");
/// package.commands.push(CommandSpec::new(&["install"]));
/// package.commands.push(
///     CommandSpec::new(&["add"]).with_parameter(ParameterSpec::rest("packages", 1)),
/// );
///
/// assert_eq!(package.command_count(), 2);
/// assert_eq!(package.schema_version.as_deref(), Some(GRAMMAR_CONTRACT_VERSION));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarPackage {
    /// Grammar contract version (populated from
    /// [`GRAMMAR_CONTRACT_VERSION`](crate::GRAMMAR_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Program name used as the first word of usage strings.
    pub binary_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl GrammarPackage {
    /// Creates an empty package for `binary_name`.
    pub fn new(binary_name: impl Into<String>) -> Self {
        Self {
            schema_version: Some(crate::GRAMMAR_CONTRACT_VERSION.to_string()),
            binary_name: binary_name.into(),
            description: None,
            commands: Vec::new(),
        }
    }

    /// Returns the number of commands in this package.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}
