//! Grammar definition types.
//!
//! [`CommandSpec`], [`ParameterSpec`] and [`OptionSpec`] form the declarative
//! surface: they are what grammar files contain and they round-trip through
//! JSON and YAML. [`OptionDefinition`] and [`ArityDefinition`] are the
//! normalized forms the compiler works from once a spec has been replayed
//! through a [`CommandBuilder`](crate::CommandBuilder).

use serde::{Deserialize, Serialize};

/// Current grammar file contract version.
///
/// Embedded in every [`GrammarPackage`](crate::GrammarPackage) to track
/// compatibility across grammar file revisions.
pub const GRAMMAR_CONTRACT_VERSION: &str = "1.0.0";

/// Declarative option definition.
///
/// An option has one or more spellings (`-f`, `--force`), a number of values
/// it consumes (its arity) and a few flags. `allow_binding` controls whether
/// the `--name=value` form is accepted; when left unset it defaults to
/// `arity == 1`.
///
/// # Examples
///
/// ```
/// use command_grammar_core::OptionSpec;
///
/// let force = OptionSpec::boolean(&["-f", "--force"]).with_description("Overwrite files");
/// assert_eq!(force.arity, 0);
/// assert!(!force.binding_allowed());
///
/// let output = OptionSpec::with_arity(&["-o", "--output"], 1).required();
/// assert!(output.required);
/// assert!(output.binding_allowed());
///
/// let pair = OptionSpec::with_arity(&["--pair"], 2);
/// assert!(!pair.binding_allowed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Accepted spellings.
    pub names: Vec<String>,
    /// Description shown in help listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of values following the option.
    #[serde(default)]
    pub arity: usize,
    /// Excluded from usage strings.
    #[serde(default)]
    pub hidden: bool,
    /// Must be present for the command to be selected.
    #[serde(default)]
    pub required: bool,
    /// Whether `--name=value` is accepted (defaults to `arity == 1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_binding: Option<bool>,
}

impl OptionSpec {
    /// Creates a boolean option (arity zero).
    pub fn boolean(names: &[&str]) -> Self {
        Self::with_arity(names, 0)
    }

    /// Creates an option consuming `arity` values.
    pub fn with_arity(names: &[&str], arity: usize) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            description: None,
            arity,
            hidden: false,
            required: false,
            allow_binding: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Marks as hidden from usage strings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Overrides whether the bound form is accepted.
    pub fn allow_binding(mut self, allow: bool) -> Self {
        self.allow_binding = Some(allow);
        self
    }

    /// Returns the effective binding policy.
    pub fn binding_allowed(&self) -> bool {
        self.allow_binding.unwrap_or(self.arity == 1)
    }
}

/// One positional declaration, in declaration order.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ParameterSpec;
///
/// let source = ParameterSpec::positional("source");
/// let files = ParameterSpec::rest("files", 1);
/// assert_eq!(source.name(), "source");
/// assert!(matches!(files, ParameterSpec::Rest { required: 1, .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterSpec {
    /// A single positional, required or optional.
    Positional {
        name: String,
        #[serde(default = "default_true")]
        required: bool,
    },
    /// An unbounded list preceded by `required` mandatory values.
    Rest {
        name: String,
        #[serde(default)]
        required: usize,
    },
    /// Like [`Rest`](ParameterSpec::Rest), but every word is captured
    /// verbatim, options included.
    Proxy {
        name: String,
        #[serde(default)]
        required: usize,
    },
}

fn default_true() -> bool {
    true
}

impl ParameterSpec {
    /// Creates a required positional.
    pub fn positional(name: &str) -> Self {
        ParameterSpec::Positional {
            name: name.to_string(),
            required: true,
        }
    }

    /// Creates an optional positional.
    pub fn optional(name: &str) -> Self {
        ParameterSpec::Positional {
            name: name.to_string(),
            required: false,
        }
    }

    /// Creates a rest list.
    pub fn rest(name: &str, required: usize) -> Self {
        ParameterSpec::Rest {
            name: name.to_string(),
            required,
        }
    }

    /// Creates a proxy list.
    pub fn proxy(name: &str, required: usize) -> Self {
        ParameterSpec::Proxy {
            name: name.to_string(),
            required,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterSpec::Positional { name, .. }
            | ParameterSpec::Rest { name, .. }
            | ParameterSpec::Proxy { name, .. } => name,
        }
    }
}

/// Declarative command definition.
///
/// A command is reachable through any of its `paths`; a command with no path
/// at all matches from the very first word.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandSpec, OptionSpec, ParameterSpec};
///
/// let spec = CommandSpec::new(&["remote", "add"])
///     .with_path(&["remote", "new"])
///     .with_parameter(ParameterSpec::positional("name"))
///     .with_parameter(ParameterSpec::positional("url"))
///     .with_option(OptionSpec::boolean(&["-f", "--fetch"]));
///
/// assert_eq!(spec.paths.len(), 2);
/// assert_eq!(spec.parameters.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Literal word sequences leading to the command.
    #[serde(default)]
    pub paths: Vec<Vec<String>>,
    /// Positional declarations, in order.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CommandSpec {
    /// Creates a command reachable through `path`.
    pub fn new(path: &[&str]) -> Self {
        Self::default().with_path(path)
    }

    /// Adds an alternative path.
    pub fn with_path(mut self, path: &[&str]) -> Self {
        self.paths
            .push(path.iter().map(|word| word.to_string()).collect());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// Normalized option, as registered on a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    /// Longest spelling; bound values are recorded under this name.
    pub preferred_name: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub arity: usize,
    pub hidden: bool,
    pub required: bool,
    pub allow_binding: bool,
}

/// Optional zone between leading and trailing positionals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraZone {
    /// Fixed list of optional positional names (possibly empty).
    Bounded(Vec<String>),
    /// Any number of values, named for usage strings.
    Unbounded { name: String },
}

impl Default for ExtraZone {
    fn default() -> Self {
        ExtraZone::Bounded(Vec::new())
    }
}

/// Positional layout of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArityDefinition {
    pub leading: Vec<String>,
    pub extra: ExtraZone,
    pub trailing: Vec<String>,
    /// Every word past the fixed prefix is captured verbatim.
    pub proxy: bool,
}

impl ArityDefinition {
    /// Returns `true` when the extra zone is a rest or proxy list.
    pub fn is_unbounded(&self) -> bool {
        matches!(self.extra, ExtraZone::Unbounded { .. })
    }

    /// Returns `true` when there is an extra zone to compile.
    pub fn has_extra(&self) -> bool {
        match &self.extra {
            ExtraZone::Bounded(names) => !names.is_empty(),
            ExtraZone::Unbounded { .. } => true,
        }
    }
}
