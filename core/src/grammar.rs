//! High-level grammar facade.
//!
//! [`GrammarBuilder`] registers commands and compiles them into a
//! [`Grammar`]: the frozen combined graph plus per-command metadata. A
//! `Grammar` is immutable, so it can be shared across threads and reused for
//! any number of [`process`](Grammar::process) calls.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let mut builder = GrammarBuilder::new("yarn");
//! builder.command().add_path(["install"])?;
//! builder
//!     .command()
//!     .add_path(["add"])?
//!     .add_rest("packages", 1)?
//!     .add_option(OptionSpec::boolean(&["-D", "--dev"]))?;
//! let grammar = builder.compile();
//!
//! let decision = grammar.process(&["add", "-D", "serde", "tokio"], false)?;
//! assert_eq!(decision.selection, Some(Selection::Command(1)));
//! assert_eq!(decision.positional_values(), vec!["serde", "tokio"]);
//! assert_eq!(decision.option("--dev"), Some(&OptionValue::Flag(true)));
//!
//! assert_eq!(grammar.completions(&["ins"]), vec!["tall"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compiler::CommandBuilder;
use crate::error::{ParseError, Result};
use crate::graph::{ERROR_NODE, Graph};
use crate::matcher::{complete_branches, run_machine};
use crate::merge::combine;
use crate::resolver::select_best_state;
use crate::state::ParseState;
use crate::validate::ValidationError;
use crate::{CommandSpec, GrammarPackage};

/// Registers commands before compilation.
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    binary_name: String,
    commands: Vec<CommandBuilder>,
}

impl GrammarBuilder {
    pub fn new(binary_name: impl Into<String>) -> Self {
        Self {
            binary_name: binary_name.into(),
            commands: Vec::new(),
        }
    }

    /// Replays every command of a package.
    ///
    /// Stops at the first faulty command; use
    /// [`validate_package`](crate::validate_package) to collect every problem.
    pub fn from_package(package: &GrammarPackage) -> std::result::Result<Self, ValidationError> {
        let mut builder = Self::new(package.binary_name.clone());
        for (index, spec) in package.commands.iter().enumerate() {
            builder
                .add_spec(spec)
                .map_err(|error| ValidationError::Command { index, error })?;
        }
        Ok(builder)
    }

    /// Starts a new command bound to the next index.
    pub fn command(&mut self) -> &mut CommandBuilder {
        let index = self.commands.len();
        self.commands.push(CommandBuilder::new(index));
        &mut self.commands[index]
    }

    /// Registers a declarative command and returns its index.
    pub fn add_spec(&mut self, spec: &CommandSpec) -> Result<usize> {
        let index = self.commands.len();
        self.commands.push(CommandBuilder::from_spec(index, spec)?);
        Ok(index)
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Compiles every registered command into one grammar.
    pub fn compile(&self) -> Grammar {
        let subgraphs: Vec<_> = self
            .commands
            .iter()
            .map(|command| command.compile(&self.binary_name))
            .collect();
        let graph = combine(&subgraphs);

        let commands: Vec<CommandInfo> = self
            .commands
            .iter()
            .map(|command| CommandInfo {
                index: command.index(),
                usage: command.usage(&self.binary_name),
                paths: command.paths().to_vec(),
                description: command.description().map(str::to_string),
            })
            .collect();

        info!(
            binary = %self.binary_name,
            commands = commands.len(),
            nodes = graph.len(),
            transitions = graph.transition_count(),
            "Compiled grammar"
        );

        Grammar {
            binary_name: self.binary_name.clone(),
            graph,
            commands,
        }
    }
}

/// Per-command metadata kept alongside the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub index: usize,
    pub usage: String,
    pub paths: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Compiled, immutable grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    binary_name: String,
    graph: Graph,
    commands: Vec<CommandInfo>,
}

impl Grammar {
    /// Matches `input` and resolves it to a single decision.
    pub fn process<S: AsRef<str>>(&self, input: &[S], partial: bool) -> std::result::Result<ParseState, ParseError> {
        let branches = run_machine(&self.graph, input, partial)?;
        let states = branches.into_iter().map(|branch| branch.state).collect();
        let decision = select_best_state(input, states)?;

        debug!(
            selection = ?decision.selection,
            partial = decision.partial,
            "Processed input"
        );
        Ok(decision)
    }

    /// Suffixes that would complete the last word of `input`.
    ///
    /// Only path words are completed; the result is sorted and deduplicated.
    pub fn completions<S: AsRef<str>>(&self, input: &[S]) -> Vec<String> {
        let Ok(branches) = complete_branches(&self.graph, input) else {
            return Vec::new();
        };

        let mut suffixes: Vec<String> = branches
            .into_iter()
            .filter(|branch| branch.node != ERROR_NODE)
            .filter_map(|branch| branch.state.remainder)
            .collect();
        suffixes.sort();
        suffixes.dedup();
        suffixes
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn commands(&self) -> &[CommandInfo] {
        &self.commands
    }

    pub fn command(&self, index: usize) -> Option<&CommandInfo> {
        self.commands.get(index)
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }
}
