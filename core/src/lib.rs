//! Command-line grammar compiler and non-deterministic matcher.
//!
//! This crate turns a set of command declarations into one transition graph
//! and resolves raw argument vectors against it:
//!
//! - [`CommandBuilder`]: declares one command (paths, positionals, options)
//!   and compiles it into a subgraph.
//! - [`combine`]: merges subgraphs under a shared initial node and
//!   eliminates shortcut (epsilon) edges.
//! - [`run_machine`]: walks the graph with every live branch at once.
//! - [`select_best_state`]: picks the single winning outcome, or reports
//!   unknown or ambiguous syntax.
//! - [`GrammarBuilder`] / [`Grammar`]: the facade tying the above together.
//!
//! Declarations can also be loaded from a serialized [`GrammarPackage`] and
//! checked with [`validate_package`] before compiling.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let mut builder = GrammarBuilder::new("tool");
//! builder
//!     .command()
//!     .add_path(["build"])?
//!     .add_option(OptionSpec::with_arity(&["-o", "--output"], 1))?
//!     .add_positional("target", false)?;
//! builder.command().add_path(["test"])?.add_proxy("args", 0)?;
//! let grammar = builder.compile();
//!
//! let decision = grammar.process(&["build", "--output=dist", "web"], false)?;
//! assert_eq!(decision.selection, Some(Selection::Command(0)));
//! assert_eq!(decision.option("--output"), Some(&OptionValue::Single("dist".into())));
//!
//! let decision = grammar.process(&["test", "--watch", "unit"], false)?;
//! assert_eq!(decision.positional_values(), vec!["--watch", "unit"]);
//!
//! assert!(grammar.process(&["deploy"], false).is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod compiler;
mod error;
mod grammar;
mod graph;
mod matcher;
mod merge;
mod package;
mod resolver;
mod state;
mod token;
mod transition;
mod types;
mod validate;

pub use compiler::CommandBuilder;
pub use error::{Candidate, GrammarError, ParseError, Result};
pub use grammar::{CommandInfo, Grammar, GrammarBuilder};
pub use graph::{
    ERROR_NODE, FIRST_CUSTOM_NODE, Graph, GraphBuilder, INITIAL_NODE, Node, NodeId, SUCCESS_NODE, Transition,
    is_terminal_node,
};
pub use matcher::{Branch, complete_branches, run_machine, trim_smaller_branches};
pub use merge::{combine, eliminate_shortcuts, merge_graphs};
pub use package::GrammarPackage;
pub use resolver::{aggregate_help_states, find_common_prefix, select_best_state};
pub use state::{AnnotatedToken, BoundOption, OptionValue, ParseState, Positional, PositionalKind, Selection, TokenKind};
pub use token::{Token, is_batch_shaped, is_option_shaped, parse_help_request, split_binding};
pub use transition::{NameEntry, OptionNameTable, Predicate, Reducer};
pub use types::*;
pub use validate::{ValidationError, validate_package};
