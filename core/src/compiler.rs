//! Command grammar compiler.
//!
//! A [`CommandBuilder`] collects one command's paths, positional layout and
//! options, rejecting inconsistent declarations as soon as they are made.
//! [`CommandBuilder::compile`] then lowers the command into a standalone
//! subgraph:
//!
//! ```text
//! initial --<start>--> first --(path words)--> last path node
//!     --(leading positionals)--> --(extra zone)--> --(trailing positionals)-->
//!     --<end>--> success
//! ```
//!
//! Every path node and every node that accepts positionals is also an option
//! registration point: option transitions loop back to it, so options may
//! follow any path prefix and be interleaved with positionals anywhere.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{GrammarError, Result};
use crate::graph::{ERROR_NODE, GraphBuilder, INITIAL_NODE, NodeId, SUCCESS_NODE};
use crate::state::Selection;
use crate::token::Token;
use crate::transition::{NameEntry, OptionNameTable, Predicate, Reducer};
use crate::types::{
    ArityDefinition, CommandSpec, ExtraZone, OptionDefinition, OptionSpec, ParameterSpec,
};
use crate::validate::check_option_spec;

const NOT_ENOUGH_POSITIONALS: &str = "Not enough positional arguments";
const EXTRANEOUS_POSITIONAL: &str = "Extraneous positional argument";
const UNSUPPORTED_OPTION: &str = "Unsupported option name";
const INVALID_OPTION: &str = "Invalid option name";

/// Builder for a single command's grammar.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandBuilder, OptionSpec};
///
/// let mut command = CommandBuilder::new(0);
/// command
///     .add_path(["remote", "add"])?
///     .add_positional("name", true)?
///     .add_positional("url", true)?
///     .add_option(OptionSpec::boolean(&["-f", "--fetch"]))?;
///
/// assert_eq!(command.usage("git"), "git remote add [-f,--fetch] <name> <url>");
/// assert_eq!(command.arity().leading, vec!["name", "url"]);
/// # Ok::<(), command_grammar_core::GrammarError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    index: usize,
    paths: Vec<Vec<String>>,
    arity: ArityDefinition,
    options: Vec<OptionDefinition>,
    names: OptionNameTable,
    description: Option<String>,
}

impl CommandBuilder {
    /// Creates an empty command registered under `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Replays a declarative spec, failing on the first misconfiguration.
    pub fn from_spec(index: usize, spec: &CommandSpec) -> Result<Self> {
        let mut command = Self::new(index);
        command.description = spec.description.clone();

        for path in &spec.paths {
            command.add_path(path)?;
        }
        for parameter in &spec.parameters {
            match parameter {
                ParameterSpec::Positional { name, required } => {
                    command.add_positional(name, *required)?;
                }
                ParameterSpec::Rest { name, required } => {
                    command.add_rest(name, *required)?;
                }
                ParameterSpec::Proxy { name, required } => {
                    command.add_proxy(name, *required)?;
                }
            }
        }
        for option in &spec.options {
            command.add_option(option.clone())?;
        }

        Ok(command)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn paths(&self) -> &[Vec<String>] {
        &self.paths
    }

    pub fn arity(&self) -> &ArityDefinition {
        &self.arity
    }

    pub fn options(&self) -> &[OptionDefinition] {
        &self.options
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, desc: &str) -> &mut Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds a literal path leading to the command.
    pub fn add_path<I, S>(&mut self, path: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path: Vec<String> = path.into_iter().map(|w| w.as_ref().to_string()).collect();
        if path.iter().any(|word| word.is_empty()) {
            return Err(GrammarError::EmptyPathWord);
        }
        self.paths.push(path);
        Ok(self)
    }

    /// Declares a positional argument.
    ///
    /// Required positionals are leading while no optional one was declared,
    /// trailing afterwards. Optional positionals fill the bounded extra zone.
    pub fn add_positional(&mut self, name: &str, required: bool) -> Result<&mut Self> {
        match &mut self.arity.extra {
            ExtraZone::Unbounded { .. } if !required => {
                return Err(GrammarError::OptionalAfterRest(name.to_string()));
            }
            _ if !required && !self.arity.trailing.is_empty() => {
                return Err(GrammarError::OptionalAfterTrailing(name.to_string()));
            }
            ExtraZone::Bounded(extra) if !required => extra.push(name.to_string()),
            ExtraZone::Bounded(extra) if extra.is_empty() => {
                self.arity.leading.push(name.to_string());
            }
            _ => self.arity.trailing.push(name.to_string()),
        }
        Ok(self)
    }

    /// Declares an unbounded list preceded by `required` mandatory values.
    pub fn add_rest(&mut self, name: &str, required: usize) -> Result<&mut Self> {
        if !self.arity.trailing.is_empty() {
            return Err(GrammarError::RestAfterTrailing(name.to_string()));
        }
        match &self.arity.extra {
            ExtraZone::Unbounded { .. } => {
                return Err(GrammarError::DuplicateRest(name.to_string()));
            }
            ExtraZone::Bounded(extra) if !extra.is_empty() => {
                return Err(GrammarError::RestAfterOptional(name.to_string()));
            }
            ExtraZone::Bounded(_) => {}
        }

        for _ in 0..required {
            self.add_positional(name, true)?;
        }
        self.arity.extra = ExtraZone::Unbounded {
            name: name.to_string(),
        };
        Ok(self)
    }

    /// Declares a list capturing every remaining word verbatim.
    pub fn add_proxy(&mut self, name: &str, required: usize) -> Result<&mut Self> {
        self.add_rest(name, required)?;
        self.arity.proxy = true;
        Ok(self)
    }

    /// Declares an option.
    pub fn add_option(&mut self, spec: OptionSpec) -> Result<&mut Self> {
        let taken: HashSet<&str> = self.names.keys().map(String::as_str).collect();
        check_option_spec(&spec, &taken)?;

        let allow_binding = spec.binding_allowed();
        let preferred_name = spec
            .names
            .iter()
            .fold("", |longest, name| {
                if name.len() > longest.len() {
                    name.as_str()
                } else {
                    longest
                }
            })
            .to_string();

        for name in &spec.names {
            self.names.insert(
                name.clone(),
                NameEntry {
                    preferred: preferred_name.clone(),
                    allow_binding,
                },
            );
        }
        self.options.push(OptionDefinition {
            preferred_name,
            names: spec.names,
            description: spec.description,
            arity: spec.arity,
            hidden: spec.hidden,
            required: spec.required,
            allow_binding,
        });
        Ok(self)
    }

    /// Spellings of each required option, one group per option.
    pub fn required_option_groups(&self) -> Vec<Vec<String>> {
        self.options
            .iter()
            .filter(|option| option.required)
            .map(|option| option.names.clone())
            .collect()
    }

    /// Plain one-line usage string, built from the first path.
    pub fn usage(&self, binary_name: &str) -> String {
        let mut segments: Vec<String> = Vec::new();
        if !binary_name.is_empty() {
            segments.push(binary_name.to_string());
        }
        if let Some(path) = self.paths.first() {
            segments.extend(path.iter().cloned());
        }

        for option in self.options.iter().filter(|option| !option.hidden) {
            let args: String = (0..option.arity).map(|t| format!(" #{t}")).collect();
            let definition = format!("{}{args}", option.names.join(","));
            if option.required {
                segments.push(format!("<{definition}>"));
            } else {
                segments.push(format!("[{definition}]"));
            }
        }

        segments.extend(self.arity.leading.iter().map(|name| format!("<{name}>")));
        match &self.arity.extra {
            ExtraZone::Bounded(extra) => {
                segments.extend(extra.iter().map(|name| format!("[{name}]")));
            }
            ExtraZone::Unbounded { .. } if self.arity.proxy => segments.push("...".to_string()),
            ExtraZone::Unbounded { name } => segments.push(format!("[{name}...]")),
        }
        segments.extend(self.arity.trailing.iter().map(|name| format!("<{name}>")));

        segments.join(" ")
    }

    /// Lowers the command into a standalone subgraph.
    pub fn compile(&self, binary_name: &str) -> GraphBuilder {
        let mut graph = GraphBuilder::new();
        let arity = &self.arity;

        let first_node = graph.inject_node();
        graph.register_static(
            INITIAL_NODE,
            Token::StartOfInput,
            first_node,
            Some(Reducer::SetCandidateState {
                usage: self.usage(binary_name),
                required_options: self.required_option_groups(),
            }),
        );

        let positional_test = if arity.proxy {
            Predicate::Always
        } else {
            Predicate::IsNotOptionLike
        };

        let no_path = [Vec::new()];
        let paths: &[Vec<String>] = if self.paths.is_empty() {
            &no_path
        } else {
            &self.paths
        };

        for path in paths {
            let mut last_path_node = first_node;

            // Options are accepted before the first path word.
            if !path.is_empty() {
                let option_path_node = graph.inject_node();
                graph.register_shortcut(last_path_node, option_path_node);
                self.register_options(&mut graph, option_path_node);
                last_path_node = option_path_node;
            }

            for (t, word) in path.iter().enumerate() {
                let next_path_node = graph.inject_node();
                graph.register_static(
                    last_path_node,
                    Token::literal(word.as_str()),
                    next_path_node,
                    Some(Reducer::PushPath),
                );
                last_path_node = next_path_node;

                // Interior path words accept options, and `-h` right after
                // one shows the command tree.
                if t + 1 < path.len() {
                    self.register_options(&mut graph, last_path_node);

                    let help_node = graph.inject_node();
                    graph.register_dynamic(
                        last_path_node,
                        Predicate::IsHelp,
                        help_node,
                        Some(Reducer::UseHelp(self.index)),
                    );
                    graph.register_static(
                        help_node,
                        Token::EndOfInput,
                        SUCCESS_NODE,
                        Some(Reducer::SetSelectedIndex(Selection::Help)),
                    );
                }
            }

            if !arity.leading.is_empty() || !arity.proxy {
                let help_node = graph.inject_node();
                graph.register_dynamic(
                    last_path_node,
                    Predicate::IsHelp,
                    help_node,
                    Some(Reducer::UseHelp(self.index)),
                );
                graph.register_dynamic(
                    help_node,
                    Predicate::Always,
                    help_node,
                    Some(Reducer::PushExtra),
                );
                graph.register_static(
                    help_node,
                    Token::EndOfInput,
                    SUCCESS_NODE,
                    Some(Reducer::SetSelectedIndex(Selection::Help)),
                );

                self.register_options(&mut graph, last_path_node);
            }

            if !arity.leading.is_empty() {
                self.register_missing_positionals(&mut graph, last_path_node);
            }

            let mut last_leading_node = last_path_node;
            for t in 0..arity.leading.len() {
                let next_leading_node = graph.inject_node();
                let is_last = t + 1 == arity.leading.len();

                if !arity.proxy || !is_last {
                    self.register_options(&mut graph, next_leading_node);
                }
                if !arity.trailing.is_empty() || !is_last {
                    self.register_missing_positionals(&mut graph, next_leading_node);
                }

                graph.register_dynamic(
                    last_leading_node,
                    Predicate::IsNotOptionLike,
                    next_leading_node,
                    Some(Reducer::PushPositional),
                );
                last_leading_node = next_leading_node;
            }

            let mut last_extra_node = last_leading_node;
            if arity.has_extra() {
                let extra_shortcut_node = graph.inject_node();
                graph.register_shortcut(last_leading_node, extra_shortcut_node);

                match &arity.extra {
                    ExtraZone::Unbounded { .. } => {
                        let extra_node = graph.inject_node();
                        if !arity.proxy {
                            self.register_options(&mut graph, extra_node);
                        }
                        graph.register_dynamic(
                            last_leading_node,
                            positional_test.clone(),
                            extra_node,
                            Some(Reducer::PushExtraNoLimits),
                        );
                        graph.register_dynamic(
                            extra_node,
                            positional_test.clone(),
                            extra_node,
                            Some(Reducer::PushExtraNoLimits),
                        );
                        graph.register_shortcut(extra_node, extra_shortcut_node);
                    }
                    ExtraZone::Bounded(extra) => {
                        for t in 0..extra.len() {
                            let next_extra_node = graph.inject_node();
                            if !arity.proxy || t > 0 {
                                self.register_options(&mut graph, next_extra_node);
                            }
                            graph.register_dynamic(
                                last_extra_node,
                                positional_test.clone(),
                                next_extra_node,
                                Some(Reducer::PushExtra),
                            );
                            graph.register_shortcut(next_extra_node, extra_shortcut_node);
                            last_extra_node = next_extra_node;
                        }
                    }
                }

                last_extra_node = extra_shortcut_node;
            }

            if !arity.trailing.is_empty() {
                self.register_missing_positionals(&mut graph, last_extra_node);
            }

            let mut last_trailing_node = last_extra_node;
            for t in 0..arity.trailing.len() {
                let next_trailing_node = graph.inject_node();

                if !arity.proxy {
                    self.register_options(&mut graph, next_trailing_node);
                }
                if t + 1 < arity.trailing.len() {
                    self.register_missing_positionals(&mut graph, next_trailing_node);
                }

                graph.register_dynamic(
                    last_trailing_node,
                    Predicate::IsNotOptionLike,
                    next_trailing_node,
                    Some(Reducer::PushPositional),
                );
                last_trailing_node = next_trailing_node;
            }

            graph.register_dynamic(
                last_trailing_node,
                positional_test.clone(),
                ERROR_NODE,
                Some(Reducer::SetError(EXTRANEOUS_POSITIONAL.to_string())),
            );
            graph.register_static(
                last_trailing_node,
                Token::EndOfInput,
                SUCCESS_NODE,
                Some(Reducer::SetSelectedIndex(Selection::Command(self.index))),
            );
            graph.register_static(
                last_trailing_node,
                Token::EndOfPartialInput,
                SUCCESS_NODE,
                Some(Reducer::SetSelectedIndex(Selection::Command(self.index))),
            );
        }

        trace!(
            command = self.index,
            nodes = graph.len(),
            shortcuts = graph.shortcut_count(),
            "Compiled command subgraph"
        );

        graph
    }

    /// End of input before all positionals were given is an error, while end
    /// of partial input still selects the command.
    fn register_missing_positionals(&self, graph: &mut GraphBuilder, node: NodeId) {
        graph.register_static(
            node,
            Token::EndOfInput,
            ERROR_NODE,
            Some(Reducer::SetError(NOT_ENOUGH_POSITIONALS.to_string())),
        );
        graph.register_static(
            node,
            Token::EndOfPartialInput,
            SUCCESS_NODE,
            Some(Reducer::SetPartialIndex(self.index)),
        );
    }

    /// Makes `node` an option registration point.
    fn register_options(&self, graph: &mut GraphBuilder, node: NodeId) {
        graph.register_dynamic(
            node,
            Predicate::IsOption("--".to_string()),
            node,
            Some(Reducer::InhibitOptions),
        );
        graph.register_dynamic(
            node,
            Predicate::IsBatchOption(self.names.clone()),
            node,
            Some(Reducer::PushBatch(self.names.clone())),
        );
        graph.register_dynamic(
            node,
            Predicate::IsBoundOption(self.names.clone()),
            node,
            Some(Reducer::PushBound(self.names.clone())),
        );
        graph.register_dynamic(
            node,
            Predicate::IsUnsupportedOption(self.names.clone()),
            ERROR_NODE,
            Some(Reducer::SetError(UNSUPPORTED_OPTION.to_string())),
        );
        graph.register_dynamic(
            node,
            Predicate::IsInvalidOption,
            ERROR_NODE,
            Some(Reducer::SetError(INVALID_OPTION.to_string())),
        );

        for option in &self.options {
            if option.arity == 0 {
                for name in &option.names {
                    graph.register_dynamic(
                        node,
                        Predicate::IsOption(name.clone()),
                        node,
                        Some(Reducer::PushTrue(option.preferred_name.clone())),
                    );
                    if name.starts_with("--") && !name.starts_with("--no-") {
                        graph.register_dynamic(
                            node,
                            Predicate::IsNegatedOption(name.clone()),
                            node,
                            Some(Reducer::PushFalse(option.preferred_name.clone())),
                        );
                    }
                }
                continue;
            }

            // Private chain consuming exactly `arity` values.
            let mut last_node = graph.inject_node();
            for name in &option.names {
                graph.register_dynamic(
                    node,
                    Predicate::IsOption(name.clone()),
                    last_node,
                    Some(Reducer::PushUndefined(option.preferred_name.clone())),
                );
            }

            let action = if option.arity == 1 {
                Reducer::SetStringValue
            } else {
                Reducer::PushStringValue
            };
            for _ in 0..option.arity {
                let next_node = graph.inject_node();
                graph.register_static(
                    last_node,
                    Token::EndOfInput,
                    ERROR_NODE,
                    Some(Reducer::SetOptionArityError),
                );
                graph.register_static(
                    last_node,
                    Token::EndOfPartialInput,
                    ERROR_NODE,
                    Some(Reducer::SetOptionArityError),
                );
                graph.register_dynamic(
                    last_node,
                    Predicate::IsOptionLike,
                    ERROR_NODE,
                    Some(Reducer::SetOptionArityError),
                );
                graph.register_dynamic(
                    last_node,
                    Predicate::IsNotOptionLike,
                    next_node,
                    Some(action.clone()),
                );
                last_node = next_node;
            }

            graph.register_shortcut(last_node, node);
        }
    }
}
