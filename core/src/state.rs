//! Parse state threaded through every transition of a match attempt.
//!
//! A [`ParseState`] is never mutated in place once a branch owns it: reducers
//! clone the state they receive and return the updated copy, so sibling
//! branches never observe each other's bindings.

use serde::{Deserialize, Serialize};

/// Value bound to an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag (`--force` is `true`, `--no-force` is `false`).
    Flag(bool),
    /// Option whose values have not been consumed yet.
    Pending,
    /// Single value (`--name foo` or `--name=foo`).
    Single(String),
    /// Values of an option with arity greater than one, in input order.
    List(Vec<String>),
}

/// An option occurrence, keyed by the option's preferred spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundOption {
    pub name: String,
    pub value: OptionValue,
}

/// Classification of a positional value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalKind {
    /// Leading or trailing required positional.
    Required,
    /// Value filling a bounded optional slot.
    Extra,
    /// Value captured by a rest or proxy zone.
    Unbounded,
}

/// A positional value with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positional {
    pub value: String,
    pub kind: PositionalKind,
}

impl Positional {
    /// Returns `true` for values that do not count towards specificity.
    pub fn is_extra(&self) -> bool {
        !matches!(self.kind, PositionalKind::Required)
    }
}

/// Outcome selected once a branch reaches the success node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Index of the command, in registration order.
    Command(usize),
    /// Reserved help outcome.
    Help,
}

/// What an input word was interpreted as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenKind {
    Path,
    Positional,
    /// An option spelling. `slice` locates one letter inside a short-flag
    /// cluster, as a byte range of the word.
    Option {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slice: Option<(usize, usize)>,
    },
    /// A `--name=value` word.
    Assign { name: String },
    /// A value consumed by an option with arity.
    Value,
}

/// Annotation of one input word (or one letter of a flag cluster).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    /// Index of the word in the raw input, starting at zero.
    pub segment_index: usize,
    #[serde(flatten)]
    pub kind: TokenKind,
}

/// The accumulator of a single branch.
///
/// The winning state of a match attempt is the decision handed back to the
/// caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseState {
    /// Usage string of the command this branch is trying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_usage: Option<String>,
    /// Option groups that must be bound for the candidate command. A group is
    /// satisfied when any of its spellings was bound.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_options: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set once `--` was seen.
    pub ignore_options: bool,
    pub options: Vec<BoundOption>,
    pub path: Vec<String>,
    pub positionals: Vec<Positional>,
    /// Unmatched suffix of a prefix-matched word (partial input only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remainder: Option<String>,
    pub selection: Option<Selection>,
    /// Set when the selection was made on incomplete input.
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<AnnotatedToken>,
}

impl ParseState {
    /// State returned when nothing was typed and no command accepts an
    /// empty line.
    pub fn help() -> Self {
        Self {
            selection: Some(Selection::Help),
            ..Default::default()
        }
    }

    /// Returns `true` once a terminal outcome was selected.
    pub fn is_terminal(&self) -> bool {
        self.selection.is_some()
    }

    /// Returns `true` for the reserved help outcome.
    pub fn is_help(&self) -> bool {
        self.selection == Some(Selection::Help)
    }

    /// Returns `true` when every required option group has a bound spelling.
    pub fn required_options_satisfied(&self) -> bool {
        self.required_options.iter().all(|group| {
            group
                .iter()
                .any(|name| self.options.iter().any(|opt| &opt.name == name))
        })
    }

    /// Count of required positionals plus bound options; the resolver
    /// prefers the greediest candidate.
    pub fn specificity(&self) -> usize {
        self.positionals.iter().filter(|p| !p.is_extra()).count() + self.options.len()
    }

    /// Returns the values of the first occurrence of `name`.
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|opt| opt.name == name)
            .map(|opt| &opt.value)
    }

    /// Command indices recorded by help requests (`-c` entries).
    pub fn help_commands(&self) -> Vec<usize> {
        self.options
            .iter()
            .filter(|opt| opt.name == "-c")
            .filter_map(|opt| match &opt.value {
                OptionValue::Single(value) => value.parse().ok(),
                _ => None,
            })
            .collect()
    }

    /// Positional values in input order, regardless of their kind.
    pub fn positional_values(&self) -> Vec<&str> {
        self.positionals.iter().map(|p| p.value.as_str()).collect()
    }
}
