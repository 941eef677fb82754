//! Error types.
//!
//! [`GrammarError`] is raised while commands are being declared and is a
//! programmer error: it surfaces immediately, before any graph exists.
//! [`ParseError`] is the user-facing outcome of a failed match.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Misconfigured command declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// An option was declared without any spelling.
    #[error("option must define at least one name")]
    MissingOptionName,
    /// A spelling is not `-x` or `--long-name`.
    #[error("invalid option name: {0}")]
    InvalidOptionName(String),
    /// Two options of the same command share a spelling.
    #[error("duplicate option name in command: {0}")]
    DuplicateOptionName(String),
    /// The `--name=value` form cannot carry several values.
    #[error("option {name} has arity {arity}, which cannot be combined with the --name=value form")]
    BindingArity { name: String, arity: usize },
    /// A path contains an empty word.
    #[error("path words cannot be empty")]
    EmptyPathWord,
    #[error("optional positional '{0}' cannot follow a rest or proxy list")]
    OptionalAfterRest(String),
    #[error("optional positional '{0}' cannot follow required trailing positionals")]
    OptionalAfterTrailing(String),
    #[error("rest list '{0}' cannot be declared twice in the same command")]
    DuplicateRest(String),
    #[error("rest list '{0}' cannot follow required trailing positionals")]
    RestAfterTrailing(String),
    #[error("rest list '{0}' cannot follow optional positionals")]
    RestAfterOptional(String),
}

/// Convenience alias for results with [`GrammarError`].
pub type Result<T> = std::result::Result<T, GrammarError>;

/// A command that was considered for rejected input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub usage: String,
    /// Specific reason the candidate was rejected, when one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Failure to resolve input against a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// No command accepts the input.
    #[error("unknown syntax for `{}` ({} candidate(s))", .input.join(" "), .candidates.len())]
    UnknownSyntax {
        input: Vec<String>,
        candidates: Vec<Candidate>,
    },
    /// Several commands accept the input equally well.
    #[error("ambiguous syntax for `{}`; could be any of: {}", .input.join(" "), .usages.join(" | "))]
    AmbiguousSyntax {
        input: Vec<String>,
        usages: Vec<String>,
    },
}

impl ParseError {
    /// Input words the error refers to.
    pub fn input(&self) -> &[String] {
        match self {
            ParseError::UnknownSyntax { input, .. } | ParseError::AmbiguousSyntax { input, .. } => {
                input
            }
        }
    }

    /// Usage strings of every candidate, in order.
    pub fn usages(&self) -> Vec<&str> {
        match self {
            ParseError::UnknownSyntax { candidates, .. } => {
                candidates.iter().map(|c| c.usage.as_str()).collect()
            }
            ParseError::AmbiguousSyntax { usages, .. } => usages.iter().map(String::as_str).collect(),
        }
    }
}
