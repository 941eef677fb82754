//! Token vocabulary consumed by the matcher, and the lexical shapes used to
//! classify raw words.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{1,2}\w+(-\w+)*$").expect("static regex must compile"));
static BATCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[a-zA-Z]{2,}$").expect("static regex must compile"));
static BINDING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=]+)=([\s\S]*)$").expect("static regex must compile"));
static HELP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-h|--help)(?:=([0-9]+))?$").expect("static regex must compile"));

/// A single unit of matcher input.
///
/// Sentinels only ever appear at stream boundaries; everything in between is a
/// [`Token::Literal`] copied verbatim from the input words.
///
/// The derived ordering puts sentinels before literals, which keeps static
/// transition tables (and therefore graph dumps) deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Synthetic token opening every match attempt.
    StartOfInput,
    /// Synthetic token closing a fully terminated command line.
    EndOfInput,
    /// Synthetic token closing an in-progress command line (completion).
    EndOfPartialInput,
    /// A raw input word.
    Literal(String),
}

impl Token {
    /// Wraps a raw word.
    pub fn literal(word: impl Into<String>) -> Self {
        Token::Literal(word.into())
    }

    /// Returns `true` for [`EndOfInput`](Token::EndOfInput) and
    /// [`EndOfPartialInput`](Token::EndOfPartialInput).
    pub fn is_end(&self) -> bool {
        matches!(self, Token::EndOfInput | Token::EndOfPartialInput)
    }

    /// Returns the word carried by a literal token.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Token::Literal(word) => Some(word),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StartOfInput => f.write_str("<start>"),
            Token::EndOfInput => f.write_str("<end>"),
            Token::EndOfPartialInput => f.write_str("<end-partial>"),
            Token::Literal(word) => write!(f, "{word:?}"),
        }
    }
}

/// Returns `true` when `word` has the syntax of an option spelling
/// (`-x`, `-abc`, `--long-name`).
pub fn is_option_shaped(word: &str) -> bool {
    OPTION_RE.is_match(word)
}

/// Returns `true` when `word` looks like a cluster of single-letter flags
/// (`-abc`).
pub fn is_batch_shaped(word: &str) -> bool {
    BATCH_RE.is_match(word)
}

/// Splits a `name=value` word into its two halves.
pub fn split_binding(word: &str) -> Option<(&str, &str)> {
    let captures = BINDING_RE.captures(word)?;
    let name = captures.get(1)?.as_str();
    let value = captures.get(2).map_or("", |m| m.as_str());
    Some((name, value))
}

/// Recognizes `-h`, `--help` and `--help=N`.
///
/// Returns `None` when `word` is not a help request, `Some(None)` for a plain
/// request and `Some(Some(index))` when an index was attached.
pub fn parse_help_request(word: &str) -> Option<Option<&str>> {
    let captures = HELP_RE.captures(word)?;
    Some(captures.get(2).map(|m| m.as_str()))
}
