//! Transition guards and state reducers.
//!
//! Both are closed enums carrying their arguments, so a compiled graph can be
//! compared, dumped and serialized. [`Predicate::test`] and
//! [`Reducer::apply`] are the only places where they are interpreted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::{
    AnnotatedToken, BoundOption, OptionValue, ParseState, Positional, PositionalKind, Selection,
    TokenKind,
};
use crate::token::{self, Token};

/// One accepted spelling of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameEntry {
    /// Preferred spelling of the owning option.
    pub preferred: String,
    /// Whether the owning option accepts the `--name=value` form.
    pub allow_binding: bool,
}

/// Every option spelling accepted by a command.
pub type OptionNameTable = BTreeMap<String, NameEntry>;

/// Guard of a dynamic transition, evaluated against the branch state and the
/// current token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "test", content = "args", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    IsOptionLike,
    IsNotOptionLike,
    /// Exact spelling (also used for `--`).
    IsOption(String),
    /// `--no-<name>` for the given `--<name>` spelling.
    IsNegatedOption(String),
    IsBatchOption(OptionNameTable),
    IsBoundOption(OptionNameTable),
    IsUnsupportedOption(OptionNameTable),
    IsInvalidOption,
    IsHelp,
}

impl Predicate {
    /// Evaluates the guard. Sentinel tokens only satisfy
    /// [`Predicate::Always`].
    pub fn test(&self, state: &ParseState, token: &Token) -> bool {
        let Some(segment) = token.as_literal() else {
            return matches!(self, Predicate::Always);
        };

        match self {
            Predicate::Always => true,
            Predicate::IsOptionLike => {
                !state.ignore_options && segment != "-" && segment.starts_with('-')
            }
            Predicate::IsNotOptionLike => {
                state.ignore_options || segment == "-" || !segment.starts_with('-')
            }
            Predicate::IsOption(name) => !state.ignore_options && segment == name,
            Predicate::IsNegatedOption(name) => {
                !state.ignore_options
                    && name
                        .strip_prefix("--")
                        .and_then(|rest| segment.strip_prefix("--no-").map(|s| s == rest))
                        .unwrap_or(false)
            }
            Predicate::IsBatchOption(names) => {
                !state.ignore_options
                    && token::is_batch_shaped(segment)
                    && segment[1..]
                        .chars()
                        .all(|letter| names.contains_key(&format!("-{letter}")))
            }
            Predicate::IsBoundOption(names) => {
                !state.ignore_options
                    && token::split_binding(segment).is_some_and(|(name, _)| {
                        token::is_option_shaped(name)
                            && names.get(name).is_some_and(|entry| entry.allow_binding)
                    })
            }
            Predicate::IsUnsupportedOption(names) => {
                !state.ignore_options
                    && segment.starts_with('-')
                    && token::is_option_shaped(segment)
                    && !names.contains_key(segment)
            }
            Predicate::IsInvalidOption => {
                !state.ignore_options
                    && segment.starts_with('-')
                    && !token::is_option_shaped(segment)
            }
            Predicate::IsHelp => {
                !state.ignore_options && token::parse_help_request(segment).is_some()
            }
        }
    }
}

/// State update attached to a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reducer", content = "args", rename_all = "snake_case")]
pub enum Reducer {
    /// Binds the candidate command's usage and required option groups.
    SetCandidateState {
        usage: String,
        required_options: Vec<Vec<String>>,
    },
    SetSelectedIndex(Selection),
    /// Selects a command on incomplete input.
    SetPartialIndex(usize),
    PushBatch(OptionNameTable),
    PushBound(OptionNameTable),
    PushPath,
    PushPositional,
    PushExtra,
    PushExtraNoLimits,
    PushTrue(String),
    PushFalse(String),
    PushUndefined(String),
    PushStringValue,
    SetStringValue,
    InhibitOptions,
    /// Turns the branch into a help request for the given command.
    UseHelp(usize),
    SetError(String),
    SetOptionArityError,
}

impl Reducer {
    /// Returns a copy of `state` updated for `token`.
    ///
    /// `segment_index` is the position of `token` in the raw input.
    pub fn apply(&self, state: &ParseState, token: &Token, segment_index: usize) -> ParseState {
        let mut next = state.clone();
        let segment = token.as_literal().unwrap_or_default();

        match self {
            Reducer::SetCandidateState {
                usage,
                required_options,
            } => {
                next.candidate_usage = Some(usage.clone());
                next.required_options = required_options.clone();
            }
            Reducer::SetSelectedIndex(selection) => {
                next.selection = Some(*selection);
            }
            Reducer::SetPartialIndex(index) => {
                next.selection = Some(Selection::Command(*index));
                next.partial = true;
            }
            Reducer::PushBatch(names) => {
                for (offset, letter) in segment.char_indices().skip(1) {
                    let Some(entry) = names.get(&format!("-{letter}")) else {
                        continue;
                    };
                    let slice = if offset == 1 {
                        (0, 2)
                    } else {
                        (offset, offset + letter.len_utf8())
                    };
                    next.options.push(BoundOption {
                        name: entry.preferred.clone(),
                        value: OptionValue::Flag(true),
                    });
                    next.tokens.push(AnnotatedToken {
                        segment_index,
                        kind: TokenKind::Option {
                            name: entry.preferred.clone(),
                            slice: Some(slice),
                        },
                    });
                }
            }
            Reducer::PushBound(names) => {
                if let Some((name, value)) = token::split_binding(segment) {
                    let preferred = names
                        .get(name)
                        .map_or_else(|| name.to_string(), |entry| entry.preferred.clone());
                    next.options.push(BoundOption {
                        name: preferred.clone(),
                        value: OptionValue::Single(value.to_string()),
                    });
                    next.tokens.push(AnnotatedToken {
                        segment_index,
                        kind: TokenKind::Assign { name: preferred },
                    });
                }
            }
            Reducer::PushPath => {
                next.path.push(segment.to_string());
                next.tokens.push(AnnotatedToken {
                    segment_index,
                    kind: TokenKind::Path,
                });
            }
            Reducer::PushPositional => {
                push_positional(&mut next, segment, segment_index, PositionalKind::Required);
            }
            Reducer::PushExtra => {
                push_positional(&mut next, segment, segment_index, PositionalKind::Extra);
            }
            Reducer::PushExtraNoLimits => {
                push_positional(&mut next, segment, segment_index, PositionalKind::Unbounded);
            }
            Reducer::PushTrue(name) => {
                push_option(&mut next, name, OptionValue::Flag(true), segment_index);
            }
            Reducer::PushFalse(name) => {
                push_option(&mut next, name, OptionValue::Flag(false), segment_index);
            }
            Reducer::PushUndefined(name) => {
                push_option(&mut next, name, OptionValue::Pending, segment_index);
            }
            Reducer::PushStringValue => {
                if let Some(last) = next.options.last_mut() {
                    match &mut last.value {
                        OptionValue::List(values) => values.push(segment.to_string()),
                        value => *value = OptionValue::List(vec![segment.to_string()]),
                    }
                }
                push_value_token(&mut next, segment_index);
            }
            Reducer::SetStringValue => {
                if let Some(last) = next.options.last_mut() {
                    last.value = OptionValue::Single(segment.to_string());
                }
                push_value_token(&mut next, segment_index);
            }
            Reducer::InhibitOptions => {
                next.ignore_options = true;
            }
            Reducer::UseHelp(command) => {
                let mut options = vec![BoundOption {
                    name: "-c".to_string(),
                    value: OptionValue::Single(command.to_string()),
                }];
                if let Some(Some(index)) = token::parse_help_request(segment) {
                    options.push(BoundOption {
                        name: "-i".to_string(),
                        value: OptionValue::Single(index.to_string()),
                    });
                }
                next.options = options;
            }
            Reducer::SetError(message) => {
                next.error_message = Some(match token {
                    Token::Literal(word) => format!("{message} (\"{word}\")."),
                    _ => format!("{message}."),
                });
            }
            Reducer::SetOptionArityError => {
                let name = state
                    .options
                    .last()
                    .map_or("<unknown>", |opt| opt.name.as_str());
                next.error_message = Some(format!("Not enough arguments to option {name}."));
            }
        }

        next
    }
}

fn push_positional(state: &mut ParseState, segment: &str, segment_index: usize, kind: PositionalKind) {
    state.positionals.push(Positional {
        value: segment.to_string(),
        kind,
    });
    state.tokens.push(AnnotatedToken {
        segment_index,
        kind: TokenKind::Positional,
    });
}

fn push_option(state: &mut ParseState, name: &str, value: OptionValue, segment_index: usize) {
    state.options.push(BoundOption {
        name: name.to_string(),
        value,
    });
    state.tokens.push(AnnotatedToken {
        segment_index,
        kind: TokenKind::Option {
            name: name.to_string(),
            slice: None,
        },
    });
}

fn push_value_token(state: &mut ParseState, segment_index: usize) {
    state.tokens.push(AnnotatedToken {
        segment_index,
        kind: TokenKind::Value,
    });
}
