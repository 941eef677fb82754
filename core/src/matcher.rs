//! Nondeterministic matcher.
//!
//! [`run_machine`] walks a frozen [`Graph`] with every live branch at once.
//! The input is framed as `<start> word... <end>` (or `<end-partial>` in
//! completion mode). For each token, every branch follows all matching static
//! transitions and, for literal tokens, all dynamic transitions whose guard
//! passes. Branches that reached the error node are moved along untouched so
//! their reasons can be reported if nothing else survives; only one of them is
//! kept per (usage, reason) pair.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{Candidate, ParseError};
use crate::graph::{ERROR_NODE, Graph, INITIAL_NODE, NodeId};
use crate::state::ParseState;
use crate::token::Token;
use crate::transition::Reducer;

/// A live position in the graph with its accumulated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub node: NodeId,
    pub state: ParseState,
}

impl Branch {
    fn follow(&self, to: NodeId, reducer: Option<&Reducer>, token: &Token, segment_index: usize) -> Self {
        let state = match reducer {
            Some(reducer) => reducer.apply(&self.state, token, segment_index),
            None => self.state.clone(),
        };
        Branch { node: to, state }
    }
}

/// Runs `input` through `graph` and returns the surviving branches.
///
/// With `partial` set, the last word may be a prefix of a static path word;
/// such branches continue as if the full word had been typed and record the
/// untyped suffix in [`ParseState::remainder`].
///
/// A single word that no command accepts at end of input (typically a path
/// prefix shared by several commands) yields a single help branch.
pub fn run_machine<S: AsRef<str>>(graph: &Graph, input: &[S], partial: bool) -> Result<Vec<Branch>, ParseError> {
    let words = to_words(input);
    let mut tokens = frame(&words);
    tokens.push(if partial {
        Token::EndOfPartialInput
    } else {
        Token::EndOfInput
    });

    let completing = partial.then(|| tokens.len() - 2);
    walk(graph, words, &tokens, completing)
}

/// Runs `input` without the closing token and returns the live branches.
///
/// The last word is prefix-matched as in partial mode, so the surviving
/// branches carry the suffixes that would complete it.
pub fn complete_branches<S: AsRef<str>>(graph: &Graph, input: &[S]) -> Result<Vec<Branch>, ParseError> {
    let words = to_words(input);
    let tokens = frame(&words);
    let completing = Some(tokens.len() - 1);
    walk(graph, words, &tokens, completing)
}

fn to_words<S: AsRef<str>>(input: &[S]) -> Vec<String> {
    input.iter().map(|word| word.as_ref().to_string()).collect()
}

fn frame(words: &[String]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(words.len() + 2);
    tokens.push(Token::StartOfInput);
    tokens.extend(words.iter().map(|word| Token::literal(word.as_str())));
    tokens
}

fn walk(
    graph: &Graph,
    words: Vec<String>,
    tokens: &[Token],
    completing: Option<usize>,
) -> Result<Vec<Branch>, ParseError> {
    let mut branches = vec![Branch {
        node: INITIAL_NODE,
        state: ParseState::default(),
    }];

    for (t, token) in tokens.iter().enumerate() {
        let segment_index = t.saturating_sub(1);
        let (mut next_branches, live): (Vec<Branch>, Vec<Branch>) =
            branches.into_iter().partition(|branch| branch.node == ERROR_NODE);
        let carried = next_branches.len();

        for branch in &live {
            let node = graph.node(branch.node);

            if let Some(transitions) = node.statics.get(token) {
                for transition in transitions {
                    next_branches.push(branch.follow(
                        transition.to,
                        transition.reducer.as_ref(),
                        token,
                        segment_index,
                    ));
                }
            } else if let (Some(_), Token::Literal(word)) = (completing.filter(|&last| last == t), token) {
                for (key, transitions) in &node.statics {
                    let Some(candidate) = key.as_literal() else {
                        continue;
                    };
                    let Some(suffix) = candidate.strip_prefix(word.as_str()) else {
                        continue;
                    };
                    for transition in transitions {
                        let mut next = branch.follow(
                            transition.to,
                            transition.reducer.as_ref(),
                            key,
                            segment_index,
                        );
                        next.state.remainder = Some(suffix.to_string());
                        next_branches.push(next);
                    }
                }
            }

            if !token.is_end() {
                for (predicate, transition) in &node.dynamics {
                    if predicate.test(&branch.state, token) {
                        next_branches.push(branch.follow(
                            transition.to,
                            transition.reducer.as_ref(),
                            token,
                            segment_index,
                        ));
                    }
                }
            }
        }

        trace!(
            step = t,
            token = %token,
            live = live.len(),
            failed = carried,
            after = next_branches.len(),
            "Matcher step"
        );

        if next_branches.is_empty() {
            if token.is_end() && words.len() == 1 {
                return Ok(vec![Branch {
                    node: INITIAL_NODE,
                    state: ParseState::help(),
                }]);
            }

            let candidates = candidates_from(live.iter().map(|branch| (&branch.state, None)));
            return Err(ParseError::UnknownSyntax {
                input: words,
                candidates,
            });
        }

        if next_branches.iter().all(|branch| branch.node == ERROR_NODE) {
            let candidates = candidates_from(
                next_branches
                    .iter()
                    .map(|branch| (&branch.state, branch.state.error_message.clone())),
            );
            return Err(ParseError::UnknownSyntax {
                input: words,
                candidates,
            });
        }

        branches = dedup_failed_branches(trim_smaller_branches(next_branches));
    }

    Ok(branches)
}

/// Drops error branches that repeat an earlier (usage, reason) pair. Live
/// branches are kept as they are.
fn dedup_failed_branches(branches: Vec<Branch>) -> Vec<Branch> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        branches
            .iter()
            .map(|branch| {
                branch.node != ERROR_NODE
                    || seen.insert((
                        branch.state.candidate_usage.as_deref(),
                        branch.state.error_message.as_deref(),
                    ))
            })
            .collect()
    };

    branches
        .into_iter()
        .zip(keep)
        .filter_map(|(branch, keep)| keep.then_some(branch))
        .collect()
}

/// Keeps only the branches that consumed the longest path.
pub fn trim_smaller_branches(branches: Vec<Branch>) -> Vec<Branch> {
    let longest = branches
        .iter()
        .map(|branch| branch.state.path.len())
        .max()
        .unwrap_or(0);

    branches
        .into_iter()
        .filter(|branch| branch.state.path.len() == longest)
        .collect()
}

/// One candidate per distinct (usage, reason) pair, in first-seen order.
/// States that never reached a command contribute nothing.
fn candidates_from<'a>(states: impl Iterator<Item = (&'a ParseState, Option<String>)>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for (state, reason) in states {
        let Some(usage) = &state.candidate_usage else {
            continue;
        };
        let candidate = Candidate {
            usage: usage.clone(),
            reason,
        };
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    candidates
}
