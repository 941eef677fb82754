//! Selection of a single outcome among the matcher's terminal states.

use tracing::debug;

use crate::error::{Candidate, ParseError};
use crate::state::ParseState;

/// Picks the best terminal state.
///
/// States that selected nothing are discarded, then commands whose required
/// options are missing. Among the rest the longest path wins, then the
/// greediest (most positionals and options bound). Help outcomes collapse
/// into one; if several states still remain the input is ambiguous.
pub fn select_best_state<S: AsRef<str>>(input: &[S], states: Vec<ParseState>) -> Result<ParseState, ParseError> {
    let input: Vec<String> = input.iter().map(|word| word.as_ref().to_string()).collect();

    let terminal: Vec<ParseState> = states.into_iter().filter(ParseState::is_terminal).collect();
    if terminal.is_empty() {
        return Err(ParseError::UnknownSyntax {
            input,
            candidates: Vec::new(),
        });
    }

    let satisfied: Vec<ParseState> = terminal
        .iter()
        .filter(|state| state.is_help() || state.required_options_satisfied())
        .cloned()
        .collect();
    if satisfied.is_empty() {
        let mut candidates: Vec<Candidate> = Vec::new();
        for state in &terminal {
            let candidate = Candidate {
                usage: state.candidate_usage.clone().unwrap_or_default(),
                reason: None,
            };
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        debug!(dropped = terminal.len(), "No candidate has its required options");
        return Err(ParseError::UnknownSyntax { input, candidates });
    }

    let longest = satisfied.iter().map(|s| s.path.len()).max().unwrap_or(0);
    let mut best: Vec<ParseState> = satisfied
        .into_iter()
        .filter(|state| state.path.len() == longest)
        .collect();

    let greediest = best.iter().map(ParseState::specificity).max().unwrap_or(0);
    best.retain(|state| state.specificity() == greediest);

    let mut best = aggregate_help_states(best);
    debug!(
        terminal = terminal.len(),
        remaining = best.len(),
        "Resolved terminal states"
    );

    match best.len() {
        1 => Ok(best.remove(0)),
        _ => Err(ParseError::AmbiguousSyntax {
            input,
            usages: best
                .into_iter()
                .map(|state| state.candidate_usage.unwrap_or_default())
                .collect(),
        }),
    }
}

/// Collapses every help outcome into one, appended after the other states.
///
/// The merged help state keeps the path prefix common to all help states and
/// the concatenation of their options, so every `-c` entry survives. Its usage
/// is the leading words shared by the merged usages (for example `git remote`),
/// falling back to the common path.
pub fn aggregate_help_states(states: Vec<ParseState>) -> Vec<ParseState> {
    let (helps, mut others): (Vec<ParseState>, Vec<ParseState>) =
        states.into_iter().partition(ParseState::is_help);

    if !helps.is_empty() {
        let paths: Vec<&[String]> = helps.iter().map(|state| state.path.as_slice()).collect();
        let usages: Vec<Vec<String>> = helps
            .iter()
            .filter_map(|state| state.candidate_usage.as_deref())
            .map(|usage| usage.split_whitespace().map(str::to_string).collect())
            .collect();
        let usage_words: Vec<&[String]> = usages.iter().map(Vec::as_slice).collect();

        let mut merged = ParseState::help();
        merged.path = find_common_prefix(&paths);
        let shared = find_common_prefix(&usage_words);
        merged.candidate_usage = Some(if shared.is_empty() {
            merged.path.join(" ")
        } else {
            shared.join(" ")
        });
        merged.options = helps.into_iter().flat_map(|state| state.options).collect();
        others.push(merged);
    }

    others
}

/// Longest prefix shared by all sequences.
pub fn find_common_prefix(paths: &[&[String]]) -> Vec<String> {
    let Some((first, rest)) = paths.split_first() else {
        return Vec::new();
    };

    let len = rest.iter().fold(first.len(), |len, path| {
        first
            .iter()
            .zip(path.iter())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    });

    first[..len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BoundOption, OptionValue, Positional, PositionalKind, Selection};

    fn command(index: usize, path: &[&str]) -> ParseState {
        ParseState {
            candidate_usage: Some(format!("tool {}", path.join(" "))),
            path: path.iter().map(|w| w.to_string()).collect(),
            selection: Some(Selection::Command(index)),
            ..Default::default()
        }
    }

    fn help_for(index: usize, path: &[&str]) -> ParseState {
        let mut state = command(index, path);
        state.selection = Some(Selection::Help);
        state.options = vec![BoundOption {
            name: "-c".into(),
            value: OptionValue::Single(index.to_string()),
        }];
        state
    }

    #[test]
    fn test_non_terminal_states_only_is_unknown() {
        let mut state = command(0, &["a"]);
        state.selection = None;
        let error = select_best_state(&["a"], vec![state]).unwrap_err();
        assert_eq!(
            error,
            ParseError::UnknownSyntax {
                input: vec!["a".into()],
                candidates: Vec::new(),
            }
        );
    }

    #[test]
    fn test_longest_path_wins() {
        let best = select_best_state(&["a", "b"], vec![command(0, &["a"]), command(1, &["a", "b"])]).unwrap();
        assert_eq!(best.selection, Some(Selection::Command(1)));
    }

    #[test]
    fn test_greediest_wins() {
        let plain = command(0, &["run"]);
        let mut greedy = command(1, &["run"]);
        greedy.positionals.push(Positional {
            value: "x".into(),
            kind: PositionalKind::Required,
        });

        let best = select_best_state(&["run", "x"], vec![plain, greedy]).unwrap();
        assert_eq!(best.selection, Some(Selection::Command(1)));
    }

    #[test]
    fn test_extra_positionals_do_not_count() {
        let mut extra = command(0, &["run"]);
        extra.positionals.push(Positional {
            value: "x".into(),
            kind: PositionalKind::Extra,
        });
        let plain = command(1, &["run"]);

        let error = select_best_state(&["run"], vec![extra, plain]).unwrap_err();
        assert!(matches!(error, ParseError::AmbiguousSyntax { ref usages, .. } if usages.len() == 2));
    }

    #[test]
    fn test_missing_required_option_is_filtered() {
        let mut strict = command(0, &["deploy"]);
        strict.required_options = vec![vec!["--env".into()]];
        let loose = command(1, &["deploy"]);

        let best = select_best_state(&["deploy"], vec![strict.clone(), loose]).unwrap();
        assert_eq!(best.selection, Some(Selection::Command(1)));

        let error = select_best_state(&["deploy"], vec![strict]).unwrap_err();
        assert_eq!(error.usages(), vec!["tool deploy"]);
    }

    #[test]
    fn test_help_states_merge() {
        let states = vec![help_for(0, &["remote", "add"]), help_for(1, &["remote", "rm"])];
        let merged = aggregate_help_states(states);

        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_help());
        assert_eq!(merged[0].path, vec!["remote"]);
        assert_eq!(merged[0].candidate_usage.as_deref(), Some("tool remote"));
        assert_eq!(merged[0].help_commands(), vec![0, 1]);
    }

    #[test]
    fn test_help_tied_with_command_is_ambiguous() {
        let mut helps = vec![help_for(0, &["remote", "add"]), help_for(1, &["remote", "rm"])];
        for state in &mut helps {
            state.path.truncate(1);
        }
        let mut fetch = command(2, &["remote"]);
        fetch.candidate_usage = Some("tool remote <url>".into());
        fetch.positionals.push(Positional {
            value: "origin".into(),
            kind: PositionalKind::Required,
        });

        let mut states = helps;
        states.push(fetch);
        let error = select_best_state(&["remote", "origin"], states).unwrap_err();
        assert_eq!(
            error,
            ParseError::AmbiguousSyntax {
                input: vec!["remote".into(), "origin".into()],
                usages: vec!["tool remote <url>".into(), "tool remote".into()],
            }
        );
    }

    #[test]
    fn test_find_common_prefix() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["x".to_string(), "z".to_string()];
        let c = vec!["x".to_string()];
        assert_eq!(find_common_prefix(&[a.as_slice(), b.as_slice()]), vec!["x"]);
        assert_eq!(find_common_prefix(&[a.as_slice(), c.as_slice()]), vec!["x"]);
        assert_eq!(find_common_prefix(&[a.as_slice()]), a);
        assert!(find_common_prefix(&[]).is_empty());
    }
}
