use command_grammar_core::*;

fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn process(grammar: &Grammar, line: &str) -> std::result::Result<ParseState, ParseError> {
    grammar.process(&words(line), false)
}

/// A small package-manager grammar exercising most constructs.
fn pm() -> Grammar {
    let mut builder = GrammarBuilder::new("pm");
    // 0
    builder
        .command()
        .add_path(["install"])
        .and_then(|c| c.add_option(OptionSpec::boolean(&["--frozen"])))
        .unwrap();
    // 1
    builder
        .command()
        .add_path(["add"])
        .and_then(|c| c.add_rest("packages", 1))
        .and_then(|c| c.add_option(OptionSpec::boolean(&["-D", "--dev"])))
        .and_then(|c| c.add_option(OptionSpec::boolean(&["-E", "--exact"])))
        .unwrap();
    // 2
    builder
        .command()
        .add_path(["run"])
        .and_then(|c| c.add_positional("script", true))
        .and_then(|c| c.add_proxy("args", 0))
        .unwrap();
    // 3
    builder
        .command()
        .add_path(["deploy"])
        .and_then(|c| c.add_option(OptionSpec::with_arity(&["--env"], 1).required()))
        .unwrap();
    // 4
    builder
        .command()
        .add_path(["move"])
        .and_then(|c| c.add_rest("sources", 1))
        .and_then(|c| c.add_positional("dest", true))
        .and_then(|c| c.add_option(OptionSpec::with_arity(&["--pair"], 2)))
        .unwrap();
    // 5
    builder
        .command()
        .add_path(["echo"])
        .and_then(|c| c.add_rest("words", 0))
        .and_then(|c| c.add_option(OptionSpec::boolean(&["-n"])))
        .unwrap();
    builder.compile()
}

#[test]
fn compile_is_deterministic() {
    let first = pm();
    let second = pm();
    assert_eq!(first, second);
    assert_eq!(first.graph().to_string(), second.graph().to_string());
}

#[test]
fn compiled_graph_has_no_shortcuts() {
    let grammar = pm();
    assert!(grammar.graph().nodes().iter().all(|node| node.shortcuts.is_empty()));
    assert!(grammar.graph().node(SUCCESS_NODE).is_empty());
    assert!(grammar.graph().node(ERROR_NODE).is_empty());
}

#[test]
fn processing_is_repeatable() {
    let grammar = pm();
    let first = process(&grammar, "add -D left-pad");
    let second = process(&grammar, "add -D left-pad");
    assert_eq!(first, second);
}

#[test]
fn longest_path_wins() {
    let mut builder = GrammarBuilder::new("git");
    builder
        .command()
        .add_path(["remote"])
        .and_then(|c| c.add_rest("args", 0))
        .unwrap();
    builder
        .command()
        .add_path(["remote", "add"])
        .and_then(|c| c.add_positional("name", true))
        .unwrap();
    let grammar = builder.compile();

    let decision = process(&grammar, "remote add origin").unwrap();
    assert_eq!(decision.selection, Some(Selection::Command(1)));
    assert_eq!(decision.path, vec!["remote", "add"]);
}

#[test]
fn greediest_candidate_wins() {
    let mut builder = GrammarBuilder::new("tool");
    builder
        .command()
        .add_path(["copy"])
        .and_then(|c| c.add_rest("files", 0))
        .unwrap();
    builder
        .command()
        .add_path(["copy"])
        .and_then(|c| c.add_positional("src", true))
        .and_then(|c| c.add_positional("dest", true))
        .unwrap();
    let grammar = builder.compile();

    let decision = process(&grammar, "copy a b").unwrap();
    assert_eq!(decision.selection, Some(Selection::Command(1)));

    let decision = process(&grammar, "copy a b c").unwrap();
    assert_eq!(decision.selection, Some(Selection::Command(0)));
}

#[test]
fn equally_good_candidates_are_ambiguous() {
    let mut builder = GrammarBuilder::new("tool");
    builder
        .command()
        .add_path(["open"])
        .and_then(|c| c.add_positional("file", true))
        .unwrap();
    builder
        .command()
        .add_path(["open"])
        .and_then(|c| c.add_positional("url", true))
        .unwrap();
    let grammar = builder.compile();

    let error = process(&grammar, "open x").unwrap_err();
    assert_eq!(
        error,
        ParseError::AmbiguousSyntax {
            input: words("open x"),
            usages: vec!["tool open <file>".into(), "tool open <url>".into()],
        }
    );
}

#[test]
fn required_option_gates_selection() {
    let grammar = pm();

    let error = process(&grammar, "deploy").unwrap_err();
    assert!(matches!(error, ParseError::UnknownSyntax { .. }));
    assert_eq!(error.usages(), vec!["pm deploy <--env #0>"]);

    let decision = process(&grammar, "deploy --env prod").unwrap();
    assert_eq!(decision.option("--env"), Some(&OptionValue::Single("prod".into())));

    let decision = process(&grammar, "deploy --env=prod").unwrap();
    assert_eq!(decision.option("--env"), Some(&OptionValue::Single("prod".into())));
}

#[test]
fn double_dash_stops_option_parsing() {
    let grammar = pm();
    let decision = process(&grammar, "echo -n -- -n --frozen").unwrap();

    assert_eq!(decision.selection, Some(Selection::Command(5)));
    assert!(decision.ignore_options);
    assert_eq!(decision.options.len(), 1);
    assert_eq!(decision.positional_values(), vec!["-n", "--frozen"]);
}

#[test]
fn options_interleave_with_positionals() {
    let grammar = pm();
    let decision = process(&grammar, "add left-pad -D is-odd --exact").unwrap();

    assert_eq!(decision.positional_values(), vec!["left-pad", "is-odd"]);
    assert_eq!(decision.option("--dev"), Some(&OptionValue::Flag(true)));
    assert_eq!(decision.option("--exact"), Some(&OptionValue::Flag(true)));
}

#[test]
fn short_flag_cluster_sets_each_flag() {
    let grammar = pm();
    let decision = process(&grammar, "add -DE left-pad").unwrap();

    assert_eq!(decision.option("--dev"), Some(&OptionValue::Flag(true)));
    assert_eq!(decision.option("--exact"), Some(&OptionValue::Flag(true)));
    let slices: Vec<Option<(usize, usize)>> = decision
        .tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Option { slice, .. } => Some(*slice),
            _ => None,
        })
        .collect();
    assert_eq!(slices, vec![Some((0, 2)), Some((2, 3))]);
}

#[test]
fn negated_flag_binds_false() {
    let grammar = pm();
    let decision = process(&grammar, "install --no-frozen").unwrap();
    assert_eq!(decision.option("--frozen"), Some(&OptionValue::Flag(false)));
}

#[test]
fn multi_value_option_consumes_exact_arity() {
    let grammar = pm();
    let decision = process(&grammar, "move --pair a b src dest").unwrap();

    assert_eq!(
        decision.option("--pair"),
        Some(&OptionValue::List(vec!["a".into(), "b".into()]))
    );
    assert_eq!(decision.positional_values(), vec!["src", "dest"]);

    let error = process(&grammar, "move src dest --pair a").unwrap_err();
    let ParseError::UnknownSyntax { candidates, .. } = error else {
        panic!("expected unknown syntax");
    };
    assert_eq!(
        candidates[0].reason.as_deref(),
        Some("Not enough arguments to option --pair.")
    );
}

#[test]
fn rest_then_trailing_positional() {
    let grammar = pm();
    let decision = process(&grammar, "move a b c dest").unwrap();
    let kinds: Vec<PositionalKind> = decision.positionals.iter().map(|p| p.kind).collect();

    assert_eq!(
        kinds,
        vec![
            PositionalKind::Required,
            PositionalKind::Unbounded,
            PositionalKind::Unbounded,
            PositionalKind::Required,
        ]
    );
}

#[test]
fn proxy_captures_everything_after_leading() {
    let grammar = pm();
    let decision = process(&grammar, "run build --frozen -x").unwrap();

    assert_eq!(decision.selection, Some(Selection::Command(2)));
    assert_eq!(decision.positional_values(), vec!["build", "--frozen", "-x"]);
    assert!(decision.options.is_empty());
}

#[test]
fn unknown_option_is_reported() {
    let grammar = pm();
    let error = process(&grammar, "install --force").unwrap_err();
    let ParseError::UnknownSyntax { candidates, .. } = error else {
        panic!("expected unknown syntax");
    };
    assert_eq!(
        candidates[0].reason.as_deref(),
        Some("Unsupported option name (\"--force\").")
    );
}

#[test]
fn missing_positional_is_reported() {
    let grammar = pm();
    let error = process(&grammar, "add").unwrap_err();
    let ParseError::UnknownSyntax { candidates, .. } = error else {
        panic!("expected unknown syntax");
    };
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].usage, "pm add [-D,--dev] [-E,--exact] <packages> [packages...]");
    assert_eq!(candidates[0].reason.as_deref(), Some("Not enough positional arguments."));
}

#[test]
fn partial_input_completes_path_words() {
    let grammar = pm();
    let decision = grammar.process(&["inst"], true).unwrap();

    assert_eq!(decision.selection, Some(Selection::Command(0)));
    assert_eq!(decision.remainder.as_deref(), Some("all"));
    assert_eq!(grammar.completions(&["inst"]), vec!["all"]);
}

#[test]
fn partial_input_with_missing_positionals_succeeds() {
    let grammar = pm();
    let decision = grammar.process(&["run"], true).unwrap();

    assert_eq!(decision.selection, Some(Selection::Command(2)));
    assert!(decision.partial);
}

/// Two commands under a shared `remote` prefix.
fn git() -> Grammar {
    let mut builder = GrammarBuilder::new("git");
    builder
        .command()
        .add_path(["remote", "add"])
        .and_then(|c| c.add_positional("name", true))
        .and_then(|c| c.add_option(OptionSpec::boolean(&["-f", "--fetch"])))
        .unwrap();
    builder
        .command()
        .add_path(["remote", "remove"])
        .and_then(|c| c.add_positional("name", true))
        .unwrap();
    builder.compile()
}

#[test]
fn shared_path_prefix_yields_help() {
    let grammar = git();
    let decision = process(&grammar, "remote").unwrap();
    assert!(decision.is_help());
}

#[test]
fn empty_input_is_unknown_syntax() {
    let grammar = pm();
    let error = grammar.process::<&str>(&[], false).unwrap_err();
    assert!(matches!(error, ParseError::UnknownSyntax { .. }));
    assert_eq!(error.usages().len(), 6);
}

#[test]
fn options_follow_interior_path_words() {
    let grammar = git();
    let decision = process(&grammar, "remote -f add origin").unwrap();

    assert_eq!(decision.selection, Some(Selection::Command(0)));
    assert_eq!(decision.path, vec!["remote", "add"]);
    assert_eq!(decision.option("--fetch"), Some(&OptionValue::Flag(true)));
    assert_eq!(decision.positional_values(), vec!["origin"]);

    let error = process(&grammar, "remote -f remove origin").unwrap_err();
    assert!(matches!(error, ParseError::UnknownSyntax { .. }));
}

#[test]
fn long_rest_input_resolves() {
    let grammar = pm();
    let mut input = vec!["echo".to_string()];
    input.extend((0..1000).map(|i| format!("w{i}")));

    let decision = grammar.process(&input, false).unwrap();
    assert_eq!(decision.selection, Some(Selection::Command(5)));
    assert_eq!(decision.positionals.len(), 1000);
}

#[test]
fn help_flag_after_command_path() {
    let grammar = pm();
    let decision = process(&grammar, "add --help").unwrap();

    assert!(decision.is_help());
    assert_eq!(decision.help_commands(), vec![1]);
}

#[test]
fn help_with_index() {
    let grammar = pm();
    let decision = process(&grammar, "install --help=2").unwrap();

    assert!(decision.is_help());
    assert_eq!(decision.option("-i"), Some(&OptionValue::Single("2".into())));
}

#[test]
fn grammar_is_shareable_across_threads() {
    let grammar = std::sync::Arc::new(pm());

    let handles: Vec<_> = ["install", "add x", "run build", "echo"]
        .into_iter()
        .map(|line| {
            let grammar = std::sync::Arc::clone(&grammar);
            std::thread::spawn(move || process(&grammar, line).map(|d| d.selection))
        })
        .collect();

    let selections: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
    assert_eq!(
        selections,
        vec![
            Some(Selection::Command(0)),
            Some(Selection::Command(1)),
            Some(Selection::Command(2)),
            Some(Selection::Command(5)),
        ]
    );
}

#[test]
fn package_replay_matches_builder_calls() {
    let mut package = GrammarPackage::new("pm");
    package.commands.push(
        CommandSpec::new(&["add"])
            .with_parameter(ParameterSpec::rest("packages", 1))
            .with_option(OptionSpec::boolean(&["-D", "--dev"])),
    );
    let from_package = GrammarBuilder::from_package(&package).unwrap().compile();

    let mut builder = GrammarBuilder::new("pm");
    builder
        .command()
        .add_path(["add"])
        .and_then(|c| c.add_rest("packages", 1))
        .and_then(|c| c.add_option(OptionSpec::boolean(&["-D", "--dev"])))
        .unwrap();

    assert_eq!(from_package, builder.compile());
}
