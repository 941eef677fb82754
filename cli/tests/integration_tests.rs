use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const YARN_GRAMMAR: &str = r#"binary_name: yarn
commands:
  - paths: [[install]]
    options:
      - names: ["--frozen-lockfile"]
  - paths: [[add]]
    parameters:
      - kind: rest
        name: packages
        required: 1
    options:
      - names: ["-D", "--dev"]
  - paths: [[run]]
    parameters:
      - kind: proxy
        name: args
  - paths: [[config, set]]
    parameters:
      - kind: positional
        name: key
      - kind: positional
        name: value
"#;

fn write_grammar(dir: &Path) -> PathBuf {
    let path = dir.join("yarn.yaml");
    fs::write(&path, YARN_GRAMMAR).expect("failed to write grammar");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grammar-match"))
        .args(args)
        .output()
        .expect("failed to run grammar-match")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_valid_grammar() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["check", grammar.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("4 command(s) for 'yarn'"));
}

#[test]
fn check_reports_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    let json = serde_json::json!({
        "binary_name": "tool",
        "commands": [
            { "paths": [["a"]], "options": [{ "names": ["nodash"] }] },
            { "paths": [["b"]] },
            { "paths": [["c", ""]] }
        ]
    });
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

    let output = run(&["check", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("2 problem(s)"), "stderr: {err}");
    assert!(err.contains("command #0: invalid option name: nodash"));
    assert!(err.contains("command #2: path words cannot be empty"));
}

#[test]
fn check_writes_normalized_json() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());
    let normalized = dir.path().join("yarn.json");

    let output = run(&[
        "check",
        grammar.to_str().unwrap(),
        "--output",
        normalized.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let raw = fs::read_to_string(&normalized).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["binary_name"], "yarn");
    assert_eq!(value["commands"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// match
// ---------------------------------------------------------------------------

#[test]
fn match_prints_decision_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["match", grammar.to_str().unwrap(), "add", "-D", "serde"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["selection"]["command"], 1);
    assert_eq!(value["path"], serde_json::json!(["add"]));
    assert_eq!(value["positionals"][0]["value"], "serde");
    assert_eq!(value["options"][0]["name"], "--dev");
    assert_eq!(value["options"][0]["value"], true);
}

#[test]
fn match_proxy_keeps_options_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["match", grammar.to_str().unwrap(), "run", "build", "--watch"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["selection"]["command"], 2);
    assert_eq!(value["positionals"][1]["value"], "--watch");
    assert_eq!(value["positionals"][1]["kind"], "unbounded");
}

#[test]
fn match_text_format() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&[
        "match",
        "--format",
        "text",
        grammar.to_str().unwrap(),
        "install",
        "--frozen-lockfile",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "command 0 (yarn install [--frozen-lockfile]) --frozen-lockfile=true\n"
    );
}

#[test]
fn match_unknown_syntax_exits_with_two() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["match", grammar.to_str().unwrap(), "install", "extra"]);
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.starts_with("error: unknown syntax"), "stderr: {err}");
    assert!(err.contains("Extraneous positional argument (\"extra\")."));
}

#[test]
fn match_partial_selects_incomplete_command() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["match", "--partial", grammar.to_str().unwrap(), "config", "set", "key"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["selection"]["command"], 3);
    assert_eq!(value["partial"], true);
}

#[test]
fn match_help_request() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["match", "--format", "yaml", grammar.to_str().unwrap(), "install", "-h"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("selection: help"));
}

// ---------------------------------------------------------------------------
// complete / dump / batch
// ---------------------------------------------------------------------------

#[test]
fn complete_lists_path_words() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["complete", grammar.to_str().unwrap(), "config", "s"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "set\n");
}

#[test]
fn dump_lists_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());

    let output = run(&["dump", grammar.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("# command 0: yarn install [--frozen-lockfile]"));
    assert!(out.contains("node initial:"));
    assert!(out.contains("<start> ->"));
}

#[test]
fn batch_resolves_lines_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path());
    let input = dir.path().join("lines.txt");
    fs::write(&input, "install\n\nadd left-pad\nremove x\nrun test --ci\n").unwrap();

    let output = run(&[
        "batch",
        grammar.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--jobs",
        "2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 of 4 line(s) did not resolve."));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entries = value.as_array().unwrap();
    let lines: Vec<u64> = entries.iter().map(|e| e["line"].as_u64().unwrap()).collect();
    assert_eq!(lines, vec![1, 3, 4, 5]);
    assert_eq!(entries[1]["decision"]["selection"]["command"], 1);
    assert_eq!(entries[2]["error"]["kind"], "unknown_syntax");
    assert_eq!(entries[3]["decision"]["selection"]["command"], 2);
}

#[test]
fn missing_grammar_file_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");

    let output = run(&["match", missing.to_str().unwrap(), "install"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: I/O error"));
}
