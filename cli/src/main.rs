mod config;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use command_grammar_core::{Grammar, OptionValue, ParseError, ParseState, Selection};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, load_grammar, load_valid_package, save_package};

/// Output format for decisions and dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "grammar-match")]
#[command(about = "Compile command-line grammars and match input against them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a grammar file.
    Check(CheckArgs),
    /// Resolve one command line against a grammar.
    Match(MatchArgs),
    /// List completions for the last word of a command line.
    Complete(CompleteArgs),
    /// Print the compiled transition graph.
    Dump(DumpArgs),
    /// Resolve every line of a file, in parallel.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Grammar file (YAML for .yml/.yaml, JSON otherwise).
    grammar: PathBuf,
    /// Also write the normalized grammar to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Treat the input as incomplete (completion mode).
    #[arg(long)]
    partial: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Grammar file.
    grammar: PathBuf,
    /// Words to match, as they would follow the binary name.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    /// Grammar file.
    grammar: PathBuf,
    /// Words typed so far; the last one is completed.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

#[derive(Debug, Args)]
struct DumpArgs {
    /// Output format (text lists every node and its transitions).
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
    /// Grammar file.
    grammar: PathBuf,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Grammar file.
    grammar: PathBuf,
    /// File with one command line per line (`-` reads stdin).
    #[arg(long)]
    input: PathBuf,
    /// Number of parallel jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Treat every line as incomplete input.
    #[arg(long)]
    partial: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error("{0}")]
    Message(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Syntax(_) => 2,
            _ => 1,
        }
    }
}

type Result<T> = std::result::Result<T, CliError>;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Match(args) => run_match(args),
        Command::Complete(args) => run_complete(args),
        Command::Dump(args) => run_dump(args),
        Command::Batch(args) => run_batch(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        report_details(&err);
        std::process::exit(err.exit_code());
    }
}

fn report_details(err: &CliError) {
    match err {
        CliError::Config(ConfigError::InvalidGrammar { errors, .. }) => {
            for error in errors {
                eprintln!("  - {error}");
            }
        }
        CliError::Syntax(ParseError::UnknownSyntax { candidates, .. }) => {
            for candidate in candidates {
                match &candidate.reason {
                    Some(reason) => eprintln!("  {} ({reason})", candidate.usage),
                    None => eprintln!("  {}", candidate.usage),
                }
            }
        }
        _ => {}
    }
}

fn run_check(args: CheckArgs) -> Result<()> {
    let package = load_valid_package(&args.grammar)?;

    if let Some(output) = &args.output {
        save_package(&package, output)?;
        println!("Wrote normalized grammar to '{}'.", output.display());
    }

    println!(
        "Grammar '{}' is valid: {} command(s) for '{}'.",
        args.grammar.display(),
        package.command_count(),
        package.binary_name
    );
    Ok(())
}

fn run_match(args: MatchArgs) -> Result<()> {
    let grammar = load_grammar(&args.grammar)?;
    let decision = grammar.process(&args.words, args.partial)?;

    match args.format {
        CliOutputFormat::Text => print!("{}", describe(&grammar, &decision)),
        format => println!("{}", render(&decision, format)?),
    }
    Ok(())
}

fn run_complete(args: CompleteArgs) -> Result<()> {
    let grammar = load_grammar(&args.grammar)?;
    for suffix in grammar.completions(&args.words) {
        let word = args.words.last().map_or("", String::as_str);
        println!("{word}{suffix}");
    }
    Ok(())
}

fn run_dump(args: DumpArgs) -> Result<()> {
    let grammar = load_grammar(&args.grammar)?;

    match args.format {
        CliOutputFormat::Text => {
            for command in grammar.commands() {
                println!("# command {}: {}", command.index, command.usage);
            }
            print!("{}", grammar.graph());
        }
        format => println!("{}", render(&grammar, format)?),
    }
    Ok(())
}

/// Outcome of one batch line.
#[derive(Debug, Serialize)]
struct BatchEntry {
    line: usize,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<ParseState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ParseError>,
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let grammar = load_grammar(&args.grammar)?;

    let raw = if args.input.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|err| CliError::Message(format!("Failed to read stdin: {err}")))?;
        raw
    } else {
        fs::read_to_string(&args.input).map_err(|err| {
            CliError::Message(format!("Failed to read '{}': {err}", args.input.display()))
        })?
    };

    let lines: Vec<(usize, Vec<String>)> = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.split_whitespace().map(str::to_string).collect()))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| CliError::Message(format!("Failed to create thread pool: {e}")))?;

    let partial = args.partial;
    let entries: Vec<BatchEntry> = pool.install(|| {
        lines
            .par_iter()
            .map(|(line, words)| {
                let (decision, error) = match grammar.process(words, partial) {
                    Ok(decision) => (Some(decision), None),
                    Err(error) => (None, Some(error)),
                };
                BatchEntry {
                    line: *line,
                    input: words.clone(),
                    decision,
                    error,
                }
            })
            .collect()
    });

    match args.format {
        CliOutputFormat::Text => {
            for entry in &entries {
                match (&entry.decision, &entry.error) {
                    (Some(decision), _) => {
                        print!("{}: {}", entry.line, describe(&grammar, decision));
                    }
                    (None, Some(error)) => println!("{}: error: {error}", entry.line),
                    (None, None) => {}
                }
            }
        }
        format => println!("{}", render(&entries, format)?),
    }

    let failed = entries.iter().filter(|entry| entry.error.is_some()).count();
    if failed > 0 {
        eprintln!("{failed} of {} line(s) did not resolve.", entries.len());
    }
    Ok(())
}

fn render<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| CliError::Message(format!("Failed to serialize output: {e}"))),
        CliOutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|e| CliError::Message(format!("Failed to serialize output: {e}"))),
        CliOutputFormat::Text => Err(CliError::Message(
            "text output is not available for this value".to_string(),
        )),
    }
}

/// Human-readable summary of a decision, one line.
fn describe(grammar: &Grammar, decision: &ParseState) -> String {
    let mut out = match decision.selection {
        Some(Selection::Command(index)) => match grammar.command(index) {
            Some(command) => format!("command {index} ({})", command.usage),
            None => format!("command {index}"),
        },
        Some(Selection::Help) => {
            let commands: Vec<String> = decision
                .help_commands()
                .iter()
                .map(|index| index.to_string())
                .collect();
            format!("help [{}]", commands.join(","))
        }
        None => "no selection".to_string(),
    };

    if !decision.positionals.is_empty() {
        out.push_str(&format!(" positionals={:?}", decision.positional_values()));
    }
    for option in &decision.options {
        let value = match &option.value {
            OptionValue::Flag(flag) => flag.to_string(),
            OptionValue::Pending => "?".to_string(),
            OptionValue::Single(value) => value.clone(),
            OptionValue::List(values) => values.join(","),
        };
        out.push_str(&format!(" {}={value}", option.name));
    }
    if decision.partial {
        out.push_str(" (partial)");
    }
    if let Some(remainder) = &decision.remainder {
        out.push_str(&format!(" remainder={remainder:?}"));
    }
    out.push('\n');
    out
}
