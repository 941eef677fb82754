//! Grammar file loading.
//!
//! Grammar files hold a serialized [`GrammarPackage`]. Files ending in `.yml`
//! or `.yaml` are read as YAML, anything else as JSON.
//!
//! # Example YAML
//!
//! ```yaml
//! binary_name: yarn
//! commands:
//!   - paths: [[install]]
//!     options:
//!       - names: ["--frozen-lockfile"]
//!   - paths: [[add]]
//!     parameters:
//!       - kind: rest
//!         name: packages
//!         required: 1
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_grammar_core::{Grammar, GrammarBuilder, GrammarPackage, ValidationError, validate_package};
use thiserror::Error;

/// Errors raised while reading or writing grammar files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The grammar parsed but declares inconsistent commands.
    #[error("invalid grammar '{path}': {} problem(s)", .errors.len())]
    InvalidGrammar {
        path: String,
        errors: Vec<ValidationError>,
    },
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

/// Reads a grammar package without validating it.
pub fn load_package(path: impl AsRef<Path>) -> Result<GrammarPackage> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let package = if is_yaml(path) {
        serde_yaml::from_reader(reader)?
    } else {
        serde_json::from_reader(reader)?
    };
    Ok(package)
}

/// Writes a grammar package, choosing the format from the extension.
pub fn save_package(package: &GrammarPackage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    if is_yaml(path) {
        serde_yaml::to_writer(writer, package)?;
    } else {
        serde_json::to_writer_pretty(writer, package)?;
    }
    Ok(())
}

/// Reads and validates a grammar package.
pub fn load_valid_package(path: impl AsRef<Path>) -> Result<GrammarPackage> {
    let path = path.as_ref();
    let package = load_package(path)?;

    let errors = validate_package(&package);
    if !errors.is_empty() {
        return Err(ConfigError::InvalidGrammar {
            path: path.display().to_string(),
            errors,
        });
    }
    Ok(package)
}

/// Reads, validates and compiles a grammar file.
pub fn load_grammar(path: impl AsRef<Path>) -> Result<Grammar> {
    let path = path.as_ref();
    let package = load_valid_package(path)?;

    let builder = GrammarBuilder::from_package(&package).map_err(|error| ConfigError::InvalidGrammar {
        path: path.display().to_string(),
        errors: vec![error],
    })?;
    Ok(builder.compile())
}
