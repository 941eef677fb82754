//! Grammar package validation.
//!
//! Declaring a command through a [`CommandBuilder`](crate::CommandBuilder)
//! fails on the first misconfiguration. [`validate_package`] runs the same
//! checks over a whole [`GrammarPackage`] and reports one error per faulty
//! command, so a grammar file can be fixed in a single pass.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let mut package = GrammarPackage::new("tool");
//! package.commands.push(CommandSpec::new(&["run"]));
//! assert!(validate_package(&package).is_empty());
//!
//! // Invalid: option spelling without a leading dash
//! package.commands.push(
//!     CommandSpec::new(&["build"]).with_option(OptionSpec::boolean(&["release"])),
//! );
//! assert!(!validate_package(&package).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::error::GrammarError;
use crate::{CommandBuilder, GrammarPackage, OptionSpec};

/// Package validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Binary name is empty or whitespace-only.
    #[error("binary name cannot be empty")]
    EmptyBinaryName,
    /// The package declares no command at all.
    #[error("grammar must declare at least one command")]
    NoCommands,
    /// A command declaration is misconfigured.
    #[error("command #{index}: {error}")]
    Command { index: usize, error: GrammarError },
}

/// Validates a full grammar package.
///
/// Checks the binary name, then replays every command through a
/// [`CommandBuilder`] and collects the first error of each faulty command.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let mut package = GrammarPackage::new("tool");
/// package.commands.push(
///     CommandSpec::new(&["run"])
///         .with_parameter(ParameterSpec::rest("args", 0))
///         .with_parameter(ParameterSpec::optional("extra")),
/// );
///
/// let errors = validate_package(&package);
/// assert!(matches!(
///     errors[0],
///     ValidationError::Command { index: 0, error: GrammarError::OptionalAfterRest(_) }
/// ));
/// ```
pub fn validate_package(package: &GrammarPackage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if package.binary_name.trim().is_empty() {
        errors.push(ValidationError::EmptyBinaryName);
        return errors;
    }

    if package.commands.is_empty() {
        errors.push(ValidationError::NoCommands);
        return errors;
    }

    for (index, spec) in package.commands.iter().enumerate() {
        if let Err(error) = CommandBuilder::from_spec(index, spec) {
            errors.push(ValidationError::Command { index, error });
        }
    }

    errors
}

/// Checks that `name` is a usable option spelling: `-x` or `--long-name`.
pub(crate) fn check_option_name(name: &str) -> Result<(), GrammarError> {
    let shaped = crate::token::is_option_shaped(name);
    let valid = if name.starts_with("--") {
        shaped
    } else {
        shaped && name.chars().count() == 2
    };

    if valid {
        Ok(())
    } else {
        Err(GrammarError::InvalidOptionName(name.to_string()))
    }
}

/// Checks every spelling of `spec` against the spellings already in use.
pub(crate) fn check_option_spec(spec: &OptionSpec, taken: &HashSet<&str>) -> Result<(), GrammarError> {
    if spec.names.is_empty() {
        return Err(GrammarError::MissingOptionName);
    }

    let mut seen = HashSet::new();
    for name in &spec.names {
        check_option_name(name)?;
        if taken.contains(name.as_str()) || !seen.insert(name.as_str()) {
            return Err(GrammarError::DuplicateOptionName(name.clone()));
        }
    }

    if spec.binding_allowed() && spec.arity > 1 {
        return Err(GrammarError::BindingArity {
            name: spec.names[0].clone(),
            arity: spec.arity,
        });
    }

    Ok(())
}
