//! CLI support for jpq
//!
//! Command implementations take JSON text and hand back JSON values, so
//! they can be driven from tests or other tools without a terminal.

mod edit;
mod query;

pub use edit::{execute_flatten, execute_remove, execute_replace, execute_set, execute_unflatten};
pub use query::{QueryOptions, execute_check, execute_query};

use std::io;

use thiserror::Error;

use crate::error::{CompileError, EvalError};
use crate::flatten::FlattenError;
use crate::value::Value;

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Flatten error: {0}")]
    Flatten(#[from] FlattenError),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Cannot set {0}: the location is missing or a value of another type is in the way")]
    Unreachable(String),
}

fn parse_input(input: Option<&str>) -> Result<Value, CliError> {
    let text = input.ok_or(CliError::NoInput)?;
    Ok(Value::parse(text)?)
}
