//! Document edits: remove, replace, set, flatten and unflatten

use log::info;

use super::{CliError, parse_input};
use crate::expression::CompiledExpression;
use crate::flatten::{flatten, unflatten};
use crate::mutation;
use crate::path::NormalizedPath;
use crate::value::Value;

/// Remove every match of `expression`. Returns the edited document.
pub fn execute_remove(expression: &str, input: Option<&str>) -> Result<Value, CliError> {
    let expression = CompiledExpression::compile(expression)?;
    let mut document = parse_input(input)?;
    let removed = expression.remove(&mut document)?;
    info!("removed {removed} node(s)");
    Ok(document)
}

/// Overwrite every match of `expression` with the JSON in `value`.
pub fn execute_replace(
    expression: &str,
    input: Option<&str>,
    value: &str,
) -> Result<Value, CliError> {
    let expression = CompiledExpression::compile(expression)?;
    let new_value = Value::parse(value)?;
    let mut document = parse_input(input)?;
    let replaced = expression.replace_all(&mut document, &new_value)?;
    info!("replaced {replaced} node(s)");
    Ok(document)
}

/// Store the JSON in `value` at one normalized path, optionally creating
/// the missing structure on the way.
pub fn execute_set(
    path: &str,
    input: Option<&str>,
    value: &str,
    create: bool,
) -> Result<Value, CliError> {
    let location = NormalizedPath::parse(path)?;
    let new_value = Value::parse(value)?;
    let mut document = parse_input(input)?;

    let (_, stored) = mutation::replace(&mut document, &location, new_value, create);
    if !stored {
        return Err(CliError::Unreachable(location.to_string()));
    }
    Ok(document)
}

pub fn execute_flatten(input: Option<&str>) -> Result<Value, CliError> {
    Ok(flatten(&parse_input(input)?))
}

pub fn execute_unflatten(input: Option<&str>) -> Result<Value, CliError> {
    Ok(unflatten(&parse_input(input)?)?)
}
