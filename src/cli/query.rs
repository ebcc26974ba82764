//! Run path expressions against JSON input

use log::info;

use super::{CliError, parse_input};
use crate::evaluator::EvalOptions;
use crate::expression::CompiledExpression;
use crate::result::{ResultOptions, assemble};
use crate::value::Value;

/// Options for the query command
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// The path expression to evaluate
    pub expression: String,
    /// JSON input string
    pub input: Option<String>,
    /// Output selection, ordering and dedup
    pub result: ResultOptions,
    /// Recursive descent limit; the library default when unset
    pub max_depth: Option<usize>,
}

/// Compile only. Succeeds when the expression is syntactically valid.
pub fn execute_check(expression: &str) -> Result<(), CliError> {
    CompiledExpression::compile(expression)?;
    Ok(())
}

/// Evaluate and return the assembled output as a JSON array.
pub fn execute_query(options: &QueryOptions) -> Result<Value, CliError> {
    let expression = CompiledExpression::compile(&options.expression)?;
    let document = parse_input(options.input.as_deref())?;

    let mut eval_options = EvalOptions::default();
    if let Some(max_depth) = options.max_depth {
        eval_options = eval_options.with_max_depth(max_depth);
    }

    let nodes = expression.evaluate_with(&document, &eval_options)?;
    info!("'{}' matched {} node(s)", expression, nodes.len());
    Ok(assemble(nodes, &options.result).to_value())
}
