//! Compiled expressions: compile once, evaluate against many documents.
//!
//! ```
//! use jpq::{CompiledExpression, Value};
//!
//! let doc = Value::parse(r#"{"books": [{"price": 8}, {"price": 22}]}"#).unwrap();
//! let cheap = CompiledExpression::compile("$.books[?(@.price < 10)]").unwrap();
//!
//! let paths = cheap.select_paths(&doc).unwrap();
//! assert_eq!(paths[0].to_string(), "$['books'][0]");
//! ```

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::ast::Selector;
use crate::error::{CompileError, EvalError, QueryError};
use crate::evaluator::{EvalOptions, Evaluator};
use crate::functions::FunctionRegistry;
use crate::mutation;
use crate::node::NodeList;
use crate::parser;
use crate::path::NormalizedPath;
use crate::result::{Output, ResultOptions, assemble};
use crate::value::Value;

/// An immutable, reusable selector chain together with its source text.
///
/// Safe to share between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    text: String,
    selectors: Vec<Selector>,
}

impl CompiledExpression {
    pub fn compile(text: &str) -> Result<Self, CompileError> {
        CompiledExpression::compile_with(text, &FunctionRegistry::default())
    }

    /// Compile with caller-supplied functions available by name next to the
    /// built-ins.
    pub fn compile_with(text: &str, functions: &FunctionRegistry) -> Result<Self, CompileError> {
        let selectors = parser::parse_with(text, functions)?;
        debug!("compiled '{text}' into {} selector(s)", selectors.len());
        Ok(CompiledExpression {
            text: text.to_string(),
            selectors,
        })
    }

    /// The text this expression was compiled from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn evaluate<'a>(&self, document: &'a Value) -> Result<NodeList<'a>, EvalError> {
        self.evaluate_with(document, &EvalOptions::default())
    }

    pub fn evaluate_with<'a>(
        &self,
        document: &'a Value,
        options: &EvalOptions,
    ) -> Result<NodeList<'a>, EvalError> {
        Evaluator::with_options(*options).evaluate(&self.selectors, document)
    }

    /// Evaluate and assemble in one step.
    pub fn select(&self, document: &Value, options: &ResultOptions) -> Result<Output, EvalError> {
        Ok(assemble(self.evaluate(document)?, options))
    }

    /// Matched values in evaluation order.
    pub fn select_values(&self, document: &Value) -> Result<Vec<Value>, EvalError> {
        let nodes = self.evaluate(document)?;
        Ok(nodes.into_iter().map(|n| n.into_value()).collect())
    }

    /// Distinct paths of the addressable matches, in ascending order.
    pub fn select_paths(&self, document: &Value) -> Result<Vec<NormalizedPath>, EvalError> {
        let options = ResultOptions::paths().with_sort().with_dedup();
        Ok(assemble(self.evaluate(document)?, &options)
            .into_paths()
            .unwrap_or_default())
    }

    /// Remove every matched node. Returns the number removed.
    pub fn remove(&self, document: &mut Value) -> Result<usize, EvalError> {
        let paths = self.select_paths(document)?;
        Ok(mutation::remove(document, &paths))
    }

    /// Overwrite every matched node with a copy of `new_value`. Returns the
    /// number replaced.
    pub fn replace_all(&self, document: &mut Value, new_value: &Value) -> Result<usize, EvalError> {
        self.update(document, |_, slot| *slot = new_value.clone())
    }

    /// Call `f` on every matched node, deepest and last first, so that
    /// nested matches are visited before their ancestors. Returns the number
    /// of nodes visited.
    pub fn update<F>(&self, document: &mut Value, mut f: F) -> Result<usize, EvalError>
    where
        F: FnMut(&NormalizedPath, &mut Value),
    {
        let mut paths = self.select_paths(document)?;
        paths.reverse();

        let mut visited = 0;
        for path in &paths {
            if let Some(slot) = mutation::get_mut(document, path) {
                f(path, slot);
                visited += 1;
            }
        }
        debug!("updated {visited} node(s) matching '{}'", self.text);
        Ok(visited)
    }
}

impl FromStr for CompiledExpression {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompiledExpression::compile(s)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn compile(text: &str) -> Result<CompiledExpression, CompileError> {
    CompiledExpression::compile(text)
}

/// Compile and evaluate in one call.
pub fn query(document: &Value, text: &str, options: &ResultOptions) -> Result<Output, QueryError> {
    Ok(compile(text)?.select(document, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn compiled_expressions_are_shareable() {
        assert_send_sync::<CompiledExpression>();
    }

    #[test]
    fn display_is_source_text() {
        let expr: CompiledExpression = "$..book[ 0 ]".parse().unwrap();
        assert_eq!(expr.to_string(), "$..book[ 0 ]");
        assert_eq!(expr.selectors().len(), 3);
    }
}
