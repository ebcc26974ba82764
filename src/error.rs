//! Error types for compiling and evaluating path expressions.
//!
//! Compilation errors are always fatal and carry the character offset where
//! the problem was found. Evaluation errors are rare: a path that matches
//! nothing is an empty result, not an error. Only resource limits and bad
//! function arguments surface as [`EvalError`].

use thiserror::Error;

use crate::path::NormalizedPath;

/// What went wrong while compiling an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: &'static str },

    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated regular expression")]
    UnterminatedRegex,

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("unbalanced '{0}'")]
    UnbalancedBracket(char),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("slice step cannot be zero")]
    ZeroSliceStep,

    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// A failed compilation. No partial expression is ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {offset}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// 0-based character offset into the expression text.
    pub offset: usize,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, offset: usize) -> Self {
        CompileError { kind, offset }
    }

    /// The error description without the offset suffix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// What went wrong while evaluating a compiled expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    /// Recursive descent went deeper than the configured limit.
    #[error("maximum recursion depth of {limit} exceeded")]
    MaxDepthExceeded { limit: usize },

    /// A function was called with an argument of the wrong type.
    #[error("invalid argument to '{function}': {message}")]
    InvalidArgument { function: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{}", .path.as_ref().map(|p| format!(" at {p}")).unwrap_or_default())]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Location of the node being processed when the error was raised.
    pub path: Option<NormalizedPath>,
}

impl EvalError {
    pub fn max_depth(limit: usize, path: Option<NormalizedPath>) -> Self {
        EvalError {
            kind: EvalErrorKind::MaxDepthExceeded { limit },
            path,
        }
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError {
            kind: EvalErrorKind::InvalidArgument {
                function: function.to_string(),
                message: message.into(),
            },
            path: None,
        }
    }

    /// Attach a location if none has been recorded yet.
    pub fn at(mut self, path: Option<&NormalizedPath>) -> Self {
        if self.path.is_none() {
            self.path = path.cloned();
        }
        self
    }

    /// Argument errors only exclude the current filter candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, EvalErrorKind::InvalidArgument { .. })
    }
}

/// Either failure of a one-shot [`query`](crate::query).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_reports_offset() {
        let err = CompileError::new(CompileErrorKind::UnterminatedString, 4);
        assert_eq!(err.to_string(), "unterminated string literal at offset 4");
        assert_eq!(err.message(), "unterminated string literal");
    }

    #[test]
    fn eval_error_location_suffix() {
        let err = EvalError::max_depth(3, None);
        assert_eq!(err.to_string(), "maximum recursion depth of 3 exceeded");

        let err = EvalError::invalid_argument("abs", "expected a number")
            .at(Some(&NormalizedPath::root().child_name("a")));
        assert_eq!(
            err.to_string(),
            "invalid argument to 'abs': expected a number at $['a']"
        );
        assert!(err.is_recoverable());
    }
}
