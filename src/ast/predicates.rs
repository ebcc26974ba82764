use std::fmt;

use regex::Regex;

use super::operators::{ArithOp, CompareOp};
use super::selectors::{Selector, fmt_chain};
use crate::functions::Function;
use crate::value::Value;

/// Expression tree evaluated against one filter candidate.
///
/// `@` is the candidate, `$` the document root.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    // Literals
    Literal(Value),

    // References
    /// `@`
    CurrentNode,
    /// `$`
    RootNode,
    /// `@.a.b` (the chain after `@`)
    RelativePath(Vec<Selector>),
    /// `$.a.b` (the chain after `$`)
    AbsolutePath(Vec<Selector>),

    // Operators
    Compare {
        op: CompareOp,
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Arithmetic {
        op: ArithOp,
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    /// Unary minus
    Negate(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),

    /// `operand =~ /pattern/flags`
    Matches {
        operand: Box<Predicate>,
        pattern: RegexPattern,
    },

    FunctionCall {
        function: Function,
        args: Vec<Predicate>,
    },
}

/// A regex compiled at parse time. Two patterns are equal when their source
/// text and flags are.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl RegexPattern {
    pub(crate) fn new(source: String, flags: String, regex: Regex) -> Self {
        RegexPattern {
            source,
            flags,
            regex,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Unanchored search, like `Regex::is_match`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Display for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source.replace('/', "\\/"), self.flags)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(value) => write!(f, "{value}"),
            Predicate::CurrentNode => f.write_str("@"),
            Predicate::RootNode => f.write_str("$"),
            Predicate::RelativePath(chain) => {
                f.write_str("@")?;
                fmt_chain(f, chain)
            }
            Predicate::AbsolutePath(chain) => {
                f.write_str("$")?;
                fmt_chain(f, chain)
            }
            Predicate::Compare { op, left, right } => write!(f, "{left} {op} {right}"),
            Predicate::Arithmetic { op, left, right } => write!(f, "({left} {op} {right})"),
            Predicate::Negate(operand) => write!(f, "-{operand}"),
            Predicate::And(left, right) => write!(f, "({left} && {right})"),
            Predicate::Or(left, right) => write!(f, "({left} || {right})"),
            Predicate::Not(operand) => write!(f, "!{operand}"),
            Predicate::Matches { operand, pattern } => write!(f, "{operand} =~ {pattern}"),
            Predicate::FunctionCall { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
