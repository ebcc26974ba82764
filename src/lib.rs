//! # jpq
//!
//! A JSONPath query engine. Expressions are compiled once into a chain of
//! selectors and evaluated against any number of documents. Every match
//! carries its normalized path (`$['store']['book'][0]`), which can be used
//! to remove or replace nodes in place.
//!
//! ```
//! use jpq::{ResultOptions, Value, query};
//!
//! let doc = Value::parse(r#"{"store": {"book": [
//!     {"title": "Sayings", "price": 8.95},
//!     {"title": "Sword", "price": 12.99}
//! ]}}"#).unwrap();
//!
//! let titles = query(&doc, "$.store.book[?(@.price < 10)].title", &ResultOptions::values())
//!     .unwrap()
//!     .into_values()
//!     .unwrap();
//! assert_eq!(titles, vec![Value::from("Sayings")]);
//! ```
pub mod ast;
pub mod cli;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod flatten;
pub mod functions;
pub mod lexer;
pub mod mutation;
pub mod node;
pub mod operand;
pub mod output;
pub mod parser;
pub mod path;
pub mod result;
pub mod value;

pub use ast::{Predicate, Selector, Token};
pub use error::{CompileError, CompileErrorKind, EvalError, EvalErrorKind, QueryError};
pub use evaluator::{DEFAULT_MAX_DEPTH, EvalOptions, Evaluator};
pub use expression::{CompiledExpression, compile, query};
pub use flatten::{FlattenError, flatten, unflatten};
pub use functions::{Builtin, Function, FunctionRegistry};
pub use lexer::Lexer;
pub use mutation::{remove, replace};
pub use node::{Node, NodeList};
pub use operand::Operand;
pub use output::{to_json, to_json_pretty};
pub use parser::Parser;
pub use path::{NormalizedPath, PathElement};
pub use result::{Output, ResultOptions, assemble};
pub use value::{Map, Value};
