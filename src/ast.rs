//! # Path Expression Syntax Tree
//!
//! A compiled expression is a list of [`Selector`]s applied left to right,
//! starting from a node list that holds only the document root. Filter and
//! computed-index selectors embed a [`Predicate`] tree.
//!
//! ## Submodules
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[selectors]** - Path stages (names, indices, slices, wildcards, unions, filters)
//! - **[predicates]** - Filter expressions (comparisons, logic, arithmetic, calls)
//! - **[operators]** - Comparison and arithmetic operators
//!
//! ## Grammar
//!
//! ```text
//! path       := '$' segment*
//! segment    := '.' (name | '*' | integer | name '(' args ')')
//!             | '..' (name | '*')?
//!             | '[' item (',' item)* ']'
//! item       := quoted | name | '*' | index | slice | '?' predicate
//!             | '(' predicate ')' | '@' segment*
//! slice      := int? ':' int? (':' int?)?
//!
//! predicate  := or
//! or         := and ('||' and)*
//! and        := compare ('&&' compare)*
//! compare    := additive (('==' | '!=' | '<' | '<=' | '>' | '>=') additive
//!                         | '=~' regex)?
//! additive   := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/' | '%') unary)*
//! unary      := ('!' | '-') unary | primary
//! primary    := literal | '@' segment* | '$' segment* | '(' predicate ')'
//!             | name '(' args ')'
//! ```
//!
//! ## Examples
//!
//! ```text
//! $.store.book[?(@.price < 10)].title
//! $..book[-1:]
//! $['store']['book'][0,2]
//! $.books[?(@.author =~ /tolkien/i)]
//! $.store.book.length()
//! ```
pub mod operators;
pub mod predicates;
pub mod selectors;
pub mod tokens;

pub use operators::{ArithOp, CompareOp};
pub use predicates::{Predicate, RegexPattern};
pub use selectors::{Selector, Slice};
pub use tokens::Token;
