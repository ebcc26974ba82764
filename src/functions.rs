//! Functions callable from filters (`length(@.tags)`) and as selectors
//! (`$.tags.length()`).
//!
//! Every built-in has a fixed arity, checked when the expression is
//! compiled. At evaluation time an absent argument makes the result absent,
//! and an argument of the wrong type raises
//! [`EvalErrorKind::InvalidArgument`](crate::error::EvalErrorKind), which
//! only excludes the filter candidate being tested.
//!
//! Callers can add their own functions through a [`FunctionRegistry`]
//! passed to [`CompiledExpression::compile_with`](crate::CompiledExpression::compile_with).
//! Names are resolved at compile time, built-ins first.
//!
//! ```
//! use jpq::{CompiledExpression, Value};
//! use jpq::functions::FunctionRegistry;
//!
//! let mut functions = FunctionRegistry::new();
//! functions.register("double", Some(1), |args| {
//!     Ok(match args[0].single() {
//!         Some(Value::Integer(n)) => Value::Integer(n * 2),
//!         _ => Value::Null,
//!     })
//! });
//!
//! let doc = Value::parse(r#"{"n": [1, 4]}"#).unwrap();
//! let expr = CompiledExpression::compile_with("$.n[?(double(@) > 4)]", &functions).unwrap();
//! assert_eq!(expr.select_values(&doc).unwrap(), vec![Value::Integer(4)]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::error::EvalError;
use crate::operand::Operand;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Numeric
    Abs,
    Ceil,
    Floor,
    ToNumber,
    // Aggregates over an array or node list
    Sum,
    Prod,
    Avg,
    Min,
    Max,
    // Structure
    Length,
    Count,
    Keys,
    Values,
    // Strings
    Contains,
    StartsWith,
    EndsWith,
    Tokenize,
}

impl Builtin {
    pub const ALL: [Builtin; 17] = [
        Builtin::Abs,
        Builtin::Ceil,
        Builtin::Floor,
        Builtin::ToNumber,
        Builtin::Sum,
        Builtin::Prod,
        Builtin::Avg,
        Builtin::Min,
        Builtin::Max,
        Builtin::Length,
        Builtin::Count,
        Builtin::Keys,
        Builtin::Values,
        Builtin::Contains,
        Builtin::StartsWith,
        Builtin::EndsWith,
        Builtin::Tokenize,
    ];

    pub fn lookup(name: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::Ceil => "ceil",
            Builtin::Floor => "floor",
            Builtin::ToNumber => "to_number",
            Builtin::Sum => "sum",
            Builtin::Prod => "prod",
            Builtin::Avg => "avg",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Length => "length",
            Builtin::Count => "count",
            Builtin::Keys => "keys",
            Builtin::Values => "values",
            Builtin::Contains => "contains",
            Builtin::StartsWith => "starts_with",
            Builtin::EndsWith => "ends_with",
            Builtin::Tokenize => "tokenize",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Contains | Builtin::StartsWith | Builtin::EndsWith | Builtin::Tokenize => 2,
            _ => 1,
        }
    }

    /// Call with already evaluated arguments. The caller guarantees
    /// `args.len() == self.arity()`.
    pub fn call<'a>(self, args: &[Operand<'a>]) -> Result<Operand<'a>, EvalError> {
        if args.len() != self.arity() {
            return Err(EvalError::invalid_argument(
                self.name(),
                format!("expected {} argument(s), got {}", self.arity(), args.len()),
            ));
        }

        match self {
            Builtin::Abs => self.numeric(&args[0], |n| match n {
                Value::Integer(i) => i.checked_abs().map(Value::Integer),
                Value::Float(f) => Some(Value::Float(f.abs())),
                _ => None,
            }),
            Builtin::Ceil => self.numeric(&args[0], |n| match n {
                Value::Integer(i) => Some(Value::Integer(*i)),
                Value::Float(f) => Some(Value::Float(f.ceil())),
                _ => None,
            }),
            Builtin::Floor => self.numeric(&args[0], |n| match n {
                Value::Integer(i) => Some(Value::Integer(*i)),
                Value::Float(f) => Some(Value::Float(f.floor())),
                _ => None,
            }),
            Builtin::ToNumber => self.to_number(&args[0]),
            Builtin::Sum => self.sum(&args[0]),
            Builtin::Prod => self.prod(&args[0]),
            Builtin::Avg => self.avg(&args[0]),
            Builtin::Min => self.extreme(&args[0], Ordering::Less),
            Builtin::Max => self.extreme(&args[0], Ordering::Greater),
            Builtin::Length => self.length(&args[0]),
            Builtin::Count => Ok(Operand::Value(Value::from(count(&args[0])))),
            Builtin::Keys => self.keys(&args[0]),
            Builtin::Values => self.values(&args[0]),
            Builtin::Contains => self.contains(&args[0], &args[1]),
            Builtin::StartsWith => self.affix(&args[0], &args[1], |s, p| s.starts_with(p)),
            Builtin::EndsWith => self.affix(&args[0], &args[1], |s, p| s.ends_with(p)),
            Builtin::Tokenize => self.tokenize(&args[0], &args[1]),
        }
    }

    fn type_error(self, expected: &str, found: &Value) -> EvalError {
        EvalError::invalid_argument(
            self.name(),
            format!("{}() requires {}, got {}", self.name(), expected, found.type_name()),
        )
    }

    fn numeric<'a>(
        self,
        arg: &Operand<'a>,
        f: impl Fn(&Value) -> Option<Value>,
    ) -> Result<Operand<'a>, EvalError> {
        match arg.single() {
            None => Ok(Operand::Absent),
            Some(v) if v.is_number() => Ok(Operand::from_option(f(v))),
            Some(v) => Err(self.type_error("a number", v)),
        }
    }

    /// Numbers pass through; numeric strings are parsed; other strings are
    /// absent.
    fn to_number<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        match arg.single() {
            None => Ok(Operand::Absent),
            Some(v @ (Value::Integer(_) | Value::Float(_))) => Ok(Operand::Value(v.clone())),
            Some(Value::String(s)) => {
                let s = s.trim();
                let parsed = s
                    .parse::<i64>()
                    .map(Value::Integer)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float));
                Ok(Operand::from_option(parsed))
            }
            Some(v) => Err(self.type_error("a number or string", v)),
        }
    }

    /// The items an aggregate works on: the elements of a single array, or
    /// the values of a node list.
    fn items<'o>(self, arg: &'o Operand<'_>) -> Result<Option<Vec<&'o Value>>, EvalError> {
        match arg {
            Operand::Absent => Ok(None),
            Operand::Value(Value::Array(items)) => Ok(Some(items.iter().collect())),
            Operand::Value(v) => Err(self.type_error("an array", v)),
            Operand::Nodes(nodes) => match nodes.as_slice() {
                [single] => match single.value() {
                    Value::Array(items) => Ok(Some(items.iter().collect())),
                    v => Err(self.type_error("an array", v)),
                },
                many => Ok(Some(many.iter().map(|n| n.value()).collect())),
            },
        }
    }

    fn numbers<'o>(self, arg: &'o Operand<'_>) -> Result<Option<Vec<&'o Value>>, EvalError> {
        let Some(items) = self.items(arg)? else {
            return Ok(None);
        };
        if let Some(bad) = items.iter().find(|v| !v.is_number()) {
            return Err(self.type_error("numeric values", bad));
        }
        Ok(Some(items))
    }

    fn sum<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        let Some(items) = self.numbers(arg)? else {
            return Ok(Operand::Absent);
        };

        let mut sum_int: i64 = 0;
        let mut sum_float: f64 = 0.0;
        let mut has_float = false;

        for item in items {
            match item {
                Value::Integer(n) if !has_float => match sum_int.checked_add(*n) {
                    Some(s) => sum_int = s,
                    None => {
                        sum_float = sum_int as f64 + *n as f64;
                        has_float = true;
                    }
                },
                _ => {
                    if !has_float {
                        sum_float = sum_int as f64;
                        has_float = true;
                    }
                    sum_float += item.as_number().unwrap_or(0.0);
                }
            }
        }

        Ok(Operand::Value(if has_float {
            Value::Float(sum_float)
        } else {
            Value::Integer(sum_int)
        }))
    }

    fn prod<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        let Some(items) = self.numbers(arg)? else {
            return Ok(Operand::Absent);
        };
        if items.is_empty() {
            return Ok(Operand::Absent);
        }

        let mut prod_int: Option<i64> = Some(1);
        let mut prod_float: f64 = 1.0;
        for item in &items {
            prod_int = match (prod_int, item) {
                (Some(p), Value::Integer(n)) => p.checked_mul(*n),
                _ => None,
            };
            prod_float *= item.as_number().unwrap_or(1.0);
        }

        Ok(Operand::Value(match prod_int {
            Some(p) => Value::Integer(p),
            None => Value::Float(prod_float),
        }))
    }

    fn avg<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        let Some(items) = self.numbers(arg)? else {
            return Ok(Operand::Absent);
        };
        if items.is_empty() {
            return Ok(Operand::Absent);
        }

        let sum: f64 = items.iter().filter_map(|v| v.as_number()).sum();
        Ok(Operand::Value(Value::Float(sum / items.len() as f64)))
    }

    /// Smallest (`Less`) or largest (`Greater`) item. Items must be all
    /// numbers or all strings.
    fn extreme<'a>(self, arg: &Operand<'a>, wanted: Ordering) -> Result<Operand<'a>, EvalError> {
        let Some(items) = self.items(arg)? else {
            return Ok(Operand::Absent);
        };

        let mut best: Option<&Value> = None;
        for item in items {
            if !item.is_number() && !item.is_string() {
                return Err(self.type_error("numbers or strings", item));
            }
            best = match best {
                None => Some(item),
                Some(current) => match item.partial_compare(current) {
                    Some(order) if order == wanted => Some(item),
                    Some(_) => Some(current),
                    None => return Err(self.type_error("values of one type", item)),
                },
            };
        }

        Ok(Operand::from_option(best.cloned()))
    }

    fn length<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        match arg.single() {
            None => Ok(Operand::Absent),
            Some(Value::String(s)) => Ok(Operand::Value(Value::from(s.chars().count()))),
            Some(v @ (Value::Array(_) | Value::Object(_))) => {
                Ok(Operand::Value(Value::from(v.len())))
            }
            Some(v) => Err(self.type_error("an array, object or string", v)),
        }
    }

    fn keys<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        match arg.single() {
            None => Ok(Operand::Absent),
            Some(Value::Object(map)) => Ok(Operand::Value(Value::Array(
                map.keys().map(|k| Value::String(k.clone())).collect(),
            ))),
            Some(v) => Err(self.type_error("an object", v)),
        }
    }

    fn values<'a>(self, arg: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        match arg.single() {
            None => Ok(Operand::Absent),
            Some(Value::Object(map)) => {
                Ok(Operand::Value(Value::Array(map.values().cloned().collect())))
            }
            Some(v) => Err(self.type_error("an object", v)),
        }
    }

    /// Substring test for strings, membership test for arrays.
    fn contains<'a>(self, haystack: &Operand<'a>, needle: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        let (Some(haystack), Some(needle)) = (haystack.single(), needle.single()) else {
            return Ok(Operand::Absent);
        };
        match (haystack, needle) {
            (Value::Array(items), needle) => {
                Ok(Operand::boolean(items.iter().any(|v| v.equivalent(needle))))
            }
            (Value::String(s), Value::String(part)) => Ok(Operand::boolean(s.contains(part.as_str()))),
            (Value::String(_), other) => Err(self.type_error("a string to search for", other)),
            (other, _) => Err(self.type_error("an array or string", other)),
        }
    }

    fn affix<'a>(
        self,
        text: &Operand<'a>,
        affix: &Operand<'a>,
        test: impl Fn(&str, &str) -> bool,
    ) -> Result<Operand<'a>, EvalError> {
        let (Some(text), Some(affix)) = (text.single(), affix.single()) else {
            return Ok(Operand::Absent);
        };
        match (text, affix) {
            (Value::String(s), Value::String(a)) => Ok(Operand::boolean(test(s, a))),
            (Value::String(_), other) | (other, _) => Err(self.type_error("strings", other)),
        }
    }

    /// Split a string on every match of a regex.
    fn tokenize<'a>(self, text: &Operand<'a>, pattern: &Operand<'a>) -> Result<Operand<'a>, EvalError> {
        let (Some(text), Some(pattern)) = (text.single(), pattern.single()) else {
            return Ok(Operand::Absent);
        };
        let (Value::String(s), Value::String(p)) = (text, pattern) else {
            let other = if text.is_string() { pattern } else { text };
            return Err(self.type_error("strings", other));
        };

        let regex = Regex::new(p).map_err(|e| {
            EvalError::invalid_argument(self.name(), format!("invalid pattern: {e}"))
        })?;
        Ok(Operand::Value(Value::Array(
            regex.split(s).map(Value::from).collect(),
        )))
    }
}

/// Node count of a list; a single value counts as one.
fn count(arg: &Operand<'_>) -> usize {
    match arg {
        Operand::Nodes(nodes) => nodes.len(),
        Operand::Value(_) => 1,
        Operand::Absent => 0,
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Body of a caller-supplied function. Node-list arguments are passed as
/// node lists; the result is always a plain value.
pub type CustomFn = dyn Fn(&[Operand<'_>]) -> Result<Value, EvalError> + Send + Sync;

/// A function registered by the caller.
#[derive(Clone)]
pub struct CustomFunction {
    name: String,
    /// `None` accepts any number of arguments.
    arity: Option<usize>,
    body: Arc<CustomFn>,
}

impl CustomFunction {
    pub fn new<F>(name: impl Into<String>, arity: Option<usize>, body: F) -> Self
    where
        F: Fn(&[Operand<'_>]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        CustomFunction {
            name: name.into(),
            arity,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn call<'a>(&self, args: &[Operand<'a>]) -> Result<Operand<'a>, EvalError> {
        if let Some(arity) = self.arity
            && args.len() != arity
        {
            return Err(EvalError::invalid_argument(
                &self.name,
                format!("expected {arity} argument(s), got {}", args.len()),
            ));
        }
        (self.body)(args).map(Operand::Value)
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Same name, same arity and the same registered body.
impl PartialEq for CustomFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity && Arc::ptr_eq(&self.body, &other.body)
    }
}

/// Caller-supplied functions, looked up by name when an expression is
/// compiled.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, CustomFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry::default()
    }

    /// Add or overwrite `name`. A built-in of the same name still takes
    /// precedence.
    pub fn register<F>(&mut self, name: impl Into<String>, arity: Option<usize>, body: F) -> &mut Self
    where
        F: Fn(&[Operand<'_>]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let function = CustomFunction::new(name, arity, body);
        if Builtin::lookup(function.name()).is_some() {
            debug!("function '{}' is shadowed by the built-in", function.name());
        }
        self.functions.insert(function.name.clone(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CustomFunction> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Built-ins first, then registered functions.
    pub fn resolve(&self, name: &str) -> Option<Function> {
        Builtin::lookup(name)
            .map(Function::Builtin)
            .or_else(|| self.get(name).cloned().map(Function::Custom))
    }
}

/// A function reference in a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Builtin(Builtin),
    Custom(CustomFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Builtin(builtin) => builtin.name(),
            Function::Custom(custom) => custom.name(),
        }
    }

    /// Number of arguments including the implicit node of the selector
    /// form, or `None` for any number.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Function::Builtin(builtin) => Some(builtin.arity()),
            Function::Custom(custom) => custom.arity(),
        }
    }

    pub fn call<'a>(&self, args: &[Operand<'a>]) -> Result<Operand<'a>, EvalError> {
        match self {
            Function::Builtin(builtin) => builtin.call(args),
            Function::Custom(custom) => custom.call(args),
        }
    }
}

impl From<Builtin> for Function {
    fn from(builtin: Builtin) -> Self {
        Function::Builtin(builtin)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
