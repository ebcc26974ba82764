use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

/// Insertion-ordered object members.
pub type Map = IndexMap<String, Value>;

/// A JSON document node.
///
/// Integers and floats are kept apart so that values read from a document are
/// written back unchanged; comparisons inside filters treat them as one
/// numeric type (`1 == 1.0`).
///
/// Objects preserve member insertion order, which is the order wildcards and
/// recursive descent visit them in.
///
/// # Examples
///
/// ```
/// use jpq::Value;
///
/// let doc = Value::parse(r#"{"a": [1, 2.5, "x"]}"#).unwrap();
/// let a = doc.get_member("a").unwrap();
/// assert!(a.is_array());
/// assert_eq!(a.get_index(0), Some(&Value::Integer(1)));
/// assert_eq!(a.get_index(1).and_then(Value::as_number), Some(2.5));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Object with insertion-ordered members
    Object(Map),
}

impl Value {
    pub fn object() -> Self {
        Value::Object(Map::new())
    }

    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    // Type tests

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // Read access

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Object member by name. `None` for missing members and non-objects.
    pub fn get_member(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(name))
    }

    pub fn get_member_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.as_object_mut().and_then(|map| map.get_mut(name))
    }

    /// Array element by index. `None` when out of range or not an array.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|arr| arr.get(index))
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.as_array_mut().and_then(|arr| arr.get_mut(index))
    }

    /// Object members in insertion order; empty for anything else.
    pub fn members(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.as_object().into_iter().flat_map(|map| map.iter())
    }

    /// Array elements in order; empty for anything else.
    pub fn elements(&self) -> impl Iterator<Item = &Value> {
        self.as_array().into_iter().flat_map(|arr| arr.iter())
    }

    /// Number of members or elements. Scalars have no children.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(arr) => arr.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Write access

    /// Remove an object member, keeping the order of the remaining ones.
    pub fn erase_member(&mut self, name: &str) -> Option<Value> {
        self.as_object_mut().and_then(|map| map.shift_remove(name))
    }

    /// Remove an array element, shifting later elements down.
    pub fn erase_index(&mut self, index: usize) -> Option<Value> {
        match self {
            Value::Array(arr) if index < arr.len() => Some(arr.remove(index)),
            _ => None,
        }
    }

    /// Insert or overwrite an object member. `None` if this is not an object.
    pub fn set_member(&mut self, name: &str, value: Value) -> Option<&mut Value> {
        let map = self.as_object_mut()?;
        let slot = map.entry(name.to_string()).or_insert(Value::Null);
        *slot = value;
        Some(slot)
    }

    /// Overwrite an existing array element. `None` if out of range.
    pub fn set_index(&mut self, index: usize, value: Value) -> Option<&mut Value> {
        let slot = self.get_index_mut(index)?;
        *slot = value;
        Some(slot)
    }

    /// Append to an array. `None` if this is not an array.
    pub fn push_back(&mut self, value: Value) -> Option<&mut Value> {
        let arr = self.as_array_mut()?;
        arr.push(value);
        arr.last_mut()
    }

    // Scalar extraction

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they have no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Deep equality where integers and floats compare numerically.
    pub fn equivalent(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_number() == b.as_number(),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.equivalent(w)))
            }
            (a, b) => a == b,
        }
    }

    /// Ordering for number/number and string/string pairs only.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                a.as_number()?.partial_cmp(&b.as_number()?)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&crate::output::to_json_pretty(self))
        } else {
            f.write_str(&crate::output::to_json(self))
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n)
            .map(Value::Integer)
            .unwrap_or(Value::Float(n as f64))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}
