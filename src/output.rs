//! JSON output for documents and query results.
//!
//! Serialization goes through `serde_json`, so numbers and string escapes
//! follow standard JSON rules. Object members are written in document order.
//!
//! # Examples
//!
//! ```
//! use jpq::Value;
//! use jpq::output::{to_json, to_json_pretty};
//!
//! let value = Value::parse(r#"{"b": 1, "a": [1.5]}"#).unwrap();
//! assert_eq!(to_json(&value), r#"{"b":1,"a":[1.5]}"#);
//! assert_eq!(to_json_pretty(&Value::Integer(42)), "42");
//! ```

use crate::value::Value;

/// Compact JSON text.
pub fn to_json(value: &Value) -> String {
    serde_json::Value::from(value).to_string()
}

/// JSON text with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", serde_json::Value::from(value))
}

/// Either form, chosen at runtime (the CLI's `--pretty` flag).
pub fn render(value: &Value, pretty: bool) -> String {
    if pretty {
        to_json_pretty(value)
    } else {
        to_json(value)
    }
}
