//! JSON text and `serde_json::Value` <-> [`Value`] conversion.

use crate::Value;

impl Value {
    /// Parse JSON text into a document. Member order is preserved.
    pub fn parse(text: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>(text).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            // NaN and infinities have no JSON spelling
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        serde_json::Value::from(&v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_integer_float_distinction() {
        let doc = Value::parse(r#"{"i": 3, "f": 3.0, "big": 18446744073709551615}"#).unwrap();
        assert_eq!(doc.get_member("i"), Some(&Value::Integer(3)));
        assert_eq!(doc.get_member("f"), Some(&Value::Float(3.0)));
        assert!(matches!(doc.get_member("big"), Some(Value::Float(_))));
    }

    #[test]
    fn back_to_serde_preserves_order() {
        let source = json!({"z": 1, "a": [true, null, "s"]});
        let doc = Value::from(source.clone());
        assert_eq!(serde_json::Value::from(&doc), source);
        assert_eq!(serde_json::Value::from(Value::Float(f64::NAN)), json!(null));
    }
}
