//! Conversion between a nested document and a flat object keyed by
//! normalized path.
//!
//! ```
//! use jpq::{Value, flatten::{flatten, unflatten}};
//!
//! let doc = Value::parse(r#"{"a": [1, {"b": null}]}"#).unwrap();
//! let flat = flatten(&doc);
//! assert_eq!(flat.to_string(), r#"{"$['a'][0]":1,"$['a'][1]['b']":null}"#);
//! assert_eq!(unflatten(&flat).unwrap(), doc);
//! ```

use thiserror::Error;

use crate::error::CompileError;
use crate::mutation::replace;
use crate::path::{NormalizedPath, PathElement};
use crate::value::{Map, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlattenError {
    #[error("expected an object of path/value pairs, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid path key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: CompileError,
    },

    #[error("path '{0}' conflicts with an earlier key")]
    Conflict(String),
}

/// Map every leaf to its normalized path. Empty arrays and objects count as
/// leaves, so they survive a round trip.
pub fn flatten(document: &Value) -> Value {
    let mut out = Map::new();
    flatten_into(&NormalizedPath::root(), document, &mut out);
    Value::Object(out)
}

fn flatten_into(path: &NormalizedPath, value: &Value, out: &mut Map) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(&path.child_index(i), item, out);
            }
        }
        Value::Object(map) if !map.is_empty() => {
            for (key, item) in map {
                flatten_into(&path.child_name(key.as_str()), item, out);
            }
        }
        leaf => {
            out.insert(path.to_string(), leaf.clone());
        }
    }
}

/// Rebuild a document from path/value pairs, creating containers as the
/// paths require.
pub fn unflatten(flat: &Value) -> Result<Value, FlattenError> {
    let Some(map) = flat.as_object() else {
        return Err(FlattenError::NotAnObject(flat.type_name()));
    };

    let mut document = Value::Null;
    for (key, leaf) in map {
        let path = NormalizedPath::parse(key).map_err(|source| FlattenError::InvalidKey {
            key: key.clone(),
            source,
        })?;

        if document.is_null() {
            document = match path.steps().first() {
                Some(PathElement::Index(_)) => Value::array(),
                Some(_) => Value::object(),
                None => leaf.clone(),
            };
            if path.is_root() {
                continue;
            }
        }

        let (_, stored) = replace(&mut document, &path, leaf.clone(), true);
        if !stored {
            return Err(FlattenError::Conflict(key.clone()));
        }
    }

    Ok(document)
}
