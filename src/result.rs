//! Turning an evaluated node list into the caller's requested output.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::node::{Node, NodeList};
use crate::path::NormalizedPath;
use crate::value::{Map, Value};

/// Output selection and post-processing.
///
/// With neither `want_value` nor `want_path` set, values are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultOptions {
    pub want_value: bool,
    pub want_path: bool,
    /// Keep only the first node for each path.
    pub dedup: bool,
    /// Order by path, ascending.
    pub sort: bool,
    /// Order by path, descending. Wins over `sort`.
    pub sort_descending: bool,
}

impl ResultOptions {
    pub fn values() -> Self {
        ResultOptions {
            want_value: true,
            ..Default::default()
        }
    }

    pub fn paths() -> Self {
        ResultOptions {
            want_path: true,
            ..Default::default()
        }
    }

    pub fn pairs() -> Self {
        ResultOptions {
            want_value: true,
            want_path: true,
            ..Default::default()
        }
    }

    pub fn with_dedup(mut self) -> Self {
        self.dedup = true;
        self
    }

    pub fn with_sort(mut self) -> Self {
        self.sort = true;
        self
    }

    pub fn with_sort_descending(mut self) -> Self {
        self.sort_descending = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Values(Vec<Value>),
    /// Addressable nodes only.
    Paths(Vec<NormalizedPath>),
    Pairs(Vec<(Option<NormalizedPath>, Value)>),
}

impl Output {
    pub fn len(&self) -> usize {
        match self {
            Output::Values(values) => values.len(),
            Output::Paths(paths) => paths.len(),
            Output::Pairs(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            Output::Values(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_paths(self) -> Option<Vec<NormalizedPath>> {
        match self {
            Output::Paths(paths) => Some(paths),
            _ => None,
        }
    }

    /// JSON form: an array of values, of path strings, or of
    /// `{"path": ..., "value": ...}` objects (`path` is null for computed
    /// values).
    pub fn to_value(&self) -> Value {
        match self {
            Output::Values(values) => Value::Array(values.clone()),
            Output::Paths(paths) => {
                Value::Array(paths.iter().map(|p| Value::String(p.to_string())).collect())
            }
            Output::Pairs(pairs) => Value::Array(
                pairs
                    .iter()
                    .map(|(path, value)| {
                        let mut entry = Map::new();
                        entry.insert(
                            "path".to_string(),
                            path.as_ref()
                                .map(|p| Value::String(p.to_string()))
                                .unwrap_or(Value::Null),
                        );
                        entry.insert("value".to_string(), value.clone());
                        Value::Object(entry)
                    })
                    .collect(),
            ),
        }
    }
}

/// Apply ordering and deduplication, then project to the requested output.
pub fn assemble(nodes: NodeList<'_>, options: &ResultOptions) -> Output {
    let nodes = arrange(nodes, options);

    match (options.want_value, options.want_path) {
        (true, true) => Output::Pairs(nodes.into_iter().map(Node::into_parts).collect()),
        (false, true) => Output::Paths(
            nodes
                .into_iter()
                .filter_map(|n| n.into_parts().0)
                .collect(),
        ),
        _ => Output::Values(nodes.into_iter().map(Node::into_value).collect()),
    }
}

/// Sort (stable) and then dedup by path, as requested.
///
/// Synthetic nodes rank above every path: last when ascending, first when
/// descending. They are never removed as duplicates.
pub fn arrange<'a>(nodes: NodeList<'a>, options: &ResultOptions) -> NodeList<'a> {
    let mut nodes = nodes.into_vec();

    if options.sort || options.sort_descending {
        nodes.sort_by(|a, b| {
            let ascending = match (a.path(), b.path()) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if options.sort_descending {
                ascending.reverse()
            } else {
                ascending
            }
        });
    }

    if options.dedup {
        let mut seen = HashSet::new();
        nodes.retain(|node| match node.path() {
            Some(path) => seen.insert(path.clone()),
            None => true,
        });
    }

    NodeList::from(nodes)
}
