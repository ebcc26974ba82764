//! In-place edits of a document at normalized paths.
//!
//! Paths are snapshots. Removing an array element shifts the later
//! elements, so a batch of removals is applied in descending path order:
//! later siblings go before earlier ones and children before their parents.
//! Navigation that hits a missing member, an out-of-range index, or a value
//! of the wrong kind is a silent no-op.

use log::debug;

use crate::path::{NormalizedPath, PathElement};
use crate::value::Value;

/// The value at `path`, if it exists.
pub fn get<'a>(document: &'a Value, path: &NormalizedPath) -> Option<&'a Value> {
    let mut current = document;
    for step in path.steps() {
        current = match step {
            PathElement::Root => current,
            PathElement::Name(name) => current.get_member(name)?,
            PathElement::Index(index) => current.get_index(*index)?,
        };
    }
    Some(current)
}

pub fn get_mut<'a>(document: &'a mut Value, path: &NormalizedPath) -> Option<&'a mut Value> {
    navigate_mut(document, path.steps())
}

fn navigate_mut<'a>(document: &'a mut Value, steps: &[PathElement]) -> Option<&'a mut Value> {
    let mut current = document;
    for step in steps {
        current = match step {
            PathElement::Root => current,
            PathElement::Name(name) => current.get_member_mut(name)?,
            PathElement::Index(index) => current.get_index_mut(*index)?,
        };
    }
    Some(current)
}

/// Remove the node at `path`. The root cannot be removed.
///
/// Returns whether something was removed.
pub fn remove_at(document: &mut Value, path: &NormalizedPath) -> bool {
    let Some((last, parents)) = path.steps().split_last() else {
        return false;
    };
    let Some(parent) = navigate_mut(document, parents) else {
        return false;
    };

    match last {
        PathElement::Name(name) => parent.erase_member(name).is_some(),
        PathElement::Index(index) => parent.erase_index(*index).is_some(),
        PathElement::Root => false,
    }
}

/// Remove every node in `paths`, in descending path order, ignoring
/// duplicates. Input order does not matter.
///
/// Returns the number of nodes removed.
pub fn remove(document: &mut Value, paths: &[NormalizedPath]) -> usize {
    let mut ordered: Vec<&NormalizedPath> = paths.iter().collect();
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    ordered.dedup();

    let removed = ordered
        .into_iter()
        .filter(|path| remove_at(document, path))
        .count();
    debug!("removed {removed} of {} location(s)", paths.len());
    removed
}

/// Store `new_value` at `path`.
///
/// Without `create_if_missing` the location must already exist. With it,
/// missing members are added, arrays are padded with nulls up to the index,
/// and missing intermediate containers are created as objects or arrays
/// depending on the next step. A root path replaces the whole document.
///
/// Returns the stored value and `true`, or `(None, false)` when the path
/// could not be reached.
pub fn replace<'a>(
    document: &'a mut Value,
    path: &NormalizedPath,
    new_value: Value,
    create_if_missing: bool,
) -> (Option<&'a mut Value>, bool) {
    let Some((last, parents)) = path.steps().split_last() else {
        *document = new_value;
        return (Some(document), true);
    };

    let parent = if create_if_missing {
        navigate_or_create(document, parents, last)
    } else {
        navigate_mut(document, parents)
    };
    let Some(parent) = parent else {
        return (None, false);
    };

    match (parent, last) {
        (Value::Object(map), PathElement::Name(name)) => {
            if !create_if_missing && !map.contains_key(name) {
                return (None, false);
            }
            let slot = map.entry(name.clone()).or_insert(Value::Null);
            *slot = new_value;
            (Some(slot), true)
        }
        (Value::Array(items), PathElement::Index(index)) => {
            if *index < items.len() {
                items[*index] = new_value;
                (items.get_mut(*index), true)
            } else if create_if_missing && pad_to(items, *index) {
                items.push(new_value);
                (items.last_mut(), true)
            } else {
                (None, false)
            }
        }
        _ => (None, false),
    }
}

/// Pad `items` with nulls up to `index`, leaving room for one more push.
/// Fails without touching `items` when the array cannot grow that far.
fn pad_to(items: &mut Vec<Value>, index: usize) -> bool {
    let Some(additional) = index
        .checked_sub(items.len())
        .and_then(|gap| gap.checked_add(1))
    else {
        return false;
    };
    if let Err(e) = items.try_reserve(additional) {
        debug!("cannot pad array to index {index}: {e}");
        return false;
    }
    items.resize(index, Value::Null);
    true
}

/// Empty container suited to receive `next`.
fn container_for(next: &PathElement) -> Value {
    match next {
        PathElement::Index(_) => Value::array(),
        _ => Value::object(),
    }
}

fn navigate_or_create<'a>(
    document: &'a mut Value,
    steps: &[PathElement],
    last: &PathElement,
) -> Option<&'a mut Value> {
    let mut current = document;
    for (i, step) in steps.iter().enumerate() {
        let next = steps.get(i + 1).unwrap_or(last);
        current = match (current, step) {
            (current, PathElement::Root) => current,
            (Value::Object(map), PathElement::Name(name)) => map
                .entry(name.clone())
                .or_insert_with(|| container_for(next)),
            (Value::Array(items), PathElement::Index(index)) => {
                if *index >= items.len() {
                    if !pad_to(items, *index) {
                        return None;
                    }
                    items.push(container_for(next));
                }
                items.get_mut(*index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    fn path(text: &str) -> NormalizedPath {
        NormalizedPath::parse(text).unwrap()
    }

    #[test]
    fn get_follows_paths() {
        let d = doc(json!({"a": [10, {"b": true}]}));
        assert_eq!(get(&d, &path("$['a'][1]['b']")), Some(&Value::Boolean(true)));
        assert_eq!(get(&d, &path("$['a'][2]")), None);
        assert_eq!(get(&d, &path("$['a']['b']")), None);
        assert_eq!(get(&d, &NormalizedPath::root()), Some(&d));
    }

    #[test]
    fn remove_applies_descending_order() {
        let mut d = doc(json!({"books": ["a", "b", "c", "d"]}));
        let removed = remove(
            &mut d,
            &[path("$['books'][0]"), path("$['books'][2]"), path("$['books'][0]")],
        );
        assert_eq!(removed, 2);
        assert_eq!(d, doc(json!({"books": ["b", "d"]})));
    }

    #[test]
    fn remove_parent_and_child_together() {
        let mut d = doc(json!({"a": {"b": 1}, "c": 2}));
        let removed = remove(&mut d, &[path("$['a']"), path("$['a']['b']")]);
        assert_eq!(removed, 2);
        assert_eq!(d, doc(json!({"c": 2})));
    }

    #[test]
    fn root_is_never_removed() {
        let mut d = doc(json!({"a": 1}));
        assert!(!remove_at(&mut d, &NormalizedPath::root()));
        assert_eq!(remove(&mut d, &[NormalizedPath::root()]), 0);
        assert_eq!(d, doc(json!({"a": 1})));
    }

    #[test]
    fn replace_existing_only() {
        let mut d = doc(json!({"a": [1, 2]}));
        let (slot, ok) = replace(&mut d, &path("$['a'][1]"), Value::from("x"), false);
        assert!(ok);
        assert_eq!(slot, Some(&mut Value::from("x")));

        let (slot, ok) = replace(&mut d, &path("$['a'][5]"), Value::Null, false);
        assert!(!ok && slot.is_none());
        let (_, ok) = replace(&mut d, &path("$['missing']"), Value::Null, false);
        assert!(!ok);
        assert_eq!(d, doc(json!({"a": [1, "x"]})));
    }

    #[test]
    fn replace_creates_missing_structure() {
        let mut d = doc(json!({}));
        let (_, ok) = replace(&mut d, &path("$['a']['b'][2]['c']"), Value::Integer(1), true);
        assert!(ok);
        assert_eq!(d, doc(json!({"a": {"b": [null, null, {"c": 1}]}})));
    }

    #[test]
    fn replace_kind_mismatch_is_a_no_op() {
        let mut d = doc(json!({"a": 5}));
        let (slot, ok) = replace(&mut d, &path("$['a']['b']"), Value::Null, true);
        assert!(!ok && slot.is_none());
        let (_, ok) = replace(&mut d, &path("$['a'][0]"), Value::Null, true);
        assert!(!ok);
        assert_eq!(d, doc(json!({"a": 5})));
    }

    #[test]
    fn replace_refuses_unreachable_indices() {
        for target in ["$['a'][18446744073709551615]", "$['a'][1152921504606846976]"] {
            let mut d = doc(json!({"a": []}));
            let (slot, ok) = replace(&mut d, &path(target), Value::Integer(1), true);
            assert!(!ok && slot.is_none(), "{target}");
            assert_eq!(d, doc(json!({"a": []})));
        }

        let mut d = doc(json!({}));
        let (_, ok) = replace(&mut d, &path("$['a'][18446744073709551615]['b']"), Value::Null, true);
        assert!(!ok);
    }

    #[test]
    fn replace_root() {
        let mut d = doc(json!([1]));
        let (_, ok) = replace(&mut d, &NormalizedPath::root(), Value::from("new"), false);
        assert!(ok);
        assert_eq!(d, Value::from("new"));
    }
}
