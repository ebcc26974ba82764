//! Nodes and node lists: the values flowing between selectors.
//!
//! A [`Node`] pairs a value with the path where it was found. Values are
//! borrowed from the document when possible. Results synthesized by
//! functions (`length()`, `keys()`, ...) own their value and have no path.

use std::borrow::Cow;

use crate::path::{NormalizedPath, PathElement};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    value: Cow<'a, Value>,
    path: Option<NormalizedPath>,
}

impl<'a> Node<'a> {
    /// A node inside the document.
    pub fn new(value: &'a Value, path: NormalizedPath) -> Self {
        Node {
            value: Cow::Borrowed(value),
            path: Some(path),
        }
    }

    /// The document root.
    pub fn root(document: &'a Value) -> Self {
        Node::new(document, NormalizedPath::root())
    }

    /// A computed value with no location in the document.
    pub fn synthetic(value: Value) -> Self {
        Node {
            value: Cow::Owned(value),
            path: None,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn path(&self) -> Option<&NormalizedPath> {
        self.path.as_ref()
    }

    pub fn is_synthetic(&self) -> bool {
        self.path.is_none()
    }

    pub fn into_value(self) -> Value {
        self.value.into_owned()
    }

    pub fn into_parts(self) -> (Option<NormalizedPath>, Value) {
        (self.path, self.value.into_owned())
    }

    fn child(&self, element: PathElement, value: Cow<'a, Value>) -> Node<'a> {
        Node {
            value,
            path: self.path.as_ref().map(|p| p.child(element)),
        }
    }

    /// Member `name` of an object node.
    pub fn member(&self, name: &str) -> Option<Node<'a>> {
        let value = match &self.value {
            Cow::Borrowed(v) => Cow::Borrowed((*v).get_member(name)?),
            Cow::Owned(v) => Cow::Owned(v.get_member(name)?.clone()),
        };
        Some(self.child(PathElement::Name(name.to_string()), value))
    }

    /// Element `index` of an array node.
    pub fn element(&self, index: usize) -> Option<Node<'a>> {
        let value = match &self.value {
            Cow::Borrowed(v) => Cow::Borrowed((*v).get_index(index)?),
            Cow::Owned(v) => Cow::Owned(v.get_index(index)?.clone()),
        };
        Some(self.child(PathElement::Index(index), value))
    }

    /// Array elements or object member values, in document order. Scalars
    /// have no children.
    pub fn children(&self) -> Vec<Node<'a>> {
        match &self.value {
            Cow::Borrowed(v) => child_entries(*v)
                .into_iter()
                .map(|(element, child)| self.child(element, Cow::Borrowed(child)))
                .collect(),
            Cow::Owned(v) => child_entries(v)
                .into_iter()
                .map(|(element, child)| self.child(element, Cow::Owned(child.clone())))
                .collect(),
        }
    }
}

fn child_entries(value: &Value) -> Vec<(PathElement, &Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (PathElement::Index(i), item))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| (PathElement::Name(key.clone()), item))
            .collect(),
        _ => Vec::new(),
    }
}

/// Ordered sequence of nodes. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeList<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> NodeList<'a> {
    pub fn new() -> Self {
        NodeList { nodes: Vec::new() }
    }

    /// The starting list of every evaluation: just the root.
    pub fn root(document: &'a Value) -> Self {
        NodeList {
            nodes: vec![Node::root(document)],
        }
    }

    pub fn push(&mut self, node: Node<'a>) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&Node<'a>> {
        self.nodes.first()
    }

    pub fn get(&self, index: usize) -> Option<&Node<'a>> {
        self.nodes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node<'a>> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[Node<'a>] {
        &self.nodes
    }

    pub fn values(&self) -> Vec<&Value> {
        self.nodes.iter().map(Node::value).collect()
    }

    /// Paths of the addressable nodes; synthetic nodes are skipped.
    pub fn paths(&self) -> Vec<&NormalizedPath> {
        self.nodes.iter().filter_map(Node::path).collect()
    }

    pub fn into_vec(self) -> Vec<Node<'a>> {
        self.nodes
    }
}

impl<'a> From<Node<'a>> for NodeList<'a> {
    fn from(node: Node<'a>) -> Self {
        NodeList { nodes: vec![node] }
    }
}

impl<'a> From<Vec<Node<'a>>> for NodeList<'a> {
    fn from(nodes: Vec<Node<'a>>) -> Self {
        NodeList { nodes }
    }
}

impl<'a> FromIterator<Node<'a>> for NodeList<'a> {
    fn from_iter<I: IntoIterator<Item = Node<'a>>>(iter: I) -> Self {
        NodeList {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> Extend<Node<'a>> for NodeList<'a> {
    fn extend<I: IntoIterator<Item = Node<'a>>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

impl<'a> IntoIterator for NodeList<'a> {
    type Item = Node<'a>;
    type IntoIter = std::vec::IntoIter<Node<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'l, 'a> IntoIterator for &'l NodeList<'a> {
    type Item = &'l Node<'a>;
    type IntoIter = std::slice::Iter<'l, Node<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
