//! Intermediate values of predicate evaluation.

use crate::node::NodeList;
use crate::value::Value;

/// What a predicate sub-expression evaluates to.
///
/// Paths produce node lists, literals and operators produce values, and a
/// missing or mistyped operand produces `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'a> {
    Nodes(NodeList<'a>),
    Value(Value),
    Absent,
}

impl<'a> Operand<'a> {
    pub fn from_option(value: Option<Value>) -> Self {
        value.map(Operand::Value).unwrap_or(Operand::Absent)
    }

    pub fn boolean(b: bool) -> Self {
        Operand::Value(Value::Boolean(b))
    }

    /// The single value this operand stands for in a comparison.
    ///
    /// A node list counts only when it holds exactly one node.
    pub fn single(&self) -> Option<&Value> {
        match self {
            Operand::Nodes(nodes) if nodes.len() == 1 => nodes.first().map(|n| n.value()),
            Operand::Nodes(_) | Operand::Absent => None,
            Operand::Value(value) => Some(value),
        }
    }

    /// Filter truth: `true`, or a non-empty node list. Every other value,
    /// including a non-empty string or a non-zero number, is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Operand::Nodes(nodes) => !nodes.is_empty(),
            Operand::Value(value) => matches!(value, Value::Boolean(true)),
            Operand::Absent => false,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Operand::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn truthiness() {
        let doc = Value::Boolean(false);
        assert!(Operand::Nodes(NodeList::root(&doc)).is_truthy());
        assert!(!Operand::Nodes(NodeList::new()).is_truthy());
        assert!(Operand::boolean(true).is_truthy());
        assert!(!Operand::Value(Value::Integer(1)).is_truthy());
        assert!(!Operand::Value(Value::from("yes")).is_truthy());
        assert!(!Operand::Absent.is_truthy());
    }

    #[test]
    fn single_requires_exactly_one_node() {
        let doc = Value::Integer(5);
        let one = Operand::Nodes(NodeList::root(&doc));
        assert_eq!(one.single(), Some(&Value::Integer(5)));

        let two = Operand::Nodes(NodeList::from(vec![Node::root(&doc), Node::root(&doc)]));
        assert_eq!(two.single(), None);
        assert_eq!(Operand::Nodes(NodeList::new()).single(), None);
    }
}
