use crate::{
    ast::{ArithOp, CompareOp, Predicate, Selector},
    error::EvalError,
    functions::{Builtin, Function},
    node::{Node, NodeList},
    operand::Operand,
    value::Value,
};
use log::{debug, trace};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::cmp::Ordering;

/// Default limit for recursive descent, counted from the node `..` starts
/// at.
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Deepest node `..` may visit before evaluation fails with
    /// `MaxDepthExceeded`.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EvalOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Applies selector chains to a document.
///
/// Holds no per-document state; one evaluator can be shared between
/// threads and documents.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: EvalOptions,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::default()
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Evaluator { options }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Evaluate a compiled chain against `document`, starting from a node
    /// list holding only the root.
    pub fn evaluate<'a>(
        &self,
        selectors: &[Selector],
        document: &'a Value,
    ) -> Result<NodeList<'a>, EvalError> {
        let nodes = self.apply_chain(selectors, NodeList::root(document), document)?;
        debug!(
            "evaluated {} selector(s): {} node(s)",
            selectors.len(),
            nodes.len()
        );
        Ok(nodes)
    }

    fn apply_chain<'a>(
        &self,
        selectors: &[Selector],
        input: NodeList<'a>,
        root: &'a Value,
    ) -> Result<NodeList<'a>, EvalError> {
        let mut current = input;
        for selector in selectors {
            current = self.apply(selector, current, root)?;
            trace!("{selector} -> {} node(s)", current.len());
        }
        Ok(current)
    }

    fn apply<'a>(
        &self,
        selector: &Selector,
        input: NodeList<'a>,
        root: &'a Value,
    ) -> Result<NodeList<'a>, EvalError> {
        let mut output = NodeList::new();

        match selector {
            Selector::Identifier(name) => {
                for node in &input {
                    match node.member(name) {
                        Some(child) => output.push(child),
                        None if name == "length" => {
                            if let Some(items) = node.value().as_array() {
                                output.push(Node::synthetic(Value::from(items.len())));
                            }
                        }
                        None => {}
                    }
                }
            }

            // both spellings enumerate the children of either container kind
            Selector::WildcardMember | Selector::WildcardIndex => {
                for node in &input {
                    output.extend(node.children());
                }
            }

            Selector::Index(index) => {
                for node in &input {
                    if let Some(child) = self.element_at(node, *index) {
                        output.push(child);
                    }
                }
            }

            Selector::Slice(slice) => {
                for node in &input {
                    if let Some(items) = node.value().as_array() {
                        for i in slice.indices(items.len()) {
                            output.extend(node.element(i));
                        }
                    }
                }
            }

            Selector::RecursiveDescent => {
                for node in input {
                    self.descend(node, 0, &mut output)?;
                }
            }

            Selector::Union(members) => {
                for node in &input {
                    for chain in members {
                        let start = NodeList::from(node.clone());
                        output.extend(self.apply_chain(chain, start, root)?);
                    }
                }
            }

            Selector::Filter(predicate) => {
                for node in &input {
                    for child in node.children() {
                        if self.test(predicate, &child, root)? {
                            output.push(child);
                        }
                    }
                }
            }

            Selector::Function {
                function: Function::Builtin(Builtin::Count),
                ..
            } => {
                output.push(Node::synthetic(Value::from(input.len())));
            }

            Selector::Function { function, args } => {
                for node in &input {
                    match self.call_on_node(function, args, node, root) {
                        Ok(Operand::Value(value)) => output.push(Node::synthetic(value)),
                        Ok(_) => {}
                        Err(e) if e.is_recoverable() => debug!("skipping node: {e}"),
                        Err(e) => return Err(e),
                    }
                }
            }

            Selector::Computed(predicate) => {
                for node in &input {
                    let key = match self.eval_predicate(predicate, node, root) {
                        Ok(key) => key,
                        Err(e) if e.is_recoverable() => {
                            debug!("skipping node: {e}");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    let child = match key.single() {
                        Some(Value::String(name)) => node.member(name),
                        Some(v @ (Value::Integer(_) | Value::Float(_))) => {
                            v.as_i64().and_then(|i| self.element_at(node, i))
                        }
                        _ => None,
                    };
                    output.extend(child);
                }
            }
        }

        Ok(output)
    }

    /// Element `index` of an array node; negative indices count from the
    /// end.
    fn element_at<'a>(&self, node: &Node<'a>, index: i64) -> Option<Node<'a>> {
        let len = node.value().as_array()?.len() as i64;
        let resolved = if index < 0 { index + len } else { index };
        if (0..len).contains(&resolved) {
            node.element(resolved as usize)
        } else {
            None
        }
    }

    /// Pre-order walk: the node itself, then each child's subtree in
    /// document order.
    fn descend<'a>(
        &self,
        node: Node<'a>,
        depth: usize,
        output: &mut NodeList<'a>,
    ) -> Result<(), EvalError> {
        if depth > self.options.max_depth {
            return Err(EvalError::max_depth(
                self.options.max_depth,
                node.path().cloned(),
            ));
        }

        let children = node.children();
        output.push(node);
        for child in children {
            self.descend(child, depth + 1, output)?;
        }
        Ok(())
    }

    /// Selector-form call: the node is the first argument.
    fn call_on_node<'a>(
        &self,
        function: &Function,
        args: &[Predicate],
        node: &Node<'a>,
        root: &'a Value,
    ) -> Result<Operand<'a>, EvalError> {
        let mut operands = Vec::with_capacity(args.len() + 1);
        operands.push(Operand::Nodes(NodeList::from(node.clone())));
        for arg in args {
            operands.push(self.eval_predicate(arg, node, root)?);
        }
        function.call(&operands).map_err(|e| e.at(node.path()))
    }

    /// Whether `candidate` passes a filter. Bad function arguments only
    /// exclude the candidate.
    fn test<'a>(
        &self,
        predicate: &Predicate,
        candidate: &Node<'a>,
        root: &'a Value,
    ) -> Result<bool, EvalError> {
        match self.eval_predicate(predicate, candidate, root) {
            Ok(operand) => Ok(operand.is_truthy()),
            Err(e) if e.is_recoverable() => {
                debug!("filter candidate excluded: {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn eval_predicate<'a>(
        &self,
        predicate: &Predicate,
        current: &Node<'a>,
        root: &'a Value,
    ) -> Result<Operand<'a>, EvalError> {
        match predicate {
            Predicate::Literal(value) => Ok(Operand::Value(value.clone())),
            Predicate::CurrentNode => Ok(Operand::Nodes(NodeList::from(current.clone()))),
            Predicate::RootNode => Ok(Operand::Nodes(NodeList::root(root))),
            Predicate::RelativePath(chain) => {
                let start = NodeList::from(current.clone());
                Ok(Operand::Nodes(self.apply_chain(chain, start, root)?))
            }
            Predicate::AbsolutePath(chain) => {
                Ok(Operand::Nodes(self.apply_chain(chain, NodeList::root(root), root)?))
            }

            Predicate::Compare { op, left, right } => {
                let left = self.eval_predicate(left, current, root)?;
                let right = self.eval_predicate(right, current, root)?;
                Ok(Operand::boolean(compare(*op, left.single(), right.single())))
            }

            Predicate::Arithmetic { op, left, right } => {
                let left = self.eval_predicate(left, current, root)?;
                let right = self.eval_predicate(right, current, root)?;
                let result = match (left.single(), right.single()) {
                    (Some(l), Some(r)) => arithmetic(*op, l, r),
                    _ => None,
                };
                Ok(Operand::from_option(result))
            }

            Predicate::Negate(operand) => {
                let operand = self.eval_predicate(operand, current, root)?;
                let result = match operand.single() {
                    Some(Value::Integer(n)) => n.checked_neg().map(Value::Integer),
                    Some(Value::Float(n)) => Some(Value::Float(-n)),
                    _ => None,
                };
                Ok(Operand::from_option(result))
            }

            Predicate::And(left, right) => {
                if !self.eval_predicate(left, current, root)?.is_truthy() {
                    return Ok(Operand::boolean(false));
                }
                let right = self.eval_predicate(right, current, root)?;
                Ok(Operand::boolean(right.is_truthy()))
            }

            Predicate::Or(left, right) => {
                if self.eval_predicate(left, current, root)?.is_truthy() {
                    return Ok(Operand::boolean(true));
                }
                let right = self.eval_predicate(right, current, root)?;
                Ok(Operand::boolean(right.is_truthy()))
            }

            Predicate::Not(operand) => {
                let operand = self.eval_predicate(operand, current, root)?;
                Ok(Operand::boolean(!operand.is_truthy()))
            }

            Predicate::Matches { operand, pattern } => {
                let operand = self.eval_predicate(operand, current, root)?;
                let matched = match operand.single() {
                    Some(Value::String(s)) => pattern.is_match(s),
                    _ => false,
                };
                Ok(Operand::boolean(matched))
            }

            Predicate::FunctionCall { function, args } => {
                let mut operands = Vec::with_capacity(args.len());
                for arg in args {
                    operands.push(self.eval_predicate(arg, current, root)?);
                }
                function
                    .call(&operands)
                    .map_err(|e| e.at(current.path()))
            }
        }
    }
}

/// Comparison of two reduced operands. A missing side makes every
/// comparison false, `!=` included.
fn compare(op: CompareOp, left: Option<&Value>, right: Option<&Value>) -> bool {
    let (Some(left), Some(right)) = (left, right) else {
        return false;
    };

    match op {
        CompareOp::Equal => left.equivalent(right),
        CompareOp::NotEqual => !left.equivalent(right),
        CompareOp::LessThan => left.partial_compare(right) == Some(Ordering::Less),
        CompareOp::LessEqual => matches!(
            left.partial_compare(right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::GreaterThan => left.partial_compare(right) == Some(Ordering::Greater),
        CompareOp::GreaterEqual => matches!(
            left.partial_compare(right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Numeric arithmetic. Non-numbers, division by zero and overflow give no
/// result.
///
/// Integer pairs stay integers unless a division is inexact. Mixed
/// integer/float pairs are computed in decimal so that `100 * 1.1` is
/// `110`, not `110.00000000000001`.
fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Option<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            ArithOp::Add => a.checked_add(*b).map(Value::Integer),
            ArithOp::Subtract => a.checked_sub(*b).map(Value::Integer),
            ArithOp::Multiply => a.checked_mul(*b).map(Value::Integer),
            ArithOp::Divide => match a.checked_rem(*b) {
                Some(0) => a.checked_div(*b).map(Value::Integer),
                Some(_) => Some(Value::Float(*a as f64 / *b as f64)),
                None => None,
            },
            ArithOp::Modulo => a.checked_rem(*b).map(Value::Integer),
        },
        (Value::Float(a), Value::Float(b)) => float_arithmetic(op, *a, *b),
        (Value::Integer(a), Value::Float(b)) => {
            decimal_arithmetic(op, Decimal::from_i64(*a), Decimal::from_f64(*b))
                .or_else(|| float_arithmetic(op, *a as f64, *b))
        }
        (Value::Float(a), Value::Integer(b)) => {
            decimal_arithmetic(op, Decimal::from_f64(*a), Decimal::from_i64(*b))
                .or_else(|| float_arithmetic(op, *a, *b as f64))
        }
        _ => None,
    }
}

fn float_arithmetic(op: ArithOp, a: f64, b: f64) -> Option<Value> {
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Subtract => a - b,
        ArithOp::Multiply => a * b,
        ArithOp::Divide if b == 0.0 => return None,
        ArithOp::Divide => a / b,
        ArithOp::Modulo if b == 0.0 => return None,
        ArithOp::Modulo => a % b,
    };
    result.is_finite().then_some(Value::Float(result))
}

fn decimal_arithmetic(op: ArithOp, a: Option<Decimal>, b: Option<Decimal>) -> Option<Value> {
    let (a, b) = (a?, b?);
    let result = match op {
        ArithOp::Add => a.checked_add(b)?,
        ArithOp::Subtract => a.checked_sub(b)?,
        ArithOp::Multiply => a.checked_mul(b)?,
        ArithOp::Divide => a.checked_div(b)?,
        ArithOp::Modulo => a.checked_rem(b)?,
    };
    if result.is_integer()
        && let Some(r) = result.to_i64()
    {
        return Some(Value::Integer(r));
    }
    result.to_f64().map(Value::Float)
}
