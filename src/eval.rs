//! Query resolution against `serde_json` values.
//!
//! A [`Query`] is folded over an active set of [`Node`]s, one segment at a
//! time. Every node pairs a value with the key or index under which it was
//! reached, so key selection (`~`) and filter predicates (`@property`) can
//! observe their context without a pointer back to the owning container.

use std::borrow::Cow;
use std::cmp;

use itertools::Itertools;
use serde_json::{Number, Value};

use crate::{
    errors::PathError,
    query::{
        ArithmeticOperator, ComparisonOperator, Expression, ExpressionType, LogicalOperator, Query,
        Segment, Selector,
    },
};

/// The key or array index under which a matched value was found.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl Key {
    pub fn to_value(&self) -> Value {
        match self {
            Key::Name(name) => Value::String(name.clone()),
            Key::Index(index) => Value::Number(Number::from(*index)),
        }
    }
}

/// A single match, carrying the value and its key context. The root node has
/// no key. Values are borrowed from the queried document except for the
/// synthesized key values produced by a trailing `~`.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    pub value: Cow<'a, Value>,
    pub key: Option<Key>,
}

pub type NodeList<'a> = Vec<Node<'a>>;

impl<'a> Node<'a> {
    fn new_root(value: &'a Value) -> Self {
        Node {
            value: Cow::Borrowed(value),
            key: None,
        }
    }

    fn new_member(value: &'a Value, name: &str) -> Self {
        Node {
            value: Cow::Borrowed(value),
            key: Some(Key::Name(name.to_string())),
        }
    }

    fn new_element(value: &'a Value, index: usize) -> Self {
        Node {
            value: Cow::Borrowed(value),
            key: Some(Key::Index(index)),
        }
    }

    fn as_borrowed(&self) -> Option<&'a Value> {
        match self.value {
            Cow::Borrowed(value) => Some(value),
            // synthesized values are scalars with nothing to select from
            Cow::Owned(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        self.value.into_owned()
    }
}

impl Query {
    /// Resolve this query against `value`, returning every matched node in
    /// evaluation order.
    pub fn find<'a>(&self, value: &'a Value) -> Result<NodeList<'a>, PathError> {
        self.segments
            .iter()
            .try_fold(vec![Node::new_root(value)], |nodes, segment| {
                segment.resolve(nodes)
            })
    }

    /// Like [`Query::find`], but also reports the segment that first emptied
    /// the active set, for the absent-versus-empty distinction made by `get`.
    pub(crate) fn find_traced<'a>(
        &self,
        value: &'a Value,
    ) -> Result<(NodeList<'a>, Option<&Segment>), PathError> {
        let mut nodes = vec![Node::new_root(value)];

        for segment in self.segments.iter() {
            nodes = segment.resolve(nodes)?;
            if nodes.is_empty() {
                return Ok((nodes, Some(segment)));
            }
        }

        Ok((nodes, None))
    }
}

impl Segment {
    pub(crate) fn resolve<'a>(&self, nodes: NodeList<'a>) -> Result<NodeList<'a>, PathError> {
        match self {
            Segment::Child { selectors } => nodes
                .iter()
                .flat_map(|node| selectors.iter().map(|s| s.resolve(node)))
                .flatten_ok()
                .collect(),
            Segment::Recursive { selectors } => {
                if selectors.is_empty() {
                    Ok(nodes.iter().flat_map(visit).collect())
                } else {
                    nodes
                        .iter()
                        .flat_map(visit)
                        .flat_map(|node| selectors.iter().map(move |s| s.resolve(&node)))
                        .flatten_ok()
                        .collect()
                }
            }
            Segment::Keys => Ok(nodes
                .into_iter()
                .filter_map(|node| {
                    node.key.map(|key| Node {
                        value: Cow::Owned(key.to_value()),
                        key: Some(key),
                    })
                })
                .collect()),
        }
    }

    /// Whether an empty resolution means a missing optional parent rather
    /// than a legitimately empty selection. Name, index and script selectors
    /// are conditional; wildcards, slices and filters enumerate whatever is
    /// there.
    pub(crate) fn is_conditional(&self) -> bool {
        match self {
            Segment::Child { selectors } | Segment::Recursive { selectors } => {
                selectors.iter().all(|selector| {
                    matches!(
                        selector,
                        Selector::Name { .. } | Selector::Index { .. } | Selector::Script { .. }
                    )
                })
            }
            Segment::Keys => true,
        }
    }
}

impl Selector {
    fn resolve<'a>(&self, node: &Node<'a>) -> Result<NodeList<'a>, PathError> {
        let Some(value) = node.as_borrowed() else {
            return Ok(Vec::new());
        };

        match self {
            Selector::Name { name } => {
                if let Some(v) = value.get(name) {
                    Ok(vec![Node::new_member(v, name)])
                } else {
                    Ok(Vec::new())
                }
            }
            Selector::Index { index } => Ok(element(value, *index)
                .map(|(i, v)| Node::new_element(v, i))
                .into_iter()
                .collect()),
            Selector::Slice { start, stop, step } => {
                if let Some(array) = value.as_array() {
                    Ok(slice(array, *start, *stop, *step)
                        .into_iter()
                        .map(|(i, v)| Node::new_element(v, i))
                        .collect())
                } else {
                    Ok(Vec::new())
                }
            }
            Selector::Wild => match value {
                Value::Array(arr) => Ok(arr
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Node::new_element(v, i))
                    .collect()),
                Value::Object(obj) => Ok(obj
                    .iter()
                    .map(|(k, v)| Node::new_member(v, k))
                    .collect()),
                _ => Ok(Vec::new()),
            },
            Selector::Script { expression } => {
                let rv = expression.evaluate(value, node.key.as_ref())?;
                let index = coerce_index(rv, expression.index)?;
                Ok(element(value, index)
                    .map(|(i, v)| Node::new_element(v, i))
                    .into_iter()
                    .collect())
            }
            Selector::Filter { expression } => match value {
                Value::Array(arr) => arr
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        expression
                            .evaluate(v, Some(&Key::Index(i)))
                            .map(|rv| (i, v, rv))
                    })
                    .filter_ok(|(_, _, rv)| is_truthy(rv))
                    .map_ok(|(i, v, _)| Node::new_element(v, i))
                    .collect(),
                Value::Object(obj) => obj
                    .iter()
                    .map(|(k, v)| {
                        expression
                            .evaluate(v, Some(&Key::Name(k.to_string())))
                            .map(|rv| (k, v, rv))
                    })
                    .filter_ok(|(_, _, rv)| is_truthy(rv))
                    .map_ok(|(k, v, _)| Node::new_member(v, k))
                    .collect(),
                _ => Ok(Vec::new()),
            },
        }
    }
}

/// Pre-order traversal for recursive descent: the node itself, then the
/// subtree of each child that is a container, in child order. Scalar children
/// are reached through selection, never visited directly.
fn visit<'a>(node: &Node<'a>) -> NodeList<'a> {
    let mut nodes: NodeList = vec![node.clone()];

    match node.as_borrowed() {
        Some(Value::Object(obj)) => obj
            .iter()
            .filter(|(_, v)| is_container(v))
            .for_each(|(k, v)| nodes.extend(visit(&Node::new_member(v, k)))),
        Some(Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .filter(|(_, e)| is_container(e))
            .for_each(|(i, e)| nodes.extend(visit(&Node::new_element(e, i)))),
        _ => (),
    }

    nodes
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Array element lookup with negative indices counting from the end.
fn element(value: &Value, index: isize) -> Option<(usize, &Value)> {
    let array = value.as_array()?;

    let index = if index < 0 {
        index.checked_add(array.len() as isize)?
    } else {
        index
    };

    if index < 0 {
        return None;
    }

    array.get(index as usize).map(|v| (index as usize, v))
}

/// Normalize slice bounds and collect the included elements in ascending
/// order. The parser guarantees a positive step.
fn slice(
    array: &[Value],
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
) -> Vec<(usize, &Value)> {
    let length = array.len() as isize;
    if length == 0 {
        return Vec::new();
    }

    let n_step = step.unwrap_or(1);

    let normalize = |index: isize| {
        if index < 0 {
            cmp::max(length + index, 0)
        } else {
            cmp::min(index, length)
        }
    };

    let n_start = normalize(start.unwrap_or(0));
    let n_stop = normalize(stop.unwrap_or(length));

    let mut elements: Vec<(usize, &Value)> = Vec::new();
    let mut i = n_start;
    while i < n_stop {
        elements.push((i as usize, &array[i as usize]));
        i += n_step;
    }

    elements
}

/// The result of evaluating a script or filter expression. `Nothing` marks a
/// member access that found no value, distinct from an explicit `null`.
#[derive(Debug)]
pub enum ScriptResult {
    Value(Value),
    Nothing,
}

impl Expression {
    fn evaluate(&self, current: &Value, property: Option<&Key>) -> Result<ScriptResult, PathError> {
        match &self.kind {
            ExpressionType::True => Ok(ScriptResult::Value(Value::Bool(true))),
            ExpressionType::False => Ok(ScriptResult::Value(Value::Bool(false))),
            ExpressionType::Null => Ok(ScriptResult::Value(Value::Null)),
            ExpressionType::String { value } => Ok(ScriptResult::Value(value.as_str().into())),
            ExpressionType::Int { value } => Ok(ScriptResult::Value(Number::from(*value).into())),
            ExpressionType::Float { value } => Ok(ScriptResult::Value((*value).into())),
            ExpressionType::Current { path } => Ok(lookup(current, path)),
            ExpressionType::Property => Ok(match property {
                Some(key) => ScriptResult::Value(key.to_value()),
                None => ScriptResult::Nothing,
            }),
            ExpressionType::Not { expression } => {
                let rv = expression.evaluate(current, property)?;
                Ok(ScriptResult::Value(Value::Bool(!is_truthy(&rv))))
            }
            ExpressionType::Negate { expression } => {
                match expression.evaluate(current, property)? {
                    ScriptResult::Value(Value::Number(n)) => negate_number(&n)
                        .map(ScriptResult::Value)
                        .ok_or_else(|| {
                            PathError::evaluation(
                                String::from("cannot negate a non-finite number"),
                                self.index,
                            )
                        }),
                    _ => Err(PathError::evaluation(
                        String::from("cannot negate a non-numeric value"),
                        self.index,
                    )),
                }
            }
            ExpressionType::Logical {
                left,
                operator,
                right,
            } => {
                let rv = match operator {
                    LogicalOperator::And => {
                        is_truthy(&left.evaluate(current, property)?)
                            && is_truthy(&right.evaluate(current, property)?)
                    }
                    LogicalOperator::Or => {
                        is_truthy(&left.evaluate(current, property)?)
                            || is_truthy(&right.evaluate(current, property)?)
                    }
                };
                Ok(ScriptResult::Value(Value::Bool(rv)))
            }
            ExpressionType::Comparison {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(current, property)?;
                let right = right.evaluate(current, property)?;
                Ok(ScriptResult::Value(Value::Bool(compare(
                    &left, operator, &right,
                ))))
            }
            ExpressionType::Arithmetic {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(current, property)?;
                let right = right.evaluate(current, property)?;
                arithmetic(left, operator, right, self.index).map(ScriptResult::Value)
            }
        }
    }
}

/// Walk a member path from the current node. `length` is synthesized for
/// arrays and strings; an object member named `length` wins over the
/// synthesized value.
fn lookup(current: &Value, path: &[String]) -> ScriptResult {
    let mut value = current;

    for (i, name) in path.iter().enumerate() {
        if let Some(v) = value.get(name) {
            value = v;
            continue;
        }

        let length = match value {
            Value::Array(arr) if name == "length" => arr.len(),
            Value::String(s) if name == "length" => s.chars().count(),
            _ => return ScriptResult::Nothing,
        };

        if i + 1 != path.len() {
            // members of a synthesized length
            return ScriptResult::Nothing;
        }

        return ScriptResult::Value(Value::Number(Number::from(length)));
    }

    ScriptResult::Value(value.clone())
}

pub fn is_truthy(rv: &ScriptResult) -> bool {
    match rv {
        ScriptResult::Nothing => false,
        ScriptResult::Value(value) => match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        },
    }
}

fn compare(left: &ScriptResult, op: &ComparisonOperator, right: &ScriptResult) -> bool {
    use ComparisonOperator::*;
    match op {
        Eq | StrictEq => eq((left, right)),
        Ne | StrictNe => !eq((left, right)),
        Lt => lt((left, right)),
        Gt => lt((right, left)),
        Ge => lt((right, left)) || eq((left, right)),
        Le => lt((left, right)) || eq((left, right)),
    }
}

fn eq(pair: (&ScriptResult, &ScriptResult)) -> bool {
    match pair {
        (ScriptResult::Nothing, ScriptResult::Nothing) => true,
        (ScriptResult::Nothing, ScriptResult::Value(..))
        | (ScriptResult::Value(..), ScriptResult::Nothing) => false,
        (ScriptResult::Value(left), ScriptResult::Value(right)) => match (left, right) {
            (Value::Number(l), Value::Number(r)) => eq_number(l, r),
            _ => left == right,
        },
    }
}

fn lt(pair: (&ScriptResult, &ScriptResult)) -> bool {
    match pair {
        (
            ScriptResult::Value(Value::String(left)),
            ScriptResult::Value(Value::String(right)),
        ) => left < right,
        (
            ScriptResult::Value(Value::Number(left)),
            ScriptResult::Value(Value::Number(right)),
        ) => lt_number(left, right),
        _ => false,
    }
}

fn eq_number(left: &Number, right: &Number) -> bool {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return l == r;
    }

    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return l == r;
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

fn lt_number(left: &Number, right: &Number) -> bool {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return l < r;
    }

    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return l < r;
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l < r,
        _ => false,
    }
}

fn negate_number(n: &Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return Some(Value::Number(Number::from(-i)));
    }

    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
}

fn arithmetic(
    left: ScriptResult,
    operator: &ArithmeticOperator,
    right: ScriptResult,
    index: usize,
) -> Result<Value, PathError> {
    use ArithmeticOperator::*;

    let (l, r) = match (left, right) {
        (ScriptResult::Value(Value::Number(l)), ScriptResult::Value(Value::Number(r))) => (l, r),
        _ => {
            return Err(PathError::evaluation(
                String::from("arithmetic on a non-numeric value"),
                index,
            ));
        }
    };

    // integer arithmetic when both operands are integers, except division
    if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
        let value = match operator {
            Add => Some(l + r),
            Sub => Some(l - r),
            Mul => Some(l * r),
            Div => None,
            Mod => {
                if r == 0 {
                    return Err(PathError::evaluation(
                        String::from("modulo by zero"),
                        index,
                    ));
                }
                Some(l % r)
            }
        };

        if let Some(value) = value {
            return Ok(Value::Number(Number::from(value)));
        }
    }

    let (l, r) = match (l.as_f64(), r.as_f64()) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(PathError::evaluation(
                String::from("arithmetic on a non-numeric value"),
                index,
            ));
        }
    };

    let value = match operator {
        Add => l + r,
        Sub => l - r,
        Mul => l * r,
        Div => {
            if r == 0.0 {
                return Err(PathError::evaluation(
                    String::from("division by zero"),
                    index,
                ));
            }
            l / r
        }
        Mod => {
            if r == 0.0 {
                return Err(PathError::evaluation(String::from("modulo by zero"), index));
            }
            l % r
        }
    };

    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| {
            PathError::evaluation(String::from("arithmetic produced a non-finite number"), index)
        })
}

fn coerce_index(rv: ScriptResult, index: usize) -> Result<isize, PathError> {
    let err = || {
        PathError::evaluation(
            String::from("script index must evaluate to an integer"),
            index,
        )
    };

    match rv {
        ScriptResult::Value(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(i as isize);
            }

            match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Ok(f as isize),
                _ => Err(err()),
            }
        }
        _ => Err(err()),
    }
}
