use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use lazy_static::lazy_static;
use lru::LruCache;
use serde_json::Value;

use crate::{errors::PathError, eval::NodeList, query::Query};

lazy_static! {
    static ref QUERY_CACHE: Mutex<LruCache<String, Arc<Query>>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(512).unwrap()));
}

/// Options recognized by [`get_with`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Enables script and filter expression evaluation. When false, paths
    /// containing `(...)` or `?(...)` groups fail with an evaluation-disabled
    /// error rather than silently matching nothing.
    pub eval: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { eval: true }
    }
}

/// The result of evaluating a path expression against a value.
///
/// Singular queries produce [`QueryResult::One`] or, when traversal finds no
/// match, [`QueryResult::Absent`]. Collection queries produce
/// [`QueryResult::Many`], keeping [`QueryResult::Absent`] for the case where
/// an optional parent was missing before the collection step could select
/// anything.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    One(Value),
    Many(Vec<Value>),
    Absent,
}

impl QueryResult {
    pub fn is_absent(&self) -> bool {
        matches!(self, QueryResult::Absent)
    }

    /// The matched value, with collections wrapped in a JSON array and the
    /// absent marker mapped to `None`.
    pub fn into_value(self) -> Option<Value> {
        match self {
            QueryResult::One(value) => Some(value),
            QueryResult::Many(values) => Some(Value::Array(values)),
            QueryResult::Absent => None,
        }
    }
}

/// Evaluate the path expression `path` against `value` with default options.
pub fn get(value: &Value, path: &str) -> Result<QueryResult, PathError> {
    get_with(value, path, &Options::default())
}

/// Evaluate the path expression `path` against `value`.
pub fn get_with(value: &Value, path: &str, options: &Options) -> Result<QueryResult, PathError> {
    let query = parse_cached(path)?;

    if !options.eval {
        if let Some(expression) = query.first_script() {
            return Err(PathError::disabled(expression.index));
        }
    }

    let (nodes, emptied_by) = query.find_traced(value)?;

    if query.is_singular() {
        return Ok(match nodes.into_iter().next() {
            Some(node) => QueryResult::One(node.into_value()),
            None => QueryResult::Absent,
        });
    }

    if nodes.is_empty() {
        if emptied_by.is_some_and(|segment| segment.is_conditional()) {
            return Ok(QueryResult::Absent);
        }
        return Ok(QueryResult::Many(Vec::new()));
    }

    Ok(QueryResult::Many(
        nodes.into_iter().map(|node| node.into_value()).collect(),
    ))
}

/// Parse `path` and resolve it against `value`, returning every matched node
/// with its key context, in evaluation order.
pub fn find<'a>(path: &str, value: &'a Value) -> Result<NodeList<'a>, PathError> {
    parse_cached(path)?.find(value)
}

fn parse_cached(path: &str) -> Result<Arc<Query>, PathError> {
    let mut cache = QUERY_CACHE.lock().unwrap();

    match cache.get(path) {
        Some(query) => Ok(Arc::clone(query)),
        None => {
            let query = Arc::new(Query::parse(path)?);
            cache.push(path.to_string(), Arc::clone(&query));
            Ok(query)
        }
    }
}
