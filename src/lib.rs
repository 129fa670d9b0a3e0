//! A query language for extracting values out of nested JSON data by path
//! expression, in the classic dot-and-bracket dialect: `$` is the root, `.`
//! accesses a property, `..` descends recursively, `[...]` selects indices,
//! slices, property lists, filters (`?(...)`) and script indices (`(...)`),
//! `*` is a wildcard and a trailing `~` retrieves key names.
//!
//! ## Getting values
//!
//! [`get`] evaluates a path against a [`serde_json::Value`]. Queries whose
//! syntax guarantees at most one match produce a single value; wildcards,
//! descent, selector lists, slices and filters produce an ordered collection.
//! A missing match is reported as [`QueryResult::Absent`], never an error.
//!
//! ```
//! use jsonpath_get::{get, PathError, QueryResult};
//! use serde_json::json;
//!
//! fn main() -> Result<(), PathError> {
//!     let doc = json!({
//!         "store": {
//!             "book": [
//!                 {"title": "Sayings of the Century", "price": 8.95},
//!                 {"title": "Sword of Honour", "price": 12.99}
//!             ]
//!         }
//!     });
//!
//!     let rv = get(&doc, "$.store.book[0].title")?;
//!     assert_eq!(rv, QueryResult::One(json!("Sayings of the Century")));
//!
//!     let rv = get(&doc, "$..price")?;
//!     assert_eq!(rv, QueryResult::Many(vec![json!(8.95), json!(12.99)]));
//!
//!     let rv = get(&doc, "$.store.book[1].isbn")?;
//!     assert_eq!(rv, QueryResult::Absent);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Filters and script indices
//!
//! Filter and script expressions are parsed into a small expression tree and
//! interpreted directly; there is no host-language evaluation. `@` is the
//! value under consideration, `@property` its key or index, and `@.length`
//! the length of an array or string. Expression evaluation can be turned off
//! with [`Options`], in which case paths containing expressions fail instead
//! of matching nothing.
//!
//! ```
//! use jsonpath_get::{get, get_with, Options, QueryResult};
//! use serde_json::json;
//!
//! let doc = json!({"xs": [1, 2, 3, 4]});
//!
//! let rv = get(&doc, "$.xs[(@.length-1)]").unwrap();
//! assert_eq!(rv, QueryResult::One(json!(4)));
//!
//! let err = get_with(&doc, "$.xs[?(@>2)]", &Options { eval: false }).unwrap_err();
//! assert!(matches!(err.kind, jsonpath_get::PathErrorType::EvaluationDisabled));
//! ```
//!
//! ## Matched nodes
//!
//! [`find`] returns the matched nodes themselves, each carrying the key or
//! index under which it was reached.
//!
//! ```
//! use jsonpath_get::find;
//! use serde_json::json;
//!
//! let doc = json!({"a": 1, "b": 2});
//! let nodes = find("$.*", &doc).unwrap();
//! assert_eq!(nodes.len(), 2);
//! ```

pub mod errors;
pub mod eval;
pub mod jsonpath;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod token;

pub use errors::PathError;
pub use errors::PathErrorType;
pub use eval::Key;
pub use eval::Node;
pub use eval::NodeList;
pub use jsonpath::find;
pub use jsonpath::get;
pub use jsonpath::get_with;
pub use jsonpath::Options;
pub use jsonpath::QueryResult;
pub use parser::Parser;
pub use query::Query;
