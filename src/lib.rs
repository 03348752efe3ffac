//! # KoruAggregate: Query In-Memory Records
//!
//! KoruAggregate is an in-memory aggregation and querying library for
//! sequences of JSON records. It gives you:
//! - **Chainable queries** - filter, map, sort, group, dedup, intersect
//! - **Polymorphic conditions** - literals, deep keys, closures or per-field
//!   specifications, all accepted interchangeably
//! - **Deep keys** - `user.address.city`, `tags[0]`
//! - **Fuzzy matching** - substring and Jaro-Winkler word similarity
//!
//! ## Quick Start
//!
//! ```ignore
//! use koru_aggregate::prelude::*;
//! use koru_aggregate::matchers::{fuzzy_match_by, gt};
//!
//! let people = Aggregator::new(vec![
//!     json!({"name": "Adam", "gender": "M", "age": 17}),
//!     json!({"name": "Clair", "gender": "F", "age": 29}),
//!     json!({"name": "Beat", "gender": "M", "age": 23}),
//! ]);
//!
//! // Filter with a keyed matcher
//! let adults = people.filter(Condition::key("age", gt(18)))?;
//!
//! // Filter with a per-field object
//! let men = people.filter(json!({"gender": "M"}))?;
//!
//! // Multi-key sort
//! let sorted = people.sort_by([SortBy::asc("gender"), SortBy::desc("age")])?;
//!
//! // Nested grouping
//! let groups = people.group(["gender", "age"])?;
//!
//! // Fuzzy search
//! let hits = people.filter(fuzzy_match_by("name", "clare"))?;
//! ```
//!
//! ## Core API
//!
//! - [`Aggregator`] - the sequence container and its operations
//! - [`Group`] - keyed, nested partitions produced by [`Aggregator::group`]
//! - [`Condition`] / [`Matcher`] - condition shapes and normalized predicates
//! - [`Extractor`] / [`KeyPath`] - value extraction and deep keys
//! - [`matchers`] - standalone predicate builders (`eq`, `gt`, `and`, ...)
//! - [`FuzzyMatcher`] - configurable fuzzy text scoring
//!
//! ## Errors
//!
//! Malformed deep keys, indexing into non-arrays, construction from the
//! wrong JSON shape and violated uniqueness are errors ([`AggregateError`]).
//! Missing data is not: absent keys read as `null` and empty averages are
//! `NaN`.

// Internal modules
mod error;

// Building blocks
pub mod condition;
pub mod extractor;
pub mod path;

// Predicate builders
pub mod fuzzy;
pub mod matchers;

// Containers
pub mod aggregator;
pub mod group;

// Public API exports
pub use aggregator::{Aggregator, Chunk, SortBy, SortOrder};
pub use condition::{Check, Condition, Matcher, eval_condition};
pub use error::{AggregateError, AggregateResult};
pub use extractor::{Extractor, extract_value};
pub use fuzzy::{FuzzyConfig, FuzzyMatcher, FuzzyResult};
pub use group::{Group, Partition};
pub use path::{KeyPath, get_deep_value, get_shallow_value};

// Re-export commonly used external types for convenience
pub use indexmap::IndexMap;
pub use serde_json::{Value as JsonValue, json};

/// Prelude module for convenient imports.
///
/// Import everything you need with:
/// ```ignore
/// use koru_aggregate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aggregator::{Aggregator, Chunk, SortBy, SortOrder};
    pub use crate::condition::{Check, Condition, Matcher};
    pub use crate::error::{AggregateError, AggregateResult};
    pub use crate::extractor::Extractor;
    pub use crate::fuzzy::{FuzzyConfig, FuzzyMatcher};
    pub use crate::group::{Group, Partition};
    pub use serde_json::{Value as JsonValue, json};
}
