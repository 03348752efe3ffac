/// Value extraction from elements.
///
/// An [`Extractor`] pulls one value out of an element: the element itself,
/// the value at a deep key, or the result of a caller-supplied function.
/// Missing values come out as `null`.
///
/// This module also holds the comparison rules shared by every operation:
/// strict equality, native ordering and key stringification.
use crate::error::AggregateResult;
use crate::path::KeyPath;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Signature of a function extractor: `(element, index) -> value`.
pub type ExtractFn = dyn Fn(&JsonValue, usize) -> JsonValue;

/// A value-retrieval rule applied to an element.
#[derive(Clone, Default)]
pub enum Extractor {
    /// The element itself.
    #[default]
    Identity,
    /// The value at a deep key.
    Path(KeyPath),
    /// The result of a function over `(element, index)`.
    Func(Rc<ExtractFn>),
}

impl Extractor {
    /// Extract the value at a deep key.
    pub fn path(key: impl Into<KeyPath>) -> Self {
        Self::Path(key.into())
    }

    /// Extract with a function of the element.
    pub fn from_fn(f: impl Fn(&JsonValue) -> JsonValue + 'static) -> Self {
        Self::Func(Rc::new(move |value, _| f(value)))
    }

    /// Extract with a function of the element and its index.
    pub fn indexed(f: impl Fn(&JsonValue, usize) -> JsonValue + 'static) -> Self {
        Self::Func(Rc::new(f))
    }

    /// Whether this extractor returns elements unchanged.
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Identity => true,
            Self::Path(key) => key.is_identity(),
            Self::Func(_) => false,
        }
    }

    /// Extract a value from an element.
    pub fn extract(&self, element: &JsonValue, index: usize) -> AggregateResult<JsonValue> {
        match self {
            Self::Identity => Ok(element.clone()),
            Self::Path(key) => Ok(key.resolve(element)?.cloned().unwrap_or(JsonValue::Null)),
            Self::Func(f) => Ok(f(element, index)),
        }
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Path(key) => f.debug_tuple("Path").field(&key.as_str()).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<&str> for Extractor {
    fn from(key: &str) -> Self {
        Self::path(key)
    }
}

impl From<String> for Extractor {
    fn from(key: String) -> Self {
        Self::path(key)
    }
}

impl From<KeyPath> for Extractor {
    fn from(key: KeyPath) -> Self {
        Self::Path(key)
    }
}

/// Free-function form of [`Extractor::extract`].
pub fn extract_value(
    element: &JsonValue,
    extractor: &Extractor,
    index: usize,
) -> AggregateResult<JsonValue> {
    extractor.extract(element, index)
}

/// Strict equality between two values.
///
/// Numbers compare by numeric value, so `1` equals `1.0`.
pub fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            x.as_f64() == y.as_f64()
        }
        _ => a == b,
    }
}

/// Compare two values with native ordering.
///
/// Returns `None` for pairs that have no natural order (different kinds,
/// arrays, objects). Null sorts before every other value.
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Some(Ordering::Equal),
        (JsonValue::Null, _) => Some(Ordering::Less),
        (_, JsonValue::Null) => Some(Ordering::Greater),

        (JsonValue::Number(x), JsonValue::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),

        _ => None,
    }
}

/// Stringify a value for use as a map or group key.
///
/// Strings are used verbatim and integral numbers print without a
/// fractional part, so `17` and `17.0` share the key `"17"`.
pub fn key_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                // f64 Display already drops a zero fraction
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::Null => String::new(),
                other => key_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => "[object Object]".to_string(),
    }
}

/// Truthiness of a value: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
