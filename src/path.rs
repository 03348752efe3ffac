/// Path resolution over nested JSON values.
///
/// A deep key is a dot-separated list of segments. Each segment names an
/// object field and may carry one bracketed array index:
///
/// ```text
/// user.name          -> value["user"]["name"]
/// base.arr[1]        -> value["base"]["arr"][1]
/// .                  -> value itself
/// ```
///
/// Missing intermediate values resolve to `None`. Malformed bracket syntax
/// and indexing into a non-array are errors.
use crate::error::{AggregateError, AggregateResult};
use serde_json::Value as JsonValue;
use std::fmt;

/// One parsed segment of a deep key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    /// Raw text of the segment, kept for error messages.
    raw: String,
    /// Field name looked up on the current value.
    name: String,
    /// Optional array index applied to the field's value.
    index: Option<usize>,
}

impl Segment {
    fn parse(raw: &str) -> AggregateResult<Self> {
        let malformed = || AggregateError::MalformedKey {
            key: raw.to_string(),
        };

        let Some(open) = raw.find('[') else {
            if raw.contains(']') {
                return Err(malformed());
            }
            return Ok(Self {
                raw: raw.to_string(),
                name: raw.to_string(),
                index: None,
            });
        };

        let close = raw.find(']').ok_or_else(malformed)?;
        if close != raw.len() - 1 || close <= open || raw[open + 1..].contains('[') {
            return Err(malformed());
        }

        let digits = &raw[open + 1..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        // Only overflow can fail here; such an index is past any array's end.
        let index = digits.parse::<usize>().unwrap_or(usize::MAX);

        Ok(Self {
            raw: raw.to_string(),
            name: raw[..open].to_string(),
            index: Some(index),
        })
    }

    fn resolve<'a>(&self, value: &'a JsonValue) -> AggregateResult<Option<&'a JsonValue>> {
        let field = lookup(value, &self.name);

        let Some(index) = self.index else {
            return Ok(field);
        };

        match field {
            None => Ok(None),
            Some(JsonValue::Array(items)) => Ok(items.get(index)),
            Some(other) => Err(AggregateError::NotAnArray {
                key: self.raw.clone(),
                found: kind_of(other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Parsed {
    Identity,
    Segments(Vec<Segment>),
    Malformed(AggregateError),
}

/// A parsed deep key.
///
/// Parsing never fails up front; a malformed key reports its error when it
/// is resolved, so keys can be built from plain strings.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPath {
    raw: String,
    parsed: Parsed,
}

impl KeyPath {
    /// Parse a deep key.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = if raw == "." {
            Parsed::Identity
        } else {
            raw.split('.')
                .map(Segment::parse)
                .collect::<AggregateResult<Vec<_>>>()
                .map_or_else(Parsed::Malformed, Parsed::Segments)
        };
        Self { raw, parsed }
    }

    /// The key as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this key resolves to the value itself.
    pub fn is_identity(&self) -> bool {
        matches!(self.parsed, Parsed::Identity)
    }

    /// Resolve this key against a value.
    ///
    /// Resolution stops with `None` as soon as an intermediate value is
    /// missing or `null`.
    pub fn resolve<'a>(&self, value: &'a JsonValue) -> AggregateResult<Option<&'a JsonValue>> {
        match &self.parsed {
            Parsed::Identity => Ok(Some(value)),
            Parsed::Malformed(err) => Err(err.clone()),
            Parsed::Segments(segments) => {
                let mut current = Some(value);
                for segment in segments {
                    current = match current {
                        Some(JsonValue::Null) | None => return Ok(None),
                        Some(next) => segment.resolve(next)?,
                    };
                }
                Ok(current)
            }
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for KeyPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for KeyPath {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Resolve a single segment (`field` or `field[index]`) against a value.
pub fn get_shallow_value<'a>(
    value: &'a JsonValue,
    key: &str,
) -> AggregateResult<Option<&'a JsonValue>> {
    Segment::parse(key)?.resolve(value)
}

/// Resolve a dotted deep key against a value.
///
/// `"."` returns the value itself.
pub fn get_deep_value<'a>(
    value: &'a JsonValue,
    deep_key: &str,
) -> AggregateResult<Option<&'a JsonValue>> {
    KeyPath::new(deep_key).resolve(value)
}

/// Plain field lookup. Arrays accept numeric field names.
fn lookup<'a>(value: &'a JsonValue, name: &str) -> Option<&'a JsonValue> {
    match value {
        JsonValue::Object(map) => map.get(name),
        JsonValue::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub(crate) fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
