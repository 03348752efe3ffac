/// Keyed partitions of aggregators.
///
/// A [`Group`] maps stringified keys to either an [`Aggregator`] (the
/// deepest level) or another `Group` (one level per additional grouping
/// key). Keys keep the order in which they were first seen.
///
/// # Example
///
/// ```ignore
/// let by_gender = people.group(["gender"])?;
/// let men = by_gender.get("M").and_then(Partition::as_aggregator);
///
/// let nested = people.group(["gender", "age"])?;
/// let teens = nested
///     .get("F")
///     .and_then(Partition::as_group)
///     .and_then(|ages| ages.get("17"));
/// ```
use crate::aggregator::Aggregator;
use crate::error::{AggregateError, AggregateResult};
use crate::path::kind_of;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

/// The value stored under a group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Partition {
    /// Elements sharing the key (deepest level).
    Items(Aggregator),
    /// A further partition by the next grouping key.
    Nested(Group),
}

impl Partition {
    /// The aggregator at this entry, if it is a leaf.
    pub fn as_aggregator(&self) -> Option<&Aggregator> {
        match self {
            Partition::Items(items) => Some(items),
            Partition::Nested(_) => None,
        }
    }

    /// The nested group at this entry, if it is not a leaf.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Partition::Nested(group) => Some(group),
            Partition::Items(_) => None,
        }
    }

    /// Plain JSON view: leaves become arrays, nested groups objects.
    pub fn to_value(&self) -> JsonValue {
        match self {
            Partition::Items(items) => JsonValue::Array(items.to_array()),
            Partition::Nested(group) => group.to_value(),
        }
    }
}

impl From<Aggregator> for Partition {
    fn from(items: Aggregator) -> Self {
        Partition::Items(items)
    }
}

impl From<Group> for Partition {
    fn from(group: Group) -> Self {
        Partition::Nested(group)
    }
}

/// A keyed, insertion-ordered partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Group {
    entries: IndexMap<String, Partition>,
}

impl Group {
    /// Create a group from its entries.
    pub fn new(entries: IndexMap<String, Partition>) -> Self {
        Self { entries }
    }

    /// The keys, in insertion order.
    pub fn keys(&self) -> Aggregator {
        self.entries
            .keys()
            .map(|key| JsonValue::String(key.clone()))
            .collect()
    }

    /// The values as plain JSON, in insertion order.
    ///
    /// Use [`Group::iter`] or [`Group::get`] for typed access to the nested
    /// aggregators and groups.
    pub fn values(&self) -> Aggregator {
        self.entries.values().map(Partition::to_value).collect()
    }

    /// Entry under a key.
    pub fn get(&self, key: &str) -> Option<&Partition> {
        self.entries.get(key)
    }

    /// Insert or replace the entry under a key. An existing key keeps its
    /// position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Partition>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the group has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Partition> {
        self.entries.iter()
    }

    /// `{key, items}` pairs in insertion order.
    pub fn to_array(&self) -> Vec<JsonValue> {
        self.entries
            .iter()
            .map(|(key, value)| json!({"key": key, "items": value.to_value()}))
            .collect()
    }

    /// A decoupled copy of the entries.
    pub fn to_map(&self) -> IndexMap<String, Partition> {
        self.entries.clone()
    }

    /// The `{key, items}` pairs wrapped in an aggregator.
    pub fn to_aggregator(&self) -> Aggregator {
        Aggregator::new(self.to_array())
    }

    /// Plain JSON view of the whole partition.
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect::<Map<_, _>>(),
        )
    }

    pub(crate) fn key_list(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Walk down nested groups along a key path.
    pub(crate) fn descend_mut(&mut self, path: &[String]) -> Option<&mut Group> {
        let mut current = self;
        for key in path {
            current = match current.entries.get_mut(key)? {
                Partition::Nested(group) => group,
                Partition::Items(_) => return None,
            };
        }
        Some(current)
    }
}

impl<'a> IntoIterator for &'a Group {
    type Item = (&'a String, &'a Partition);
    type IntoIter = indexmap::map::Iter<'a, String, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build a group from a JSON object whose values are arrays (leaves) or
/// objects (nested groups).
impl TryFrom<JsonValue> for Group {
    type Error = AggregateError;

    fn try_from(value: JsonValue) -> AggregateResult<Self> {
        let JsonValue::Object(map) = value else {
            return Err(AggregateError::construction(format!(
                "expected object to be passed into constructor, found {}",
                kind_of(&value)
            )));
        };

        let mut entries = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            let partition = match value {
                JsonValue::Array(items) => Partition::Items(Aggregator::new(items)),
                nested @ JsonValue::Object(_) => Partition::Nested(Group::try_from(nested)?),
                other => {
                    return Err(AggregateError::construction(format!(
                        "group entry '{key}' must be an array or object, found {}",
                        kind_of(&other)
                    )));
                }
            };
            entries.insert(key, partition);
        }
        Ok(Self { entries })
    }
}
