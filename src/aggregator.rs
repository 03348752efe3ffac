/// The sequence container and its query operations.
///
/// An [`Aggregator`] owns an ordered list of JSON elements. Every operation
/// leaves the source untouched and returns a new aggregator, a [`Group`] or
/// a scalar, so calls chain freely:
///
/// ```ignore
/// use koru_aggregate::{Aggregator, Condition, SortBy, json};
/// use koru_aggregate::matchers::gte;
///
/// let people = Aggregator::new(vec![
///     json!({"name": "Adam", "age": 17}),
///     json!({"name": "Clair", "age": 29}),
///     json!({"name": "Beat", "age": 23}),
/// ]);
///
/// let adults = people
///     .filter(Condition::key("age", gte(18)))?
///     .sort_by([SortBy::desc("age")])?
///     .map("name")?;
///
/// assert_eq!(adults.to_array(), vec![json!("Clair"), json!("Beat")]);
/// ```
use crate::condition::{Condition, Matcher};
use crate::error::{AggregateError, AggregateResult};
use crate::extractor::{Extractor, compare_values, key_string};
use crate::group::{Group, Partition};
use crate::path::kind_of;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

/// Signature of a sort comparator over extracted values.
pub type CompareFn = dyn Fn(&JsonValue, &JsonValue) -> Ordering;

/// Sort criterion: an extractor, an optional comparator and a direction.
///
/// Without a comparator, extracted values are compared with native
/// ordering.
#[derive(Clone, Default)]
pub struct SortBy {
    /// Rule extracting the value to compare.
    pub extractor: Extractor,
    /// Comparator for extracted values.
    pub comparator: Option<Rc<CompareFn>>,
    /// Sort order.
    pub order: SortOrder,
}

impl SortBy {
    /// Create a new sort specification.
    pub fn new(extractor: impl Into<Extractor>, order: SortOrder) -> Self {
        Self {
            extractor: extractor.into(),
            comparator: None,
            order,
        }
    }

    /// Sort ascending.
    pub fn asc(extractor: impl Into<Extractor>) -> Self {
        Self::new(extractor, SortOrder::Asc)
    }

    /// Sort descending.
    pub fn desc(extractor: impl Into<Extractor>) -> Self {
        Self::new(extractor, SortOrder::Desc)
    }

    /// Sort whole elements with a comparator.
    pub fn comparator(compare: impl Fn(&JsonValue, &JsonValue) -> Ordering + 'static) -> Self {
        Self::default().with_comparator(compare)
    }

    /// Compare extracted values with a comparator.
    pub fn with_comparator(
        mut self,
        compare: impl Fn(&JsonValue, &JsonValue) -> Ordering + 'static,
    ) -> Self {
        self.comparator = Some(Rc::new(compare));
        self
    }

    /// Set the sort order.
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    fn compare(&self, a: &JsonValue, b: &JsonValue) -> Ordering {
        let ord = match &self.comparator {
            Some(compare) => compare(a, b),
            None => compare_values(a, b).unwrap_or(Ordering::Equal),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

impl fmt::Debug for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortBy")
            .field("extractor", &self.extractor)
            .field("comparator", &self.comparator.as_ref().map(|_| ".."))
            .field("order", &self.order)
            .finish()
    }
}

impl From<&str> for SortBy {
    fn from(key: &str) -> Self {
        Self::asc(key)
    }
}

impl From<String> for SortBy {
    fn from(key: String) -> Self {
        Self::asc(key)
    }
}

impl From<Extractor> for SortBy {
    fn from(extractor: Extractor) -> Self {
        Self::asc(extractor)
    }
}

/// Something that can be appended to an aggregator.
#[derive(Debug, Clone)]
pub enum Chunk {
    /// Elements spliced in one by one.
    Items(Vec<JsonValue>),
    /// A single element.
    Value(JsonValue),
}

impl From<Aggregator> for Chunk {
    fn from(aggregator: Aggregator) -> Self {
        Chunk::Items(aggregator.data)
    }
}

impl From<&Aggregator> for Chunk {
    fn from(aggregator: &Aggregator) -> Self {
        Chunk::Items(aggregator.to_array())
    }
}

impl From<Vec<JsonValue>> for Chunk {
    fn from(items: Vec<JsonValue>) -> Self {
        Chunk::Items(items)
    }
}

/// Arrays are spliced in, any other value is appended as one element.
impl From<JsonValue> for Chunk {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => Chunk::Items(items),
            other => Chunk::Value(other),
        }
    }
}

/// An owned, ordered sequence of JSON elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregator {
    data: Vec<JsonValue>,
}

impl Aggregator {
    /// Create an aggregator over a sequence.
    pub fn new(data: Vec<JsonValue>) -> Self {
        Self { data }
    }

    /// Create an aggregator from a JSON array.
    pub fn from_value(value: JsonValue) -> AggregateResult<Self> {
        match value {
            JsonValue::Array(data) => Ok(Self { data }),
            other => Err(AggregateError::construction(format!(
                "expected array to be passed into constructor, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, JsonValue> {
        self.data.iter()
    }

    /// Borrow the elements.
    pub fn as_slice(&self) -> &[JsonValue] {
        &self.data
    }

    /// Run an action on every element, for its side effects.
    pub fn for_each(&self, mut action: impl FnMut(&JsonValue, usize)) -> &Self {
        for (index, element) in self.data.iter().enumerate() {
            action(element, index);
        }
        self
    }

    /// Run an action on the value extracted from every element.
    pub fn for_each_by(
        &self,
        extractor: impl Into<Extractor>,
        mut action: impl FnMut(JsonValue, usize),
    ) -> AggregateResult<&Self> {
        let extractor = extractor.into();
        for (index, element) in self.data.iter().enumerate() {
            action(extractor.extract(element, index)?, index);
        }
        Ok(self)
    }

    /// First element satisfying the condition.
    pub fn find(&self, condition: impl Into<Condition>) -> AggregateResult<Option<&JsonValue>> {
        let matcher = condition.into().into_matcher();
        for (index, element) in self.data.iter().enumerate() {
            if matcher.test(element, index)? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// The only element satisfying the condition.
    ///
    /// Fails with [`AggregateError::MultipleMatches`] if more than one
    /// element matches.
    pub fn find_unique(
        &self,
        condition: impl Into<Condition>,
    ) -> AggregateResult<Option<&JsonValue>> {
        let matched = self.matching(condition.into().into_matcher())?;
        match matched.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => {
                debug!("find_unique matched {} elements", matched.len());
                Err(AggregateError::MultipleMatches {
                    count: matched.len(),
                })
            }
        }
    }

    /// Elements satisfying the condition, in order.
    pub fn filter(&self, condition: impl Into<Condition>) -> AggregateResult<Aggregator> {
        let matched = self.matching(condition.into().into_matcher())?;
        Ok(matched.into_iter().cloned().collect())
    }

    /// Replace every element by its extracted value.
    pub fn map(&self, extractor: impl Into<Extractor>) -> AggregateResult<Aggregator> {
        Ok(Self::new(self.extract_all(&extractor.into())?))
    }

    /// Map every element and flatten array results one level.
    pub fn flat_map(&self, extractor: impl Into<Extractor>) -> AggregateResult<Aggregator> {
        let mut data = Vec::new();
        for value in self.extract_all(&extractor.into())? {
            match value {
                JsonValue::Array(items) => data.extend(items),
                other => data.push(other),
            }
        }
        Ok(Self::new(data))
    }

    /// Map every element to a sequence (an array, another aggregator, ...)
    /// and concatenate the results in order.
    pub fn flat_map_with<I, F>(&self, mut f: F) -> Aggregator
    where
        F: FnMut(&JsonValue, usize) -> I,
        I: IntoIterator<Item = JsonValue>,
    {
        self.data
            .iter()
            .enumerate()
            .flat_map(|(index, element)| f(element, index))
            .collect()
    }

    /// Left-fold the elements.
    pub fn reduce<T>(&self, initial: T, reducer: impl FnMut(T, &JsonValue) -> T) -> T {
        self.data.iter().fold(initial, reducer)
    }

    /// Left-fold the extracted values.
    pub fn reduce_by<T>(
        &self,
        extractor: impl Into<Extractor>,
        initial: T,
        reducer: impl FnMut(T, JsonValue) -> T,
    ) -> AggregateResult<T> {
        Ok(self
            .extract_all(&extractor.into())?
            .into_iter()
            .fold(initial, reducer))
    }

    /// Sort elements with native ordering.
    pub fn sort(&self) -> Aggregator {
        self.sort_with(|a, b| compare_values(a, b).unwrap_or(Ordering::Equal))
    }

    /// Stable multi-key sort.
    ///
    /// Criteria are applied left to right; the first one that tells two
    /// elements apart decides. Elements tied on every criterion keep their
    /// relative order. With no criteria this is [`Aggregator::sort`].
    pub fn sort_by<I>(&self, criteria: I) -> AggregateResult<Aggregator>
    where
        I: IntoIterator,
        I::Item: Into<SortBy>,
    {
        let criteria: Vec<SortBy> = criteria.into_iter().map(Into::into).collect();
        if criteria.is_empty() {
            return Ok(self.sort());
        }
        trace!("Sorting {} elements by {} criteria", self.data.len(), criteria.len());

        let keys = criteria
            .iter()
            .map(|criterion| self.extract_all(&criterion.extractor))
            .collect::<AggregateResult<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..self.data.len()).collect();
        order.sort_by(|&a, &b| {
            criteria
                .iter()
                .zip(&keys)
                .map(|(criterion, values)| criterion.compare(&values[a], &values[b]))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Ok(order.into_iter().map(|i| self.data[i].clone()).collect())
    }

    /// Stable sort with a comparator over whole elements.
    pub fn sort_with(&self, compare: impl FnMut(&JsonValue, &JsonValue) -> Ordering) -> Aggregator {
        let mut data = self.data.clone();
        data.sort_by(compare);
        Self::new(data)
    }

    /// Elements in reverse order.
    pub fn reverse(&self) -> Aggregator {
        self.data.iter().rev().cloned().collect()
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Number of elements. Alias of [`Aggregator::count`].
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements satisfying the condition.
    pub fn count_where(&self, condition: impl Into<Condition>) -> AggregateResult<usize> {
        Ok(self.matching(condition.into().into_matcher())?.len())
    }

    /// Whether at least one element satisfies the condition.
    pub fn has(&self, condition: impl Into<Condition>) -> AggregateResult<bool> {
        Ok(self.find(condition)?.is_some())
    }

    /// Whether every element satisfies the condition.
    pub fn all(&self, condition: impl Into<Condition>) -> AggregateResult<bool> {
        let matcher = condition.into().into_matcher();
        for (index, element) in self.data.iter().enumerate() {
            if !matcher.test(element, index)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Sum of the numeric elements. Non-numeric elements are skipped.
    pub fn sum(&self) -> f64 {
        self.data.iter().filter_map(JsonValue::as_f64).sum()
    }

    /// Sum of the numeric extracted values.
    pub fn sum_by(&self, extractor: impl Into<Extractor>) -> AggregateResult<f64> {
        Ok(self
            .extract_all(&extractor.into())?
            .iter()
            .filter_map(JsonValue::as_f64)
            .sum())
    }

    /// Sum divided by the number of elements; `NaN` when empty.
    pub fn avg(&self) -> f64 {
        self.sum() / self.data.len() as f64
    }

    /// Sum of extracted values divided by the number of elements.
    pub fn avg_by(&self, extractor: impl Into<Extractor>) -> AggregateResult<f64> {
        Ok(self.sum_by(extractor)? / self.data.len() as f64)
    }

    /// Concatenate a chunk after the elements.
    pub fn append(&self, chunk: impl Into<Chunk>) -> Aggregator {
        self.append_all([chunk])
    }

    /// Concatenate several chunks, in order, after the elements.
    pub fn append_all<I>(&self, chunks: I) -> Aggregator
    where
        I: IntoIterator,
        I::Item: Into<Chunk>,
    {
        let mut data = self.data.clone();
        for chunk in chunks {
            match chunk.into() {
                Chunk::Items(items) => data.extend(items),
                Chunk::Value(value) => data.push(value),
            }
        }
        Self::new(data)
    }

    /// Drop elements equal to an earlier one.
    pub fn remove_duplicates(&self) -> Aggregator {
        self.first_by_key(self.identity_keys()).into_values().collect()
    }

    /// Keep the first element for every distinct extracted key.
    pub fn remove_duplicates_by(
        &self,
        extractor: impl Into<Extractor>,
    ) -> AggregateResult<Aggregator> {
        let keys = self.extracted_keys(&extractor.into())?;
        Ok(self.first_by_key(keys).into_values().collect())
    }

    /// Elements also present in every other aggregator.
    pub fn common_elements(&self, others: &[&Aggregator]) -> Aggregator {
        let mut survivors = self.first_by_key(self.identity_keys());
        for other in others {
            let keys: HashSet<String> = other.identity_keys().into_iter().collect();
            survivors.retain(|key, _| keys.contains(key));
        }
        survivors.into_values().collect()
    }

    /// Elements whose extracted key is present in every other aggregator.
    ///
    /// The surviving element for a key is the first one carrying it here,
    /// and survivors keep this aggregator's order.
    pub fn common_elements_by(
        &self,
        extractor: impl Into<Extractor>,
        others: &[&Aggregator],
    ) -> AggregateResult<Aggregator> {
        let extractor = extractor.into();
        let mut survivors = self.first_by_key(self.extracted_keys(&extractor)?);
        for other in others {
            let keys: HashSet<String> = other.extracted_keys(&extractor)?.into_iter().collect();
            survivors.retain(|key, _| keys.contains(key));
        }
        trace!(
            "Intersection of {} operands kept {} keys",
            others.len() + 1,
            survivors.len()
        );
        Ok(survivors.into_values().collect())
    }

    /// Intersection of several aggregators by extracted key.
    ///
    /// The first operand decides which element represents a key and the
    /// order of the result. No operands yield an empty aggregator.
    pub fn intersect(
        extractor: impl Into<Extractor>,
        operands: &[&Aggregator],
    ) -> AggregateResult<Aggregator> {
        match operands.split_first() {
            Some((first, rest)) => first.common_elements_by(extractor, rest),
            None => Ok(Self::default()),
        }
    }

    /// A decoupled copy of the elements.
    pub fn to_array(&self) -> Vec<JsonValue> {
        self.data.clone()
    }

    /// Map from stringified element to its first occurrence.
    pub fn to_map(&self) -> IndexMap<String, JsonValue> {
        self.first_by_key(self.identity_keys())
    }

    /// Map from stringified extracted key to the first element carrying it.
    pub fn to_map_by(
        &self,
        extractor: impl Into<Extractor>,
    ) -> AggregateResult<IndexMap<String, JsonValue>> {
        let keys = self.extracted_keys(&extractor.into())?;
        Ok(self.first_by_key(keys))
    }

    /// Partition by one or more extractors.
    ///
    /// The first extractor splits the elements into a group of aggregators.
    /// Every further extractor re-partitions each leaf of the previous level,
    /// so the result nests one level per extractor with aggregators only at
    /// the bottom. No extractors yield an empty group.
    pub fn group<I>(&self, extractors: I) -> AggregateResult<Group>
    where
        I: IntoIterator,
        I::Item: Into<Extractor>,
    {
        let extractors: Vec<Extractor> = extractors.into_iter().map(Into::into).collect();
        let Some((first, rest)) = extractors.split_first() else {
            return Ok(Group::default());
        };

        let mut root = self.partition(first)?;

        // Key paths of the groups at the current depth.
        let mut frontier: Vec<Vec<String>> = vec![Vec::new()];
        for extractor in rest {
            let mut next = Vec::new();
            for path in frontier {
                let Some(group) = root.descend_mut(&path) else {
                    continue;
                };
                for key in group.key_list() {
                    let nested = match group.get(&key) {
                        Some(Partition::Items(items)) => items.partition(extractor)?,
                        _ => continue,
                    };
                    group.set(key.clone(), nested);

                    let mut child = path.clone();
                    child.push(key);
                    next.push(child);
                }
            }
            frontier = next;
        }

        trace!(
            "Grouped {} elements into {} keys over {} levels",
            self.data.len(),
            root.len(),
            extractors.len()
        );
        Ok(root)
    }

    fn partition(&self, extractor: &Extractor) -> AggregateResult<Group> {
        let mut buckets: IndexMap<String, Vec<JsonValue>> = IndexMap::new();
        for (index, element) in self.data.iter().enumerate() {
            let key = key_string(&extractor.extract(element, index)?);
            buckets.entry(key).or_default().push(element.clone());
        }
        Ok(Group::new(
            buckets
                .into_iter()
                .map(|(key, items)| (key, Partition::Items(Self::new(items))))
                .collect(),
        ))
    }

    fn matching(&self, matcher: Matcher) -> AggregateResult<Vec<&JsonValue>> {
        let mut matched = Vec::new();
        for (index, element) in self.data.iter().enumerate() {
            if matcher.test(element, index)? {
                matched.push(element);
            }
        }
        Ok(matched)
    }

    fn extract_all(&self, extractor: &Extractor) -> AggregateResult<Vec<JsonValue>> {
        self.data
            .iter()
            .enumerate()
            .map(|(index, element)| extractor.extract(element, index))
            .collect()
    }

    fn identity_keys(&self) -> Vec<String> {
        self.data.iter().map(key_string).collect()
    }

    fn extracted_keys(&self, extractor: &Extractor) -> AggregateResult<Vec<String>> {
        Ok(self.extract_all(extractor)?.iter().map(key_string).collect())
    }

    /// First element per key, in first-occurrence order.
    fn first_by_key(&self, keys: Vec<String>) -> IndexMap<String, JsonValue> {
        let mut map = IndexMap::new();
        for (key, element) in keys.into_iter().zip(&self.data) {
            map.entry(key).or_insert_with(|| element.clone());
        }
        map
    }
}

impl From<Vec<JsonValue>> for Aggregator {
    fn from(data: Vec<JsonValue>) -> Self {
        Self::new(data)
    }
}

impl TryFrom<JsonValue> for Aggregator {
    type Error = AggregateError;

    fn try_from(value: JsonValue) -> AggregateResult<Self> {
        Self::from_value(value)
    }
}

impl FromIterator<JsonValue> for Aggregator {
    fn from_iter<I: IntoIterator<Item = JsonValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Aggregator {
    type Item = JsonValue;
    type IntoIter = std::vec::IntoIter<JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Aggregator {
    type Item = &'a JsonValue;
    type IntoIter = std::slice::Iter<'a, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
