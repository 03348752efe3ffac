/// Condition evaluation.
///
/// Every querying operation accepts a [`Condition`], which may take one of
/// several shapes:
///
/// - a predicate over the element (`Condition::Test`)
/// - a literal compared against the element (`Condition::Literal`)
/// - a key plus a predicate or literal (`Condition::key`)
/// - several keys plus a predicate over the extracted values, or a literal
///   every extracted value must equal (`Condition::keys`)
/// - a per-field specification, all of which must hold (`Condition::fields`,
///   or any JSON object)
///
/// All of them normalize into a single [`Matcher`], the
/// `(element, index) -> bool` predicate the operations run.
///
/// # Example
///
/// ```ignore
/// use koru_aggregate::{Condition, Matcher, json};
///
/// let adult = Condition::key("age", Matcher::new(|age| age.as_i64() >= Some(18)));
/// let alice = Condition::from(json!({"name": "Alice"}));
/// ```
use crate::error::AggregateResult;
use crate::extractor::{Extractor, values_equal};
use crate::path::KeyPath;
use serde_json::Value as JsonValue;
use std::fmt;
use std::rc::Rc;

/// Signature of a normalized predicate: `(value, index) -> bool`.
pub type PredicateFn = dyn Fn(&JsonValue, usize) -> AggregateResult<bool>;

/// A normalized predicate.
///
/// Matchers are cheap to clone and can be used on their own, outside an
/// aggregator, through [`Matcher::test`] and [`Matcher::select`].
#[derive(Clone)]
pub struct Matcher(Rc<PredicateFn>);

impl Matcher {
    /// Build a matcher from a predicate over the value.
    pub fn new(f: impl Fn(&JsonValue) -> bool + 'static) -> Self {
        Self(Rc::new(move |value, _| Ok(f(value))))
    }

    /// Build a matcher from a predicate over the value and its index.
    pub fn indexed(f: impl Fn(&JsonValue, usize) -> bool + 'static) -> Self {
        Self(Rc::new(move |value, index| Ok(f(value, index))))
    }

    /// Build a matcher from a fallible predicate.
    pub fn try_new(f: impl Fn(&JsonValue, usize) -> AggregateResult<bool> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Test a single value.
    pub fn test(&self, value: &JsonValue, index: usize) -> AggregateResult<bool> {
        (self.0)(value, index)
    }

    /// Keep the values of a slice that satisfy this matcher, in order.
    pub fn select(&self, values: &[JsonValue]) -> AggregateResult<Vec<JsonValue>> {
        let mut selected = Vec::new();
        for (index, value) in values.iter().enumerate() {
            if self.test(value, index)? {
                selected.push(value.clone());
            }
        }
        Ok(selected)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matcher(..)")
    }
}

/// Right-hand side of a keyed condition.
#[derive(Debug, Clone)]
pub enum Check {
    /// The extracted value must satisfy a predicate.
    Test(Matcher),
    /// The extracted value must strictly equal a literal.
    Equals(JsonValue),
}

impl Check {
    fn holds(&self, value: &JsonValue, index: usize) -> AggregateResult<bool> {
        match self {
            Check::Test(matcher) => matcher.test(value, index),
            Check::Equals(expected) => Ok(values_equal(value, expected)),
        }
    }
}

impl From<Matcher> for Check {
    fn from(matcher: Matcher) -> Self {
        Check::Test(matcher)
    }
}

impl From<JsonValue> for Check {
    fn from(value: JsonValue) -> Self {
        Check::Equals(value)
    }
}

static NULL: JsonValue = JsonValue::Null;

/// Any condition shape accepted by the querying operations.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A predicate over the element itself.
    Test(Matcher),
    /// The element must strictly equal a literal.
    Literal(JsonValue),
    /// A single extracted value must pass a check.
    Keyed(Extractor, Check),
    /// Several extracted values: a predicate receives them as an array, a
    /// literal must equal every one of them.
    MultiKeyed(Vec<Extractor>, Check),
    /// Per-field checks, all of which must pass.
    Fields(Vec<(KeyPath, Check)>),
}

impl Condition {
    /// A condition over one extracted value.
    pub fn key(extractor: impl Into<Extractor>, check: impl Into<Check>) -> Self {
        Condition::Keyed(extractor.into(), check.into())
    }

    /// A condition over several extracted values.
    pub fn keys<I, E>(extractors: I, check: impl Into<Check>) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Extractor>,
    {
        Condition::MultiKeyed(
            extractors.into_iter().map(Into::into).collect(),
            check.into(),
        )
    }

    /// A per-field specification.
    pub fn fields<I, K, C>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<KeyPath>,
        C: Into<Check>,
    {
        Condition::Fields(
            fields
                .into_iter()
                .map(|(key, check)| (key.into(), check.into()))
                .collect(),
        )
    }

    /// Normalize this condition into a predicate.
    pub fn into_matcher(self) -> Matcher {
        match self {
            Condition::Test(matcher) => matcher,
            Condition::Literal(expected) => {
                Matcher::new(move |element| values_equal(element, &expected))
            }
            Condition::Keyed(extractor, check) => Matcher::try_new(move |element, index| {
                let value = extractor.extract(element, index)?;
                check.holds(&value, index)
            }),
            Condition::MultiKeyed(extractors, check) => {
                Matcher::try_new(move |element, index| match &check {
                    Check::Test(matcher) => {
                        let values = extractors
                            .iter()
                            .map(|extractor| extractor.extract(element, index))
                            .collect::<AggregateResult<Vec<_>>>()?;
                        matcher.test(&JsonValue::Array(values), index)
                    }
                    Check::Equals(expected) => {
                        for extractor in &extractors {
                            if !values_equal(&extractor.extract(element, index)?, expected) {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                })
            }
            Condition::Fields(fields) => Matcher::try_new(move |element, index| {
                for (key, check) in &fields {
                    let value = key.resolve(element)?.unwrap_or(&NULL);
                    if !check.holds(value, index)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }),
        }
    }
}

impl From<Matcher> for Condition {
    fn from(matcher: Matcher) -> Self {
        Condition::Test(matcher)
    }
}

/// JSON objects become per-field specifications, anything else a literal.
impl From<JsonValue> for Condition {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Condition::Fields(
                map.into_iter()
                    .map(|(key, expected)| (KeyPath::new(key), Check::Equals(expected)))
                    .collect(),
            ),
            other => Condition::Literal(other),
        }
    }
}

macro_rules! literal_conversions {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Check {
                fn from(value: $ty) -> Self {
                    Check::Equals(JsonValue::from(value))
                }
            }

            impl From<$ty> for Condition {
                fn from(value: $ty) -> Self {
                    Condition::Literal(JsonValue::from(value))
                }
            }
        )*
    };
}

literal_conversions!(bool, i32, i64, u32, u64, usize, f64, &str, String);

/// Normalize any condition shape into a predicate.
pub fn eval_condition(condition: impl Into<Condition>) -> Matcher {
    condition.into().into_matcher()
}
