/// Standalone predicate builders.
///
/// Each builder returns a [`Matcher`] that can be passed to any aggregator
/// operation taking a condition, nested inside keyed conditions, or used on
/// its own through [`Matcher::select`].
///
/// # Example
///
/// ```ignore
/// use koru_aggregate::matchers::{and, gt, lt};
/// use koru_aggregate::json;
///
/// let values = vec![json!(1), json!(2), json!(3)];
/// let middle = and([gt(1), lt(3)]);
/// assert_eq!(middle.select(&values)?, vec![json!(2)]);
/// ```
use crate::condition::{Condition, Matcher};
use crate::error::{AggregateError, AggregateResult};
use crate::extractor::{Extractor, compare_values, values_equal};
use crate::fuzzy::FuzzyMatcher;
use crate::path::kind_of;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

type Comparison = fn(&JsonValue, &JsonValue) -> bool;

fn compare(key: Option<Extractor>, reference: JsonValue, inner: Comparison) -> Matcher {
    match key {
        None => Matcher::new(move |value| inner(value, &reference)),
        Some(extractor) => Matcher::try_new(move |value, index| {
            Ok(inner(&extractor.extract(value, index)?, &reference))
        }),
    }
}

fn ordered(value: &JsonValue, reference: &JsonValue, accept: &[Ordering]) -> bool {
    compare_values(value, reference).is_some_and(|ord| accept.contains(&ord))
}

/// Value strictly equals the reference.
pub fn eq(reference: impl Into<JsonValue>) -> Matcher {
    compare(None, reference.into(), values_equal)
}

/// Extracted value strictly equals the reference.
pub fn eq_by(key: impl Into<Extractor>, reference: impl Into<JsonValue>) -> Matcher {
    compare(Some(key.into()), reference.into(), values_equal)
}

/// Value does not strictly equal the reference.
pub fn neq(reference: impl Into<JsonValue>) -> Matcher {
    compare(None, reference.into(), |a, b| !values_equal(a, b))
}

/// Extracted value does not strictly equal the reference.
pub fn neq_by(key: impl Into<Extractor>, reference: impl Into<JsonValue>) -> Matcher {
    compare(Some(key.into()), reference.into(), |a, b| !values_equal(a, b))
}

/// Value is greater than the reference.
pub fn gt(reference: impl Into<JsonValue>) -> Matcher {
    compare(None, reference.into(), |a, b| ordered(a, b, &[Ordering::Greater]))
}

/// Extracted value is greater than the reference.
pub fn gt_by(key: impl Into<Extractor>, reference: impl Into<JsonValue>) -> Matcher {
    compare(Some(key.into()), reference.into(), |a, b| {
        ordered(a, b, &[Ordering::Greater])
    })
}

/// Value is less than the reference.
pub fn lt(reference: impl Into<JsonValue>) -> Matcher {
    compare(None, reference.into(), |a, b| ordered(a, b, &[Ordering::Less]))
}

/// Extracted value is less than the reference.
pub fn lt_by(key: impl Into<Extractor>, reference: impl Into<JsonValue>) -> Matcher {
    compare(Some(key.into()), reference.into(), |a, b| {
        ordered(a, b, &[Ordering::Less])
    })
}

/// Value is greater than or equal to the reference.
pub fn gte(reference: impl Into<JsonValue>) -> Matcher {
    compare(None, reference.into(), |a, b| {
        ordered(a, b, &[Ordering::Greater, Ordering::Equal])
    })
}

/// Extracted value is greater than or equal to the reference.
pub fn gte_by(key: impl Into<Extractor>, reference: impl Into<JsonValue>) -> Matcher {
    compare(Some(key.into()), reference.into(), |a, b| {
        ordered(a, b, &[Ordering::Greater, Ordering::Equal])
    })
}

/// Value is less than or equal to the reference.
pub fn lte(reference: impl Into<JsonValue>) -> Matcher {
    compare(None, reference.into(), |a, b| {
        ordered(a, b, &[Ordering::Less, Ordering::Equal])
    })
}

/// Extracted value is less than or equal to the reference.
pub fn lte_by(key: impl Into<Extractor>, reference: impl Into<JsonValue>) -> Matcher {
    compare(Some(key.into()), reference.into(), |a, b| {
        ordered(a, b, &[Ordering::Less, Ordering::Equal])
    })
}

/// Value is `null` or missing.
pub fn is_null() -> Matcher {
    Matcher::new(JsonValue::is_null)
}

/// Extracted value is `null` or missing.
pub fn is_null_by(key: impl Into<Extractor>) -> Matcher {
    let extractor = key.into();
    Matcher::try_new(move |value, index| Ok(extractor.extract(value, index)?.is_null()))
}

/// Negate a predicate.
pub fn not(matcher: Matcher) -> Matcher {
    Matcher::try_new(move |value, index| Ok(!matcher.test(value, index)?))
}

/// All conditions hold. Evaluation stops at the first one that does not.
pub fn and<I>(conditions: I) -> Matcher
where
    I: IntoIterator,
    I::Item: Into<Condition>,
{
    let matchers: Vec<Matcher> = conditions
        .into_iter()
        .map(|condition| condition.into().into_matcher())
        .collect();

    Matcher::try_new(move |value, index| {
        for matcher in &matchers {
            if !matcher.test(value, index)? {
                return Ok(false);
            }
        }
        Ok(true)
    })
}

/// At least one condition holds. Evaluation stops at the first one that does.
pub fn or<I>(conditions: I) -> Matcher
where
    I: IntoIterator,
    I::Item: Into<Condition>,
{
    let matchers: Vec<Matcher> = conditions
        .into_iter()
        .map(|condition| condition.into().into_matcher())
        .collect();

    Matcher::try_new(move |value, index| {
        for matcher in &matchers {
            if matcher.test(value, index)? {
                return Ok(true);
            }
        }
        Ok(false)
    })
}

#[derive(Clone, Copy)]
enum Quantifier {
    All,
    One,
}

fn quantify(keys: Option<Vec<Extractor>>, matcher: Matcher, quantifier: Quantifier) -> Matcher {
    Matcher::try_new(move |value, index| {
        let extracted;
        let values = match &keys {
            Some(keys) => {
                extracted = keys
                    .iter()
                    .map(|key| key.extract(value, index))
                    .collect::<AggregateResult<Vec<_>>>()?;
                &extracted
            }
            None => value.as_array().ok_or_else(|| {
                AggregateError::construction(format!(
                    "expected array of values, found {}",
                    kind_of(value)
                ))
            })?,
        };

        for (i, item) in values.iter().enumerate() {
            let holds = matcher.test(item, i)?;
            match quantifier {
                Quantifier::All if !holds => return Ok(false),
                Quantifier::One if holds => return Ok(true),
                _ => {}
            }
        }
        Ok(matches!(quantifier, Quantifier::All))
    })
}

/// Every value of an array satisfies the predicate.
///
/// Meant for multi-key conditions, which hand the extracted values over
/// as an array.
pub fn all(matcher: Matcher) -> Matcher {
    quantify(None, matcher, Quantifier::All)
}

/// Every extracted value satisfies the predicate.
pub fn all_by<I, E>(keys: I, matcher: Matcher) -> Matcher
where
    I: IntoIterator<Item = E>,
    E: Into<Extractor>,
{
    let keys = keys.into_iter().map(Into::into).collect();
    quantify(Some(keys), matcher, Quantifier::All)
}

/// At least one value of an array satisfies the predicate.
pub fn one(matcher: Matcher) -> Matcher {
    quantify(None, matcher, Quantifier::One)
}

/// At least one extracted value satisfies the predicate.
pub fn one_by<I, E>(keys: I, matcher: Matcher) -> Matcher
where
    I: IntoIterator<Item = E>,
    E: Into<Extractor>,
{
    let keys = keys.into_iter().map(Into::into).collect();
    quantify(Some(keys), matcher, Quantifier::One)
}

/// Value fuzzily matches the reference, using the default configuration.
///
/// See [`FuzzyMatcher::matcher`] for a configured variant.
pub fn fuzzy_match(reference: impl Into<String>) -> Matcher {
    FuzzyMatcher::default().matcher(reference)
}

/// Extracted value fuzzily matches the reference, using the default
/// configuration.
pub fn fuzzy_match_by(key: impl Into<Extractor>, reference: impl Into<String>) -> Matcher {
    FuzzyMatcher::default().matcher_by(key, reference)
}

/// A predicate that always holds.
pub fn always() -> Matcher {
    Matcher::new(|_| true)
}
