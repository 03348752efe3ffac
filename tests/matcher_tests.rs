/// Integration tests for the standalone predicate builders.
///
/// Predicates are applied to plain slices through `Matcher::select` and to
/// aggregators through `filter`.
use koru_aggregate::matchers::{
    all, all_by, always, and, eq, eq_by, gt, gt_by, gte, gte_by, is_null, is_null_by, lt, lt_by,
    lte, lte_by, neq, neq_by, not, one, one_by, or,
};
use koru_aggregate::{
    AggregateError, Aggregator, Check, Condition, Extractor, JsonValue, Matcher, json,
};
use std::cell::Cell;
use std::rc::Rc;

fn numbers() -> Vec<JsonValue> {
    vec![json!(1), json!(2), json!(3)]
}

fn valued() -> Vec<JsonValue> {
    vec![json!({"value": 1}), json!({"value": 2}), json!({"value": 3})]
}

fn pairs() -> Vec<JsonValue> {
    vec![
        json!({"a": 1, "b": 1}),
        json!({"a": 2, "b": 2}),
        json!({"a": 3, "b": 3}),
    ]
}

fn add() -> Extractor {
    Extractor::from_fn(|e| json!(e["a"].as_i64().unwrap_or(0) + e["b"].as_i64().unwrap_or(0)))
}

fn divisible_by(n: i64) -> Matcher {
    Matcher::new(move |v| v.as_i64().is_some_and(|x| x % n == 0))
}

fn counting(calls: &Rc<Cell<usize>>, result: bool) -> Matcher {
    let calls = calls.clone();
    Matcher::new(move |_| {
        calls.set(calls.get() + 1);
        result
    })
}

#[test]
fn test_eq() {
    assert_eq!(eq(2).select(&numbers()).unwrap(), vec![json!(2)]);
    assert_eq!(
        eq_by("value", 2).select(&valued()).unwrap(),
        vec![json!({"value": 2})]
    );
    assert_eq!(
        eq_by(add(), 4).select(&pairs()).unwrap(),
        vec![json!({"a": 2, "b": 2})]
    );
}

#[test]
fn test_eq_treats_integers_and_floats_alike() {
    assert_eq!(
        eq(2).select(&[json!(2.0), json!("2")]).unwrap(),
        vec![json!(2.0)]
    );
}

#[test]
fn test_neq() {
    assert_eq!(neq(2).select(&numbers()).unwrap(), vec![json!(1), json!(3)]);
    assert_eq!(
        neq_by("value", 2).select(&valued()).unwrap(),
        vec![json!({"value": 1}), json!({"value": 3})]
    );
    assert_eq!(
        neq_by(add(), 4).select(&pairs()).unwrap(),
        vec![json!({"a": 1, "b": 1}), json!({"a": 3, "b": 3})]
    );
}

#[test]
fn test_gt() {
    assert_eq!(gt(2).select(&numbers()).unwrap(), vec![json!(3)]);
    assert_eq!(
        gt_by("value", 2).select(&valued()).unwrap(),
        vec![json!({"value": 3})]
    );
    assert_eq!(
        gt_by(add(), 4).select(&pairs()).unwrap(),
        vec![json!({"a": 3, "b": 3})]
    );
}

#[test]
fn test_lt() {
    assert_eq!(lt(2).select(&numbers()).unwrap(), vec![json!(1)]);
    assert_eq!(
        lt_by("value", 2).select(&valued()).unwrap(),
        vec![json!({"value": 1})]
    );
    assert_eq!(
        lt_by(add(), 4).select(&pairs()).unwrap(),
        vec![json!({"a": 1, "b": 1})]
    );
}

#[test]
fn test_gte() {
    assert_eq!(gte(2).select(&numbers()).unwrap(), vec![json!(2), json!(3)]);
    assert_eq!(
        gte_by("value", 2).select(&valued()).unwrap(),
        vec![json!({"value": 2}), json!({"value": 3})]
    );
    assert_eq!(
        gte_by(add(), 4).select(&pairs()).unwrap(),
        vec![json!({"a": 2, "b": 2}), json!({"a": 3, "b": 3})]
    );
}

#[test]
fn test_lte() {
    assert_eq!(lte(2).select(&numbers()).unwrap(), vec![json!(1), json!(2)]);
    assert_eq!(
        lte_by("value", 2).select(&valued()).unwrap(),
        vec![json!({"value": 1}), json!({"value": 2})]
    );
    assert_eq!(
        lte_by(add(), 4).select(&pairs()).unwrap(),
        vec![json!({"a": 1, "b": 1}), json!({"a": 2, "b": 2})]
    );
}

#[test]
fn test_ordering_across_kinds_never_holds() {
    let mixed = vec![json!("3"), json!(true), json!([3])];
    assert!(gt(2).select(&mixed).unwrap().is_empty());
    assert!(lt(2).select(&mixed).unwrap().is_empty());
}

#[test]
fn test_is_null() {
    let data = vec![json!(1), json!(null), json!(""), json!(0)];
    assert_eq!(is_null().select(&data).unwrap(), vec![json!(null)]);
}

#[test]
fn test_is_null_by_key_and_function() {
    let data = vec![
        json!({"value": 1}),
        json!({}),
        json!({"value": null}),
        json!({"value": ""}),
        json!({"value": 0}),
    ];
    let expected = vec![json!({}), json!({"value": null})];

    assert_eq!(is_null_by("value").select(&data).unwrap(), expected);
    assert_eq!(
        is_null_by(Extractor::from_fn(|e| e.get("value").cloned().unwrap_or(JsonValue::Null)))
            .select(&data)
            .unwrap(),
        expected
    );
}

#[test]
fn test_not() {
    let data = vec![json!(1), json!(null), json!(""), json!(0)];
    assert_eq!(
        not(is_null()).select(&data).unwrap(),
        vec![json!(1), json!(""), json!(0)]
    );
}

#[test]
fn test_and() {
    assert_eq!(and([gt(1), gt(2)]).select(&numbers()).unwrap(), vec![json!(3)]);

    let data: Vec<JsonValue> = [2, 4, 6, 8, 10, 12].into_iter().map(JsonValue::from).collect();
    let big = Matcher::new(|v| v.as_i64() > Some(10));
    assert_eq!(
        and([divisible_by(2), divisible_by(3), big]).select(&data).unwrap(),
        vec![json!(12)]
    );
}

#[test]
fn test_and_with_field_specification() {
    let data = vec![
        json!({"a": 1, "b": 2, "c": 2}),
        json!({"a": 2, "b": 1, "c": 2}),
        json!({"a": 2, "b": 2, "c": 1}),
        json!({"a": 2, "b": 2, "c": 2}),
    ];
    let matcher = and([
        Condition::fields([("a", Check::from(2)), ("b", Check::from(divisible_by(2)))]),
        Condition::from(eq_by("c", 2)),
    ]);

    assert_eq!(
        matcher.select(&data).unwrap(),
        vec![json!({"a": 2, "b": 2, "c": 2})]
    );
}

#[test]
fn test_and_stops_at_first_false() {
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    and([counting(&first, false), counting(&second, true)])
        .select(&numbers())
        .unwrap();

    assert_eq!(first.get(), 3);
    assert_eq!(second.get(), 0);
}

#[test]
fn test_or() {
    assert_eq!(
        or([lt(2), gt(2)]).select(&numbers()).unwrap(),
        vec![json!(1), json!(3)]
    );

    let data: Vec<JsonValue> = (1..=12).map(JsonValue::from).collect();
    let big = Matcher::new(|v| v.as_i64() > Some(10));
    let expected: Vec<JsonValue> = [2, 3, 4, 6, 8, 9, 10, 11, 12]
        .into_iter()
        .map(JsonValue::from)
        .collect();
    assert_eq!(
        or([divisible_by(2), divisible_by(3), big]).select(&data).unwrap(),
        expected
    );
}

#[test]
fn test_or_with_field_specification() {
    let data = vec![
        json!({"a": 1, "b": 1, "c": 1}),
        json!({"a": 2, "b": 2, "c": 1}),
        json!({"a": 1, "b": 1, "c": 2}),
    ];
    let matcher = or([
        Condition::fields([("a", Check::from(2)), ("b", Check::from(divisible_by(2)))]),
        Condition::from(eq_by("c", 2)),
    ]);

    assert_eq!(
        matcher.select(&data).unwrap(),
        vec![
            json!({"a": 2, "b": 2, "c": 1}),
            json!({"a": 1, "b": 1, "c": 2}),
        ]
    );
}

#[test]
fn test_or_stops_at_first_true() {
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    or([counting(&first, true), counting(&second, false)])
        .select(&numbers())
        .unwrap();

    assert_eq!(first.get(), 3);
    assert_eq!(second.get(), 0);
}

#[test]
fn test_and_or_accept_literals_and_objects() {
    let data = vec![json!({"a": 1}), json!({"a": 2}), json!(2)];

    assert_eq!(
        or([json!(2), json!({"a": 1})]).select(&data).unwrap(),
        vec![json!({"a": 1}), json!(2)]
    );
    assert!(and([json!(2), json!({"a": 2})]).select(&data).unwrap().is_empty());
}

#[test]
fn test_empty_and_or() {
    assert_eq!(and(Vec::<Matcher>::new()).select(&numbers()).unwrap().len(), 3);
    assert!(or(Vec::<Matcher>::new()).select(&numbers()).unwrap().is_empty());
}

fn quantified() -> Vec<JsonValue> {
    vec![
        json!({"a": 2, "b": 4}),
        json!({"a": 1, "b": 2}),
        json!({"a": 2, "b": 1}),
        json!({"a": 1, "b": 3}),
    ]
}

fn quantified_keys() -> Vec<Extractor> {
    vec![Extractor::from("a"), Extractor::from_fn(|e| e["b"].clone())]
}

#[test]
fn test_all_over_aggregator_keys() {
    let aggregator = Aggregator::new(quantified());
    let result = aggregator
        .filter(Condition::keys(quantified_keys(), all(divisible_by(2))))
        .unwrap();
    assert_eq!(result.to_array(), vec![json!({"a": 2, "b": 4})]);
}

#[test]
fn test_all_by() {
    assert_eq!(
        all_by(quantified_keys(), divisible_by(2))
            .select(&quantified())
            .unwrap(),
        vec![json!({"a": 2, "b": 4})]
    );
    assert_eq!(
        all_by(["a"], divisible_by(2)).select(&quantified()).unwrap(),
        vec![json!({"a": 2, "b": 4}), json!({"a": 2, "b": 1})]
    );
}

#[test]
fn test_one_over_aggregator_keys() {
    let aggregator = Aggregator::new(quantified());
    let result = aggregator
        .filter(Condition::keys(quantified_keys(), one(divisible_by(2))))
        .unwrap();
    assert_eq!(
        result.to_array(),
        vec![
            json!({"a": 2, "b": 4}),
            json!({"a": 1, "b": 2}),
            json!({"a": 2, "b": 1}),
        ]
    );
}

#[test]
fn test_one_by() {
    assert_eq!(
        one_by(quantified_keys(), divisible_by(2))
            .select(&quantified())
            .unwrap(),
        vec![
            json!({"a": 2, "b": 4}),
            json!({"a": 1, "b": 2}),
            json!({"a": 2, "b": 1}),
        ]
    );
    assert_eq!(
        one_by(["a"], divisible_by(2)).select(&quantified()).unwrap(),
        vec![json!({"a": 2, "b": 4}), json!({"a": 2, "b": 1})]
    );
}

#[test]
fn test_all_and_one_on_empty_arrays() {
    let empty = vec![json!([])];
    assert_eq!(all(divisible_by(2)).select(&empty).unwrap().len(), 1);
    assert!(one(divisible_by(2)).select(&empty).unwrap().is_empty());
}

#[test]
fn test_all_without_keys_rejects_non_arrays() {
    let err = all(divisible_by(2)).select(&[json!(2)]).unwrap_err();
    assert!(matches!(err, AggregateError::Construction { .. }));
}

#[test]
fn test_always() {
    assert_eq!(always().select(&numbers()).unwrap(), numbers());
}
