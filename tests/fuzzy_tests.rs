/// Integration tests for fuzzy matching.
use koru_aggregate::matchers::{fuzzy_match, fuzzy_match_by};
use koru_aggregate::{Aggregator, FuzzyConfig, FuzzyMatcher, JsonValue, json};

fn search(terms: &[&str], needle: &str) -> Vec<JsonValue> {
    Aggregator::new(terms.iter().map(|t| json!(t)).collect())
        .filter(fuzzy_match(needle))
        .unwrap()
        .to_array()
}

#[test]
fn test_no_result_without_a_match() {
    assert!(search(&["this is a test case"], "foo").is_empty());
}

#[test]
fn test_complete_substring_matches() {
    assert_eq!(
        search(&["this is a test case"], "est"),
        vec![json!("this is a test case")]
    );
}

#[test]
fn test_any_word_of_the_needle_matches() {
    assert_eq!(
        search(&["this is a test case", "this is another case"], "another test"),
        vec![json!("this is a test case"), json!("this is another case")]
    );
}

#[test]
fn test_fuzzy_word_match() {
    assert_eq!(
        search(&["this is a test case"], "rest"),
        vec![json!("this is a test case")]
    );
}

#[test]
fn test_short_words_are_ignored() {
    assert!(search(&["this is a test case"], "is a").is_empty());
}

#[test]
fn test_only_non_empty_strings_match() {
    let data = Aggregator::new(vec![json!(""), json!(null), json!(42), json!(["test"]), json!("test")]);
    assert_eq!(
        data.filter(fuzzy_match("test")).unwrap().to_array(),
        vec![json!("test")]
    );
}

#[test]
fn test_fuzzy_match_by_key() {
    let people = Aggregator::new(vec![
        json!({"name": "Clair"}),
        json!({"name": "Delilah"}),
        json!({"other": "Clair"}),
    ]);
    assert_eq!(
        people.filter(fuzzy_match_by("name", "clare")).unwrap().to_array(),
        vec![json!({"name": "Clair"})]
    );
}

#[test]
fn test_configure_object() {
    let mut fuzzy = FuzzyMatcher::new();
    assert_eq!(fuzzy.get_config("ignoreCase"), Some(json!(true)));

    fuzzy.configure(&json!({"ignoreCase": false}));
    assert_eq!(fuzzy.get_config("ignoreCase"), Some(json!(false)));
}

#[test]
fn test_configure_ignores_unknown_keys() {
    let mut fuzzy = FuzzyMatcher::new();

    fuzzy.configure(&json!({"unknown": true}));
    assert_eq!(fuzzy.get_config("unknown"), None);

    fuzzy.configure_key("unknown", true);
    assert_eq!(fuzzy.get_config("unknown"), None);
    assert_eq!(fuzzy.config(), &FuzzyConfig::default());
}

#[test]
fn test_configure_single_key() {
    let mut fuzzy = FuzzyMatcher::new();
    assert_eq!(fuzzy.get_config("ignoreCase"), Some(json!(true)));

    fuzzy.configure_key("ignoreCase", false);
    assert_eq!(fuzzy.get_config("ignoreCase"), Some(json!(false)));
}

#[test]
fn test_configure_ignores_mistyped_values() {
    let mut fuzzy = FuzzyMatcher::new();
    fuzzy.configure(&json!({"minLength": "two", "fuzzyLimit": 0.9}));

    assert_eq!(fuzzy.get_config("minLength"), Some(json!(3)));
    assert_eq!(fuzzy.get_config("fuzzyLimit"), Some(json!(0.9)));
}

#[test]
fn test_configure_accepts_whole_float_min_length() {
    let mut fuzzy = FuzzyMatcher::new();

    fuzzy.configure(&json!({"minLength": 2.0}));
    assert_eq!(fuzzy.get_config("minLength"), Some(json!(2)));

    fuzzy.configure(&json!({"minLength": 2.5}));
    fuzzy.configure(&json!({"minLength": -1.0}));
    assert_eq!(fuzzy.get_config("minLength"), Some(json!(2)));
}

#[test]
fn test_min_length_changes_what_matches() {
    let terms = Aggregator::new(vec![json!("this is a test case")]);
    let mut fuzzy = FuzzyMatcher::new();

    assert!(terms.filter(fuzzy.matcher("is a")).unwrap().is_empty());

    fuzzy.configure_key("minLength", 2);
    assert_eq!(terms.filter(fuzzy.matcher("is a")).unwrap().count(), 1);
}

#[test]
fn test_matcher_snapshots_configuration() {
    let terms = Aggregator::new(vec![json!("this is a test case")]);
    let mut fuzzy = FuzzyMatcher::new();
    let strict_later = fuzzy.matcher("rest");

    fuzzy.configure_key("fuzzyLimit", 0.95);

    assert_eq!(terms.filter(strict_later).unwrap().count(), 1);
    assert!(terms.filter(fuzzy.matcher("rest")).unwrap().is_empty());
}

#[test]
fn test_matchers_do_not_share_configuration() {
    let mut custom = FuzzyMatcher::with_config(FuzzyConfig {
        ignore_case: false,
        ..FuzzyConfig::default()
    });
    custom.configure_key("minLength", 5);

    assert_eq!(FuzzyMatcher::new().config(), &FuzzyConfig::default());
    assert!(FuzzyMatcher::new().is_match("TEST", &json!("a test")));
    assert!(!custom.is_match("TEST", &json!("a test")));
}

#[test]
fn test_result_annotations() {
    let fuzzy = FuzzyMatcher::new();

    let result = fuzzy.get_fuzzy_result("another test", "this is a test case");
    assert_eq!(result.score, 1.0);
    assert_eq!(result.matches[0], "another <b>test</b>");
    assert_eq!(result.matches[1], "this is a <b>test</b> case");

    let result = fuzzy.get_fuzzy_result("foo", "this is a test case");
    assert!(result.score < 0.75);
}
