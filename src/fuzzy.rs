/// Fuzzy text matching.
///
/// Scores how well a needle matches a haystack:
///
/// 1. Both strings are optionally lowercased.
/// 2. The needle is split into words; non-word characters are stripped and
///    words shorter than `min_length` are dropped.
/// 3. If any needle word occurs verbatim inside the haystack, the score is
///    `1` and scoring stops there.
/// 4. Otherwise every needle word is compared to every haystack word with
///    Jaro-Winkler similarity and the best pair wins.
///
/// The result carries both inputs with the winning word wrapped in `<b>`.
///
/// Configuration is owned by each [`FuzzyMatcher`]; there is no global
/// state.
use crate::condition::Matcher;
use crate::extractor::{Extractor, is_truthy};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::trace;

/// Similarity above which the common-prefix boost applies.
const BOOST_THRESHOLD: f64 = 0.7;

/// Longest common prefix that contributes to the boost.
const MAX_PREFIX: usize = 4;

/// Boost per common-prefix character.
const PREFIX_SCALE: f64 = 0.1;

/// Fuzzy matcher configuration.
///
/// Field names serialize in camelCase (`ignoreCase`, `minLength`,
/// `fuzzyLimit`); missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FuzzyConfig {
    /// Lowercase needle and haystack before scoring.
    pub ignore_case: bool,
    /// Minimum word length considered for matching.
    pub min_length: usize,
    /// Minimum score for a value to count as a match (0.0 - 1.0).
    pub fuzzy_limit: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            ignore_case: true,
            min_length: 3,
            fuzzy_limit: 0.75,
        }
    }
}

/// Outcome of scoring a needle against a haystack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyResult {
    /// Similarity score (0.0 - 1.0).
    #[serde(rename = "match")]
    pub score: f64,
    /// Annotated needle and haystack, in that order.
    pub matches: [String; 2],
}

/// A configured fuzzy matcher.
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    config: FuzzyConfig,
}

impl FuzzyMatcher {
    /// Create a matcher with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with the given configuration.
    pub fn with_config(config: FuzzyConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Apply every known key of a configuration object.
    ///
    /// Unknown keys and values of the wrong type are ignored.
    pub fn configure(&mut self, config: &JsonValue) -> &mut Self {
        if let JsonValue::Object(map) = config {
            for (key, value) in map {
                self.configure_key(key, value.clone());
            }
        }
        self
    }

    /// Set a single configuration key.
    ///
    /// Unknown keys and values of the wrong type are ignored.
    pub fn configure_key(&mut self, key: &str, value: impl Into<JsonValue>) -> &mut Self {
        let value = value.into();
        let applied = match key {
            "ignoreCase" => value.as_bool().inspect(|v| self.config.ignore_case = *v).is_some(),
            "minLength" => value
                .as_u64()
                .or_else(|| {
                    value
                        .as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                        .map(|f| f as u64)
                })
                .inspect(|v| self.config.min_length = *v as usize)
                .is_some(),
            "fuzzyLimit" => value.as_f64().inspect(|v| self.config.fuzzy_limit = *v).is_some(),
            _ => false,
        };
        if !applied {
            trace!("Ignoring fuzzy config {} = {}", key, value);
        }
        self
    }

    /// Read a configuration value by its key. Unknown keys yield `None`.
    pub fn get_config(&self, key: &str) -> Option<JsonValue> {
        serde_json::to_value(&self.config).ok()?.get(key).cloned()
    }

    /// Score a needle against a haystack.
    pub fn get_fuzzy_result(&self, needle: &str, haystack: &str) -> FuzzyResult {
        let (needle, haystack) = if self.config.ignore_case {
            (needle.to_lowercase(), haystack.to_lowercase())
        } else {
            (needle.to_string(), haystack.to_string())
        };

        let needle_tokens = self.tokenize(&needle);

        if let Some(result) = substring_match(&needle_tokens, &haystack) {
            return result;
        }

        let haystack_tokens = self.tokenize(&haystack);
        closest_word_match(&needle_tokens, &haystack_tokens)
    }

    /// Whether a value fuzzily matches the reference.
    ///
    /// Only non-empty strings can match.
    pub fn is_match(&self, reference: &str, value: &JsonValue) -> bool {
        is_truthy(value)
            && value.as_str().is_some_and(|haystack| {
                self.get_fuzzy_result(reference, haystack).score >= self.config.fuzzy_limit
            })
    }

    /// A predicate matching values against the reference.
    ///
    /// The matcher keeps a snapshot of the current configuration.
    pub fn matcher(&self, reference: impl Into<String>) -> Matcher {
        let fuzzy = self.clone();
        let reference = reference.into();
        Matcher::new(move |value| fuzzy.is_match(&reference, value))
    }

    /// A predicate matching extracted values against the reference.
    pub fn matcher_by(&self, key: impl Into<Extractor>, reference: impl Into<String>) -> Matcher {
        let fuzzy = self.clone();
        let extractor = key.into();
        let reference = reference.into();
        Matcher::try_new(move |value, index| {
            Ok(fuzzy.is_match(&reference, &extractor.extract(value, index)?))
        })
    }

    fn tokenize(&self, term: &str) -> Vec<String> {
        term.split(' ')
            .map(|word| {
                word.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect::<String>()
            })
            .filter(|word| word.len() >= self.config.min_length)
            .collect()
    }
}

fn join_with_match(tokens: &[String], match_index: Option<usize>) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            if Some(i) == match_index {
                format!("<b>{token}</b>")
            } else {
                token.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn substring_match(needle_tokens: &[String], haystack: &str) -> Option<FuzzyResult> {
    needle_tokens.iter().enumerate().find_map(|(i, needle)| {
        let start = haystack.find(needle.as_str())?;
        let end = start + needle.len();
        Some(FuzzyResult {
            score: 1.0,
            matches: [
                join_with_match(needle_tokens, Some(i)),
                format!(
                    "{}<b>{}</b>{}",
                    &haystack[..start],
                    &haystack[start..end],
                    &haystack[end..]
                ),
            ],
        })
    })
}

fn closest_word_match(needle_tokens: &[String], haystack_tokens: &[String]) -> FuzzyResult {
    let mut best = 0.0;
    let mut best_pair: Option<(usize, usize)> = None;

    for (i, a) in needle_tokens.iter().enumerate() {
        for (j, b) in haystack_tokens.iter().enumerate() {
            let score = jaro_winkler(a.as_bytes(), b.as_bytes());
            if score > best {
                best = score;
                best_pair = Some((i, j));
            }
        }
    }

    FuzzyResult {
        score: best,
        matches: [
            join_with_match(needle_tokens, best_pair.map(|(i, _)| i)),
            join_with_match(haystack_tokens, best_pair.map(|(_, j)| j)),
        ],
    }
}

/// Jaro similarity with a Winkler common-prefix boost.
pub fn jaro_winkler(lhs: &[u8], rhs: &[u8]) -> f64 {
    if lhs.is_empty() || rhs.is_empty() {
        return 0.0;
    }
    if lhs == rhs {
        return 1.0;
    }

    // Negative for single-character inputs, which then never match.
    let range = (lhs.len().max(rhs.len()) / 2) as isize - 1;
    let last = rhs.len() as isize - 1;
    let mut lhs_matched = vec![false; lhs.len()];
    let mut rhs_matched = vec![false; rhs.len()];
    let mut matches = 0usize;

    for (i, &ch) in lhs.iter().enumerate() {
        let i = i as isize;
        let low = if i >= range { i - range } else { 0 };
        let high = (i + range).min(last);

        let mut j = low;
        while j <= high {
            let k = j as usize;
            if !rhs_matched[k] && rhs[k] == ch {
                matches += 1;
                lhs_matched[i as usize] = true;
                rhs_matched[k] = true;
                break;
            }
            j += 1;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut next = 0usize;
    let mut transpositions = 0usize;
    for (i, &ch) in lhs.iter().enumerate() {
        if !lhs_matched[i] {
            continue;
        }
        let mut j = next;
        while j < rhs.len() {
            if rhs_matched[j] {
                next = j + 1;
                break;
            }
            j += 1;
        }
        if rhs.get(j) != Some(&ch) {
            transpositions += 1;
        }
    }

    let m = matches as f64;
    let mut weight = (m / lhs.len() as f64
        + m / rhs.len() as f64
        + (m - transpositions as f64 / 2.0) / m)
        / 3.0;

    if weight > BOOST_THRESHOLD {
        let prefix = lhs
            .iter()
            .zip(rhs)
            .take(MAX_PREFIX)
            .take_while(|(a, b)| a == b)
            .count();
        weight += prefix as f64 * PREFIX_SCALE * (1.0 - weight);
    }

    weight
}
