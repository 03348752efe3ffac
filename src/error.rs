/// Error types for aggregation operations.
///
/// Only malformed syntax and violated cardinality expectations are errors.
/// Structural absence (missing keys, indices past the end, empty sequences)
/// is data and resolves to `null`/`NaN` instead.
use thiserror::Error;

/// The main error type for aggregation operations.
///
/// All fallible operations return `Result<T, AggregateError>`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// An aggregator or group was built from input of the wrong shape
    #[error("Construction error: {reason}")]
    Construction {
        /// Description of what was expected
        reason: String,
    },

    /// A path segment carries malformed bracket-index syntax
    #[error("Malformatted key: {key}")]
    MalformedKey {
        /// The offending key segment
        key: String,
    },

    /// An index access was attempted on a value that is not an array
    #[error("Cannot access array element of {found} (key '{key}')")]
    NotAnArray {
        /// The key segment that carried the index
        key: String,
        /// Kind of the value that was found instead
        found: &'static str,
    },

    /// A uniqueness expectation was violated
    #[error("Expected at most one match, found {count}")]
    MultipleMatches {
        /// Number of elements that matched
        count: usize,
    },
}

impl AggregateError {
    /// Shorthand for a construction error.
    pub(crate) fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }
}

/// Result type alias for aggregation operations.
pub type AggregateResult<T> = Result<T, AggregateError>;
