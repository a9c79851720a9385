//! Error types and result types for query translation and backend operations.
//!
//! Every fallible operation in this crate returns [`QueryResult<T>`]. Translation
//! errors carry the offending caller input so it can be reported verbatim.

use thiserror::Error;

/// Represents all possible errors raised while translating query text or
/// running a translated query against a backend.
///
/// The first three variants describe malformed caller input. They are never
/// retryable and are surfaced as soon as they occur.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The literal text is not a valid literal, or its value is not JSON-representable.
    #[error("Could not parse literal text ({reason}): {text}")]
    Parse {
        /// What went wrong.
        reason: String,
        /// The text exactly as the caller supplied it.
        text: String,
    },
    /// The identifier field is present but is not a 24 character hexadecimal token.
    #[error("Invalid document identifier: {value}")]
    Identifier {
        /// The offending identifier value.
        value: String,
    },
    /// The identifier inclusion flag could not be classified.
    #[error("Not a boolean value for the identifier flag: {flag}")]
    Config {
        /// The flag as supplied.
        flag: String,
    },
    /// The parsed value has the wrong shape for the operation (e.g. an array where a document is expected).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl QueryError {
    pub(crate) fn parse(reason: impl Into<String>, text: &str) -> Self {
        QueryError::Parse {
            reason: reason.into(),
            text: text.to_string(),
        }
    }

    /// Returns `true` when the error was caused by malformed caller input rather
    /// than by the backend.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            QueryError::Parse { .. }
                | QueryError::Identifier { .. }
                | QueryError::Config { .. }
                | QueryError::InvalidDocument(_)
        )
    }
}

/// A specialized `Result` type for query translation and backend operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_keeps_original_text() {
        let err = QueryError::parse("unexpected end of input", "{bad json");

        assert!(err.is_input_error());
        assert_eq!(
            err.to_string(),
            "Could not parse literal text (unexpected end of input): {bad json"
        );
    }

    #[test]
    fn backend_errors_are_not_input_errors() {
        assert!(!QueryError::Backend("connection refused".into()).is_input_error());
        assert!(!QueryError::Initialization("bad dsn".into()).is_input_error());
    }

    #[test]
    fn non_json_values_surface_as_parse_errors() {
        let err = crate::literal::parse("(1, 2)").unwrap_err();

        assert!(matches!(err, QueryError::Parse { .. }));
        assert!(err.is_input_error());
    }
}
