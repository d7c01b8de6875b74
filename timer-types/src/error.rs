//! Error types for cubetime.

use thiserror::Error;

/// Errors that can occur when parsing or encoding cubetime types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Unknown puzzle type tag
    #[error("unknown puzzle type: {0}")]
    UnknownPuzzle(String),

    /// Unknown theme tag
    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A payload failed shape validation at a trust boundary.
///
/// Validation is all-or-nothing: a payload carrying one malformed record is
/// rejected whole and never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The request body was not a JSON object
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// `solves` was present but not an array of well-formed solves
    #[error("invalid solves data: {reason}")]
    Solves {
        /// What was wrong with the solves payload.
        reason: String,
    },

    /// `settings` was present but not a well-formed settings object
    #[error("invalid settings data: {reason}")]
    Settings {
        /// What was wrong with the settings payload.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TypesError::UnknownPuzzle("9x9".into());
        assert_eq!(err.to_string(), "unknown puzzle type: 9x9");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::Solves {
            reason: "solve 2: missing id".into(),
        };
        assert_eq!(err.to_string(), "invalid solves data: solve 2: missing id");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypesError>();
        assert_send_sync::<ValidationError>();
    }
}
