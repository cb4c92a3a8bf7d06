use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for the TalentHub API client, encapsulating all possible error scenarios.
///
/// The type is `Clone` so that a single failed fetch can be delivered to every
/// caller coalesced onto it; the non-cloneable transport error is shared
/// behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An operation was invoked without an active user session. No request is
    /// issued in this case.
    #[error("not authenticated: no active user session")]
    NotAuthenticated,

    /// Transport-level failure, mapped from `reqwest::Error`.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// The remote endpoint answered with a non-success HTTP status.
    #[error("request failed with status {0}")]
    Status(StatusCode),

    /// The response body is not valid JSON or does not match any of the
    /// accepted webhook response shapes.
    #[error("parse error: {0}")]
    Parse(String),

    /// The remote endpoint reported a failure inside a `{ success: false }`
    /// envelope.
    #[error("remote error: {0}")]
    Remote(String),

    /// A catch-all error for miscellaneous cases.
    #[error("other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::from(err);
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_error_is_cloneable() {
        let err = Error::Status(StatusCode::INTERNAL_SERVER_ERROR);
        let clone = err.clone();
        assert!(matches!(
            clone,
            Error::Status(StatusCode::INTERNAL_SERVER_ERROR)
        ));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::NotAuthenticated.to_string(),
            "not authenticated: no active user session"
        );
        assert_eq!(
            Error::Remote("evaluations sheet unavailable".into()).to_string(),
            "remote error: evaluations sheet unavailable"
        );
    }
}
