use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared error type used across all Vibe Ripper crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("encoding: {0}")]
    Encoding(String),

    #[error("backend {provider}: {message}")]
    Backend { provider: String, message: String },

    #[error("validation ({}): {0}", .0.label())]
    Validation(ValidationFailure),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a backend reply was refused by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The reply carried no text at all.
    Empty,
    /// The reply was not a well-formed JSON document.
    Malformed(String),
    /// The document parsed but a required field is missing or mistyped.
    Schema(String),
}

impl ValidationFailure {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Malformed(_) => "malformed",
            Self::Schema(_) => "schema",
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("backend returned no text"),
            Self::Malformed(detail) => write!(f, "reply is not valid JSON: {detail}"),
            Self::Schema(detail) => write!(f, "reply does not match schema: {detail}"),
        }
    }
}

/// The four user-facing failure classes.
///
/// Transport failures count as `Backend`; so do local I/O and storage
/// faults, which have no dedicated class in the session's error display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Encoding,
    Backend,
    Validation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Backend { .. }
            | Self::Http(_)
            | Self::Timeout(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Storage(_)
            | Self::Other(_) => ErrorKind::Backend,
        }
    }

    pub fn validation(failure: ValidationFailure) -> Self {
        Self::Validation(failure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Encoding => "encoding",
            Self::Backend => "backend",
            Self::Validation => "validation",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_carries_label() {
        let err = Error::validation(ValidationFailure::Schema("missing vibe_title".into()));
        let text = err.to_string();
        assert!(text.starts_with("validation (schema)"), "{text}");
        assert!(text.contains("missing vibe_title"));
    }

    #[test]
    fn transport_errors_classify_as_backend() {
        assert_eq!(Error::Http("reset".into()).kind(), ErrorKind::Backend);
        assert_eq!(Error::Timeout("120s".into()).kind(), ErrorKind::Backend);
        assert_eq!(
            Error::Configuration("no key".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::validation(ValidationFailure::Empty).kind(),
            ErrorKind::Validation
        );
    }
}
