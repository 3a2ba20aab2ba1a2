//! Error types for Conform operations.
//!
//! Errors are split by who sees them:
//! - [`BackendError`] and [`ValidationError`] describe a single failed attempt
//!   and are wrapped in [`AttemptError`]. They never reach the caller directly.
//! - [`TerminalFailure`] is the only failure `invoke` returns.
//! - [`ConformError`] covers everything that goes wrong before an invocation
//!   starts (configuration, request construction, schema definition).

use serde::Serialize;
use std::fmt;

/// Failure reported by a model backend adapter for one remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Connection failures, timeouts and throttling
    #[error("Transport error: {0}")]
    Transport(String),

    /// Content-policy or capacity rejection reported by the backend
    #[error("Backend refusal: {0}")]
    Refusal(String),

    /// The response envelope could not be unwrapped
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
}

impl BackendError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a refusal error
    pub fn refusal(msg: impl Into<String>) -> Self {
        Self::Refusal(msg.into())
    }

    /// Create a malformed envelope error
    pub fn malformed_envelope(msg: impl Into<String>) -> Self {
        Self::MalformedEnvelope(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Refusal(_) => ErrorKind::BackendRefusal,
            Self::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
        }
    }
}

/// Structural mismatch between backend text and a schema descriptor.
///
/// Every variant carries the path of the offending value, e.g. `items[2].score`.
/// The root object is reported as `$`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("response is not parseable JSON: {0}")]
    NotParseable(String),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{path}` expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("field `{path}` violates constraint: {detail}")]
    ConstraintViolation { path: String, detail: String },

    #[error("unexpected field `{0}`")]
    UnexpectedField(String),
}

impl ValidationError {
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn constraint(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Failure of one attempt (backend call plus validation).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl AttemptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Backend(e) => e.kind(),
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Check if this attempt failure may be retried.
    ///
    /// Every attempt failure is currently retriable; the retry ceiling is the
    /// only thing that ends an invocation early.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(_) | Self::Validation(_) => true,
        }
    }
}

/// Coarse classification of an attempt failure, used in traces and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    BackendRefusal,
    MalformedEnvelope,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::BackendRefusal => "backend_refusal",
            Self::MalformedEnvelope => "malformed_envelope",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single failure surfaced to the caller once the retry ceiling is reached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invocation failed after {attempts} attempt(s); last error ({}): {last_error}",
    .last_error.kind()
)]
pub struct TerminalFailure {
    /// Number of attempts made
    pub attempts: u32,
    /// The error of the final attempt
    pub last_error: AttemptError,
}

impl TerminalFailure {
    pub fn last_error_kind(&self) -> ErrorKind {
        self.last_error.kind()
    }
}

/// Errors in a schema definition, found when the descriptor is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema `{0}`: field names must not be empty")]
    EmptyFieldName(String),

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("field `{path}`: {detail}")]
    InvalidConstraint { path: String, detail: String },

    #[error("field `{path}`: default value does not conform: {source}")]
    InvalidDefault {
        path: String,
        source: ValidationError,
    },

    #[error("unsupported JSON Schema at `{path}`: {detail}")]
    Unsupported { path: String, detail: String },

    #[error("failed to render schema: {0}")]
    Render(String),
}

impl SchemaError {
    pub fn invalid_constraint(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn unsupported(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// The main error type for everything around an invocation.
#[derive(Debug, thiserror::Error)]
pub enum ConformError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Schema definition errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Trace sink errors
    #[error("Trace error: {0}")]
    Trace(String),

    /// Invocation exhausted its retries
    #[error(transparent)]
    Terminal(#[from] TerminalFailure),
}

impl ConformError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a trace error
    pub fn trace(msg: impl Into<String>) -> Self {
        Self::Trace(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_attempt_error_is_retryable() {
        let errors = [
            AttemptError::from(BackendError::transport("timed out")),
            AttemptError::from(BackendError::refusal("content policy")),
            AttemptError::from(BackendError::malformed_envelope("no choices")),
            AttemptError::from(ValidationError::MissingField("label".into())),
        ];
        for err in errors {
            assert!(err.is_retryable(), "{err} should be retryable");
        }
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AttemptError::from(BackendError::refusal("x")).kind(),
            ErrorKind::BackendRefusal
        );
        assert_eq!(
            AttemptError::from(ValidationError::NotParseable("x".into())).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_terminal_failure_display() {
        let failure = TerminalFailure {
            attempts: 3,
            last_error: BackendError::transport("connection reset").into(),
        };
        let text = failure.to_string();
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("transport"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn test_terminal_failure_converts_into_conform_error() {
        fn run(failure: TerminalFailure) -> Result<(), ConformError> {
            Err(failure)?
        }

        let failure = TerminalFailure {
            attempts: 2,
            last_error: ValidationError::MissingField("label".into()).into(),
        };
        let err = run(failure.clone()).unwrap_err();
        assert_eq!(err.to_string(), failure.to_string());
        assert!(matches!(err, ConformError::Terminal(ref inner) if inner.attempts == 2));
    }
}
