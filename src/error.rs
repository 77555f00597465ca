use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single field-level problem, addressed by a dot-joined path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every field problem found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(path, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// True when any error is reported at exactly `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.0.iter().any(|err| err.path == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Why a generation attempt against the model was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoJsonFound,
    SchemaValidationFailed,
    TransportError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoJsonFound => "no_json_found",
            FailureKind::SchemaValidationFailed => "schema_validation_failed",
            FailureKind::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for itinerary generation
#[derive(Error, Debug)]
pub enum ItineraryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} error: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No JSON object found in model response")]
    NoJsonFound,

    #[error("Itinerary schema validation failed: {0}")]
    SchemaValidation(ValidationErrors),

    #[error("Invalid trip request: {0}")]
    InvalidRequest(ValidationErrors),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ItineraryError>;

impl ItineraryError {
    /// Classify an error raised while talking to the model.
    ///
    /// Request validation and local I/O problems are not generation failures.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ItineraryError::NoJsonFound => Some(FailureKind::NoJsonFound),
            ItineraryError::SchemaValidation(_) => Some(FailureKind::SchemaValidationFailed),
            ItineraryError::Config(_)
            | ItineraryError::Transport(_)
            | ItineraryError::Http { .. }
            | ItineraryError::RateLimit { .. }
            | ItineraryError::Timeout(_)
            | ItineraryError::Serialization(_) => Some(FailureKind::TransportError),
            ItineraryError::Io(_) | ItineraryError::InvalidRequest(_) => None,
        }
    }

    /// Only schema failures qualify for the corrective retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ItineraryError::SchemaValidation(_))
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ItineraryError::Config(_) => "CONFIG_ERROR",
            ItineraryError::Transport(_) => "TRANSPORT_ERROR",
            ItineraryError::Http { .. } => "HTTP_ERROR",
            ItineraryError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            ItineraryError::Timeout(_) => "TIMEOUT_ERROR",
            ItineraryError::Serialization(_) => "SERIALIZATION_ERROR",
            ItineraryError::Io(_) => "IO_ERROR",
            ItineraryError::NoJsonFound => "NO_JSON_FOUND",
            ItineraryError::SchemaValidation(_) => "SCHEMA_VALIDATION_FAILED",
            ItineraryError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        });

        if let ItineraryError::InvalidRequest(errors) | ItineraryError::SchemaValidation(errors) =
            self
        {
            payload["error"]["details"] = serde_json::to_value(errors).unwrap_or_default();
        }

        payload
    }
}
