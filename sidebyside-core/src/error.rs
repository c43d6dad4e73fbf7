//! Error types for the sidebyside core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering request validation, the LLM provider, upstream schema
//! validation, configuration, and the client-side form controller.

use axum::http::StatusCode;

/// Top-level error for one `POST /compare` invocation.
///
/// Every variant is terminal for the request: nothing is partially rendered.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Server not configured (missing {var}).")]
    MissingCredential { var: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl ServiceError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServiceError::Rejected(_) => StatusCode::BAD_REQUEST,
            ServiceError::MissingCredential { .. }
            | ServiceError::Llm(_)
            | ServiceError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short plain-text body sent to the client.
    ///
    /// Upstream failures are summarized generically; provider bodies and
    /// schema details only go to the log.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::MethodNotAllowed
            | ServiceError::Rejected(_)
            | ServiceError::MissingCredential { .. } => self.to_string(),
            ServiceError::Llm(LlmError::Status { status, .. }) => {
                format!("Completion service returned an error (HTTP {status}).")
            }
            ServiceError::Llm(LlmError::ResponseParse { .. }) | ServiceError::Schema(_) => {
                "AI returned unexpected output. Please try again.".to_string()
            }
            ServiceError::Llm(_) => "Error contacting the completion service.".to_string(),
        }
    }

    /// Whether the failure came from the completion service being unreachable
    /// or refusing the call, as opposed to answering with malformed content.
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(
            self,
            ServiceError::Llm(LlmError::Transport { .. } | LlmError::Status { .. } | LlmError::Timeout { .. })
        )
    }
}

/// Client input rejected before any outbound call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Bad Request: invalid JSON")]
    InvalidJson,

    #[error("Bad Request: unsupported request version (expected 1)")]
    UnsupportedVersion,

    #[error(
        "Bad Request: option {position} is a bare string; send objects shaped {{\"name\": ..., \"text\": ...}}"
    )]
    DeprecatedShape { position: usize },

    #[error("Bad Request: option {position} must be an object with \"name\" and \"text\"")]
    InvalidOption { position: usize },

    #[error("Please provide at least two options.")]
    TooFewOptions { count: usize },

    #[error("Please provide no more than 10 options.")]
    TooManyOptions { count: usize },
}

/// Errors from LLM provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    Transport { message: String },

    #[error("Provider returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// The completion content does not match the comparison schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("completion content is not valid JSON: {message}")]
    NotJson { message: String },

    #[error("completion JSON must be an object with a \"rows\" array")]
    MissingRows,

    #[error("row entry {index} is malformed")]
    MalformedRow { index: usize },

    #[error("unknown row attribute \"{attribute}\"")]
    UnknownRow { attribute: String },

    #[error("row \"{attribute}\" appears more than once")]
    DuplicateRow { attribute: String },

    #[error("row \"{attribute}\" has {actual} values for {expected} options")]
    TooManyValues {
        attribute: String,
        actual: usize,
        expected: usize,
    },

    #[error("row \"{attribute}\" value {index} must be a string or an array of strings")]
    InvalidCell { attribute: String, index: usize },

    #[error("recap field \"{field}\" is malformed")]
    MalformedRecap { field: &'static str },

    #[error("recap confidence \"{value}\" is not one of low, medium, high")]
    InvalidConfidence { value: String },

    #[error("recap suggestion \"{value}\" does not name a submitted option")]
    UnknownSuggestion { value: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the HTTP client used by the form controller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Server responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request was superseded by a newer submission")]
    Cancelled,
}

/// Errors from form controller operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("At most {max} options can be compared")]
    TooManyEntries { max: usize },

    #[error("At least {min} option slots are required")]
    TooFewEntries { min: usize },

    #[error("Please fill at least two descriptions to compare.")]
    NotEnoughOptions,

    #[error("No option slot at position {index} (have {len})")]
    EntryOutOfRange { index: usize, len: usize },

    #[error("Unknown preset category: {key}")]
    UnknownPreset { key: String },

    #[error("Generate a table first.")]
    NoTable,

    #[error("No site link for option \"{name}\"")]
    NoSiteLink { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_statuses() {
        let err = ServiceError::from(Rejection::TooFewOptions { count: 1 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Please provide at least two options.");
        assert_eq!(ServiceError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_too_many_mentions_limit() {
        let err = ServiceError::from(Rejection::TooManyOptions { count: 11 });
        assert!(err.public_message().contains("10"));
    }

    #[test]
    fn test_missing_credential_is_server_error() {
        let err = ServiceError::MissingCredential {
            var: "OPENAI_API_KEY".into(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.public_message(),
            "Server not configured (missing OPENAI_API_KEY)."
        );
    }

    #[test]
    fn test_upstream_status_does_not_leak_body() {
        let err = ServiceError::from(LlmError::Status {
            status: 401,
            body: "invalid key sk-secret".into(),
        });
        let msg = err.public_message();
        assert!(msg.contains("401"));
        assert!(!msg.contains("sk-secret"));
        assert!(err.is_upstream_unavailable());
    }

    #[test]
    fn test_schema_error_distinct_from_unreachable() {
        let garbage = ServiceError::from(SchemaError::MissingRows);
        let down = ServiceError::from(LlmError::Transport {
            message: "connection refused".into(),
        });
        assert!(!garbage.is_upstream_unavailable());
        assert!(down.is_upstream_unavailable());
        assert_eq!(garbage.status(), down.status());
        assert_ne!(garbage.public_message(), down.public_message());
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::TooManyValues {
            attribute: "Pros".into(),
            actual: 3,
            expected: 2,
        };
        assert_eq!(err.to_string(), "row \"Pros\" has 3 values for 2 options");
    }

    #[test]
    fn test_deprecated_shape_names_canonical_shape() {
        let msg = Rejection::DeprecatedShape { position: 1 }.to_string();
        assert!(msg.contains("\"name\""));
        assert!(msg.contains("\"text\""));
    }
}
