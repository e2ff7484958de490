//! # Domain Errors
//!
//! Error types for the session store, API client and flows.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failures of a wallet connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// No signer capability is installed.
    #[error("No wallet signer available: please install a wallet extension")]
    NoSignerAvailable,

    /// The user declined the account request.
    #[error("Wallet connection rejected by user")]
    UserRejected,

    /// The signer failed or returned no accounts.
    #[error("Wallet signer error: {0}")]
    SignerError(String),

    /// Another connect attempt is already in flight.
    #[error("A wallet connection is already in progress")]
    ConnectInProgress,

    /// The session was disconnected while the attempt was in flight.
    #[error("Wallet connection cancelled")]
    Cancelled,
}

/// Failures reported by a signer capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The user declined the request.
    #[error("request rejected by user")]
    Rejected,

    /// Any other signer failure.
    #[error("{0}")]
    Failed(String),
}

impl From<SignerError> for ConnectError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::Rejected => ConnectError::UserRejected,
            SignerError::Failed(reason) => ConnectError::SignerError(reason),
        }
    }
}

/// Body of a non-success API response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    /// Parsed payload of a response declaring a JSON content type.
    Json(serde_json::Value),
    /// Raw text of any other response.
    Text(String),
}

impl ErrorBody {
    /// Best-effort human readable message.
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorBody::Json(value) => value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|m| m.as_str()),
            ErrorBody::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            ErrorBody::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Json(value) => write!(f, "{}", value),
            ErrorBody::Text(text) => f.write_str(text),
        }
    }
}

/// API client errors.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server could not be reached (DNS, connection refused, reset...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Decoded error payload
        body: ErrorBody,
    },

    /// A success response did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of a server-rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Short outcome label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport_error",
            ApiError::Api { .. } => "api_error",
            ApiError::Decode(_) => "decode_error",
            ApiError::InvalidUrl(_) => "invalid_url",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if e.is_builder() {
            ApiError::InvalidUrl(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// A single form field constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the field (e.g. `studentName`)
    pub field: &'static str,
    /// User facing message
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All field errors of one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{} invalid field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Error attached to a field, if any.
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Errors surfaced by the application flows.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    /// A privileged action was attempted without a connected wallet.
    #[error("Please connect your wallet first")]
    NotConnected,

    /// The submitted form violates field constraints.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The backend rejected or could not serve the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Diploma creation was rejected by the backend.
    #[error("Failed to create diploma")]
    CreationFailed(#[source] ApiError),
}

/// Errors of the persisted session storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
