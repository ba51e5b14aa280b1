//! Auth error types.

use clinic_api::{ApiError, MessageField};

/// Shown when a request never reached the backend.
pub const UNREACHABLE_MESSAGE: &str = "Cannot reach the server. Please try again shortly.";

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The backend answered with a non-success status.
    #[error("{}", message.as_deref().unwrap_or("request rejected"))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Backend-supplied message, if any.
        message: Option<String>,
    },

    /// The request never reached the backend.
    #[error("cannot reach server: {0}")]
    Unreachable(String),

    /// The same operation is already pending.
    #[error("{0} already in progress")]
    OperationInProgress(&'static str),

    /// A form field failed local validation; nothing was sent.
    #[error("{field}: {message}")]
    Validation {
        /// Offending field (wire name).
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Any other client-side failure (bad URL, undecodable response).
    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        Self::from_api(err, MessageField::Error)
    }
}

impl AuthError {
    /// Convert an API error, reading the rejection text from `prefer` first.
    pub fn from_api(err: ApiError, prefer: MessageField) -> Self {
        let message = err.server_message(prefer).map(str::to_string);
        match err {
            ApiError::Status { status, .. } => Self::Rejected { status, message },
            ApiError::Network(e) => Self::Unreachable(e.to_string()),
            other => Self::Api(other),
        }
    }

    /// Whether the backend rejected the session or credentials (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401, .. })
    }

    /// Whether the session probe should try again after this error.
    ///
    /// Everything the backend or network produced is retried except an
    /// authentication rejection. Local failures are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => *status != 401,
            Self::Unreachable(_) => true,
            Self::Api(e) => e.is_retryable(),
            Self::OperationInProgress(_) | Self::Validation { .. } => false,
        }
    }

    /// Text suitable for a notification.
    ///
    /// Prefers the backend's own message; an unreachable backend gets
    /// [`UNREACHABLE_MESSAGE`]; everything else gets `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Unreachable(_) => UNREACHABLE_MESSAGE.to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::OperationInProgress(_) => self.to_string(),
            Self::Rejected { message: None, .. } | Self::Api(_) => fallback.to_string(),
        }
    }

    /// Short category name for structured logs.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::Unreachable(_) => "unreachable",
            Self::OperationInProgress(_) => "in_progress",
            Self::Validation { .. } => "validation",
            Self::Api(e) => e.error_kind(),
        }
    }
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
