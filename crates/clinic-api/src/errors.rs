//! HTTP client error types.

use serde_json::Value;

/// Errors produced by [`ApiClient`](crate::ApiClient) calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured origin or a joined path is not a valid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {}", body.text(MessageField::Error).unwrap_or("no message"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Text fields of the JSON error body.
        body: ErrorBody,
    },

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the caller's credentials or session.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the request failed before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Network failures, 429, and 5xx are retryable. Rejections, other 4xx
    /// and decode failures are not.
    pub fn is_retryable(&self) -> bool {
        self.is_network() || self.status().is_some_and(|s| s == 429 || s >= 500)
    }

    /// Backend-supplied message, looking at `prefer` first.
    pub fn server_message(&self, prefer: MessageField) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body.text(prefer),
            _ => None,
        }
    }

    /// Short category name for structured logs.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::ClientBuild(_) => "client_build",
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
        }
    }
}

/// Text field of an error body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageField {
    /// `error`, used by the login endpoint.
    Error,
    /// `message`, used by the account endpoints.
    Message,
}

/// The human-readable parts of an error response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorBody {
    /// `error` field.
    pub error: Option<String>,
    /// `message` field.
    pub message: Option<String>,
}

impl ErrorBody {
    /// Read the text fields from a raw body. Non-JSON bodies, non-string
    /// values and empty strings count as absent.
    pub fn parse(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            error: field("error"),
            message: field("message"),
        }
    }

    /// `prefer`, falling back to the other field.
    pub fn text(&self, prefer: MessageField) -> Option<&str> {
        let (first, second) = match prefer {
            MessageField::Error => (&self.error, &self.message),
            MessageField::Message => (&self.message, &self.error),
        };
        first.as_deref().or(second.as_deref())
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
