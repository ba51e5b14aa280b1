//! Live channel error types.

/// Errors from the live-update transport and URL handling.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// The origin or live URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The origin scheme has no WebSocket counterpart.
    #[error("unsupported origin scheme: {0}")]
    UnsupportedScheme(String),

    /// The WebSocket handshake failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Reading or writing a frame failed on an open connection.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors decoding an inbound live message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("invalid message JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A message type that requires a `data` payload arrived without one.
    #[error("{0} message has no data")]
    MissingData(&'static str),
}

/// Result type for live channel operations.
pub type Result<T> = std::result::Result<T, LiveError>;
