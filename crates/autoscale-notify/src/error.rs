//! Error types for the notification stream.

use thiserror::Error;

/// The configured page origin could not be turned into a location.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid page origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("unsupported page scheme: {0}")]
    UnsupportedScheme(String),

    #[error("page origin has no host: {0}")]
    MissingHost(String),
}

/// A single inbound frame could not be decoded into a notification.
///
/// Always recoverable: the frame is dropped and the stream continues.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed notification frame: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Connection-level failure. Every variant leads to a reconnect.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection refused: {0}")]
    Refused(String),

    #[error("connection dropped: {0}")]
    Dropped(String),
}
