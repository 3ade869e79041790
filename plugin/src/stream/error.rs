use thiserror::Error;

use crate::stream::protocol::ProtocolError;

pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Errors surfaced by the stream transport and viewer configuration.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme `{0}` (only ws:// is supported)")]
    UnsupportedScheme(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("stream link is not open")]
    NotOpen,

    #[error("stream link closed")]
    LinkClosed,

    #[error("frame decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
