//! Bridge error types.

use thiserror::Error;

use crate::api::websocket::hub::ClientId;

/// Bridge error type.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An argument could not be coerced to a finite float.
    #[error("invalid argument at index {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },

    /// A single bind attempt failed.
    #[error("port {port} unavailable: {source}")]
    PortInUse {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Every port in the configured range failed to bind.
    #[error("could not find available port in range {start}-{end}")]
    PortRangeExhausted { start: u16, end: u16 },

    /// A client's send queue was closed or full.
    #[error("failed to send to client {0}")]
    ClientSendFailure(ClientId),

    /// A WebSocket frame that is not a valid command.
    #[error("malformed client message: {0}")]
    MalformedClientMessage(String),

    /// The outbound UDP peer could not be reached.
    #[error("outbound transport unavailable: {0}")]
    TransportUnavailable(String),

    /// An inbound datagram that is not valid OSC.
    #[error("OSC decode error: {0}")]
    OscDecode(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
