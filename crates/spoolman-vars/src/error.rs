//! Error types for the Spoolman → Klipper bridge.

use thiserror::Error;

/// Errors returned by the bridge's clients and components.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP error {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response decoded but did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedPayload(String),

    /// Klipper rejected a G-code script.
    #[error("G-code `{script}` failed: {message}")]
    Gcode {
        /// Script that was sent.
        script: String,
        /// Error message reported by Moonraker/Klipper.
        message: String,
    },

    /// Websocket transport failed.
    #[error("Websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
