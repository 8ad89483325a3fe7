//! Error types for the gateway core
//!
//! Declines and validation failures are never errors here: they travel as a
//! [`GatewayResponse`](crate::types::GatewayResponse) with `success == false`.
//! `GatewayError` is reserved for failures that abort a run.

use crate::gateway::Action;
use thiserror::Error;

/// Result type alias for gateway core operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for gateway core operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No response was obtained from the remote endpoint
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Body could not be decoded in the expected format
    #[error("Malformed {format} payload: {reason}")]
    MalformedPayload {
        format: &'static str,
        reason: String,
    },

    /// The adapter does not implement the requested capability
    #[error("Action not supported by {gateway}: {action}")]
    NotSupported { gateway: String, action: Action },

    /// A run was built from an empty step list
    #[error("Run must contain at least one step")]
    EmptyRun,

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Unexpected error
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl GatewayError {
    /// Create a malformed payload error
    pub fn malformed_payload(format: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            format,
            reason: reason.into(),
        }
    }

    /// Create a not supported error
    pub fn not_supported(gateway: impl Into<String>, action: Action) -> Self {
        Self::NotSupported {
            gateway: gateway.into(),
            action,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Whether this error means no response was received at all
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
