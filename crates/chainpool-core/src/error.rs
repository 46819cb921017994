//! Transport-level error types.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur while talking to an RPC endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, bad status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// IPC socket / named pipe connect, write or read failed.
    #[error("IPC error ({endpoint}): {message}")]
    Ipc { endpoint: String, message: String },

    /// The transport variant cannot be used on this platform.
    #[error("{kind} transport is not supported on this platform (endpoint: {endpoint})")]
    Unsupported { kind: String, endpoint: String },

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The node answered, but the payload is not what the caller expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Response could not be (de)serialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Build an [`TransportError::Ipc`] for the given endpoint.
    pub fn ipc(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Ipc {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` if this error is transient (another attempt or another
    /// endpoint may succeed).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Ipc { .. } | Self::Timeout { .. })
    }
}
