//! Error types for bridge operations

use serde::{Deserialize, Serialize};

/// Wire error body shared between service and client.
///
/// Every non-2xx response from the companion server carries this JSON
/// shape; gangway-service serializes it and gangway-client parses it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GangwayError {
    /// Non-2xx HTTP response; the message comes from the parsed error body
    /// or a generic fallback when the body is not parseable.
    #[error("server returned {status}: {message}")]
    Request { status: u16, message: String },

    #[error("could not reach the companion server: {0}")]
    Connection(String),

    /// Capability the remote adapter intentionally does not offer. The
    /// message is identical on every call so callers can treat it as a
    /// stable contract.
    #[error("{operation} is not implemented in browser mode: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: &'static str,
    },

    /// Event frame that failed to parse as an envelope, or whose payload
    /// did not decode. Logged and dropped inside the channel task, never
    /// surfaced to subscribers.
    #[error("malformed event envelope: {0}")]
    Envelope(String),

    #[error("unknown event channel: {0}")]
    UnknownChannel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
