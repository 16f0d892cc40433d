//! Wire-level errors and the typed error body sent to the bridge.

use serde::{Deserialize, Serialize};

/// Error code for a send rejected by the permission gate.
pub const ERR_NO_PERMISSION: &str = "no_permission";

/// Error code for an attachment over the MMS size cap.
pub const ERR_SIZE_LIMIT_EXCEEDED: &str = "size_limit_exceeded";

/// Errors from envelope decode/encode and payload resolution.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no command name")]
    MissingCommand,

    #[error("command '{command}' requires an id")]
    MissingId { command: String },

    #[error("invalid payload for '{command}': {source}")]
    Payload {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed failure body carried in a `response` frame.
///
/// The bridge matches on `code`; `message` is human-readable and may be
/// localized by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for the permission-gate rejection.
    pub fn no_permission(message: impl Into<String>) -> Self {
        Self::new(ERR_NO_PERMISSION, message)
    }

    /// Convenience constructor for the attachment size cap.
    pub fn size_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ERR_SIZE_LIMIT_EXCEEDED, message)
    }
}
