//! Daemon-level errors. Nothing here ever crosses the dispatch loop —
//! handlers log and drop; these surface only on the outbound request path
//! and at bootstrap.

use courier_proto::{ErrorBody, WireError};
use courier_telephony::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bridge connection closed")]
    ChannelClosed,

    #[error("bridge rejected request: {} ({})", .0.code, .0.message)]
    Rejected(ErrorBody),
}

impl From<serde_json::Error> for DaemonError {
    fn from(err: serde_json::Error) -> Self {
        Self::Wire(WireError::Json(err))
    }
}
