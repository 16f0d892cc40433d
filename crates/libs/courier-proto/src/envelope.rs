//! The tagged command envelope shared by both directions of the stream.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorBody;

/// Command name used for every reply frame.
pub const COMMAND_RESPONSE: &str = "response";

/// Thread-safe request ID generator for device-initiated requests.
static REQUEST_ID: AtomicI64 = AtomicI64::new(1);

/// Returns the next outbound request id. IDs are monotonically increasing.
#[must_use]
pub fn next_request_id() -> i64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// One protocol frame: `{"command": ..., "id": ..., "data": ...}`.
///
/// `data` stays an untyped [`Value`] until the command name selects a
/// concrete shape via [`Envelope::payload`]. Null `data` and absent `id`
/// are omitted on the wire, matching the host bridge's encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Envelope {
    /// Creates a fire-and-forget notification (no id, no reply expected).
    pub fn notification(command: impl Into<String>, data: Value) -> Self {
        Self {
            command: command.into(),
            id: None,
            data,
        }
    }

    /// Creates a device-initiated request with a fresh id.
    pub fn request(command: impl Into<String>, data: Value) -> Self {
        Self {
            command: command.into(),
            id: Some(next_request_id()),
            data,
        }
    }

    /// Creates a reply echoing the originating request id.
    pub fn response(id: i64, data: Value) -> Self {
        Self {
            command: COMMAND_RESPONSE.to_string(),
            id: Some(id),
            data,
        }
    }

    /// Creates a typed error reply for the given request id.
    pub fn error(id: i64, body: &ErrorBody) -> Self {
        Self::response(
            id,
            serde_json::json!({ "code": body.code, "message": body.message }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_omits_id_and_null_data() {
        let env = Envelope::notification("pre_startup_sync", Value::Null);
        let wire = serde_json::to_string(&env).expect("serialize envelope");
        assert_eq!(wire, r#"{"command":"pre_startup_sync"}"#);
    }

    #[test]
    fn response_echoes_request_id() {
        let env = Envelope::response(42, serde_json::json!([]));
        let wire = serde_json::to_string(&env).expect("serialize envelope");
        assert_eq!(wire, r#"{"command":"response","id":42,"data":[]}"#);
    }

    #[test]
    fn error_reply_carries_code_and_message() {
        let env = Envelope::error(7, &ErrorBody::no_permission("missing SMS permissions"));
        assert_eq!(env.command, COMMAND_RESPONSE);
        assert_eq!(env.id, Some(7));
        assert_eq!(env.data["code"], "no_permission");
        assert_eq!(env.data["message"], "missing SMS permissions");
    }

    #[test]
    fn request_ids_are_unique_and_increasing() {
        let a = Envelope::request("message", Value::Null);
        let b = Envelope::request("message", Value::Null);
        assert!(b.id.expect("id") > a.id.expect("id"));
    }
}
