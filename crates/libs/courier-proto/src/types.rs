//! Protocol-shaped records and the chat/message guid scheme.

use serde::{Deserialize, Serialize};

/// Prefix of every chat guid: `SMS;-;<address>` (addresses joined with a
/// single space for group threads).
pub const CHAT_GUID_PREFIX: &str = "SMS;-;";

/// Prefix distinguishing MMS-origin message guids from SMS ones.
pub const MMS_GUID_PREFIX: &str = "mms_";

/// Builds the canonical chat guid for a recipient list.
///
/// Deterministic: the same address list always yields the same guid, and
/// [`chat_guid_recipients`] round-trips it back.
#[must_use]
pub fn chat_guid(addresses: &[String]) -> String {
    format!("{CHAT_GUID_PREFIX}{}", addresses.join(" "))
}

/// Splits a chat guid back into its recipient addresses.
#[must_use]
pub fn chat_guid_recipients(guid: &str) -> Vec<String> {
    guid.strip_prefix(CHAT_GUID_PREFIX)
        .unwrap_or(guid)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Builds the guid for an MMS-origin message.
#[must_use]
pub fn mms_guid(native_id: i64) -> String {
    format!("{MMS_GUID_PREFIX}{native_id}")
}

/// Strips the `mms_` prefix, if present. Used by the legacy guid
/// compatibility rewrite for messages older than the configured cutover.
#[must_use]
pub fn strip_mms_prefix(guid: &str) -> String {
    guid.strip_prefix(MMS_GUID_PREFIX).unwrap_or(guid).to_string()
}

/// One message as the bridge sees it. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub guid: String,
    pub timestamp: i64,
    pub subject: String,
    pub text: String,
    pub chat_guid: String,
    /// Chat guid of the sender for inbound messages; `None` when from me.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_guid: Option<String>,
    pub is_from_me: bool,
    /// True when the message was written to the store by the bridge itself.
    pub sent_from_matrix: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// A file-backed MMS attachment, materialized to a private cache path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub mime_type: String,
    pub file_name: String,
    pub path_on_disk: String,
}

/// One MMS sub-part: inline text or an attachment.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    File(Attachment),
}

/// Contact projection keyed by a user guid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub nickname: String,
    pub phones: Vec<String>,
}

/// Reply shape of `get_chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
    pub chat_name: String,
    pub recipients: Vec<String>,
}

/// Push registration emitted as a `push_key` notification during
/// `pre_startup_sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKey {
    pub url: String,
    pub app_id: String,
    pub pushkey: String,
}
