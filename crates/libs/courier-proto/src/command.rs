//! Inbound command payload shapes and late-bound resolution.
//!
//! The envelope is parsed before its payload type is known; the payload is
//! deserialized only once the command name selects a shape. Unrecognized
//! names resolve to [`CommandPayload::Unknown`] carrying the raw payload so
//! the dispatch loop can log and drop them without failing.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::WireError;

/// `get_chat` request: resolve a chat's display name and recipients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetChat {
    pub chat_guid: String,
}

/// `get_contact` request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetContact {
    pub user_guid: String,
}

/// `send_message` request: plain text to a thread.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendMessage {
    pub chat_guid: String,
    pub text: String,
}

/// `send_media` request: a single file-backed attachment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendMedia {
    pub chat_guid: String,
    pub path_on_disk: String,
    pub mime_type: String,
    pub file_name: String,
}

/// `get_chats` request: threads active since `min_timestamp` (seconds).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetChats {
    pub min_timestamp: i64,
}

/// `get_messages_after` request (timestamp in seconds).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetMessagesAfter {
    pub chat_guid: String,
    pub timestamp: i64,
}

/// `get_recent_messages` request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetRecentMessages {
    pub chat_guid: String,
    pub limit: i64,
}

/// Sum type over every command the processor understands.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    PreStartupSync,
    GetChat(GetChat),
    GetContact(GetContact),
    SendMessage(SendMessage),
    SendMedia(SendMedia),
    GetChats(GetChats),
    GetMessagesAfter(GetMessagesAfter),
    GetRecentMessages(GetRecentMessages),
    GetChatAvatar,
    /// Terminal frame from the bridge; data stays raw for the correlator.
    Response(Value),
    /// Anything else; kept raw for the unhandled-command log line.
    Unknown { command: String, data: Value },
}

impl Envelope {
    /// Resolves `data` against the shape selected by the command name.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Payload`] when the payload does not match the
    /// expected shape for a known command. Unknown command names are not an
    /// error — they resolve to [`CommandPayload::Unknown`].
    pub fn payload(&self) -> Result<CommandPayload, WireError> {
        match self.command.as_str() {
            "pre_startup_sync" => Ok(CommandPayload::PreStartupSync),
            "get_chat" => self.data_as().map(CommandPayload::GetChat),
            "get_contact" => self.data_as().map(CommandPayload::GetContact),
            "send_message" => self.data_as().map(CommandPayload::SendMessage),
            "send_media" => self.data_as().map(CommandPayload::SendMedia),
            "get_chats" => self.data_as().map(CommandPayload::GetChats),
            "get_messages_after" => self.data_as().map(CommandPayload::GetMessagesAfter),
            "get_recent_messages" => self.data_as().map(CommandPayload::GetRecentMessages),
            "get_chat_avatar" => Ok(CommandPayload::GetChatAvatar),
            "response" => Ok(CommandPayload::Response(self.data.clone())),
            other => Ok(CommandPayload::Unknown {
                command: other.to_string(),
                data: self.data.clone(),
            }),
        }
    }

    fn data_as<T: DeserializeOwned>(&self) -> Result<T, WireError> {
        serde_json::from_value(self.data.clone()).map_err(|source| WireError::Payload {
            command: self.command.clone(),
            source,
        })
    }
}
