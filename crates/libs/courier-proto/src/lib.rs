//! # courier-proto
//!
//! Wire protocol for the courier SMS/MMS bridge relay.
//!
//! The bridge host and the device-side daemon exchange newline-delimited
//! JSON frames over process stdio. Every frame is a tagged envelope:
//!
//! ```text
//! {"command": "<name>", "id": <integer, optional>, "data": <payload>}
//! ```
//!
//! `id` is present on requests that expect a reply and on the reply itself
//! (echoing the request id); it is absent on fire-and-forget notifications.
//! `data` is untyped on the wire and is resolved against the expected shape
//! only once the command name is known — see [`CommandPayload`].
//!
//! Replies always carry `command = "response"`. Typed failures use the
//! error body `{"code": ..., "message": ...}` in place of the result.
//!
//! ## Example
//!
//! ```rust
//! use courier_proto::{decode_line, CommandPayload};
//!
//! let env = decode_line(r#"{"command":"get_contact","id":3,"data":{"user_guid":"SMS;-;+15551234"}}"#)
//!     .unwrap();
//! match env.payload().unwrap() {
//!     CommandPayload::GetContact(get) => assert_eq!(get.user_guid, "SMS;-;+15551234"),
//!     other => panic!("unexpected payload: {other:?}"),
//! }
//! ```

pub mod codec;
pub mod command;
pub mod envelope;
pub mod error;
pub mod types;

pub use codec::{decode_line, encode_line, is_frame};
pub use command::{
    CommandPayload, GetChat, GetChats, GetContact, GetMessagesAfter, GetRecentMessages, SendMedia,
    SendMessage,
};
pub use envelope::{next_request_id, Envelope, COMMAND_RESPONSE};
pub use error::{ErrorBody, WireError, ERR_NO_PERMISSION, ERR_SIZE_LIMIT_EXCEEDED};
pub use types::{
    chat_guid, chat_guid_recipients, mms_guid, strip_mms_prefix, Attachment, ChatInfo, Contact,
    Message, Part, PushKey, CHAT_GUID_PREFIX, MMS_GUID_PREFIX,
};
