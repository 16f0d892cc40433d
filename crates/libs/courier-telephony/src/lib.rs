//! # courier-telephony
//!
//! Provider adapters over the device message store.
//!
//! The store is a SQLite database shaped like the platform telephony
//! provider: `sms` and `mms` message tables, `mms_part`/`mms_addr` for
//! multi-part content, `threads`/`thread_recipients` for conversation
//! identity, and a `contacts` projection. Each adapter performs a
//! read-only projection from native rows to the protocol shapes in
//! `courier-proto`:
//!
//! - [`SmsAdapter`] — single-part text messages
//! - [`MmsAdapter`] — multi-part messages, materializing attachments to a
//!   private cache directory
//! - [`ThreadAdapter`] — chat guid ↔ native thread id, time-bounded
//!   `(native id, is_mms)` queries
//! - [`ContactAdapter`] — nickname/phone projection keyed by user guid
//!
//! Unparsable rows (missing required address) are skipped with a warning,
//! never fatal; only storage-level failures propagate as [`StoreError`].

pub mod contacts;
pub mod db;
pub mod error;
pub mod mms;
pub mod sms;
pub mod threads;

pub use contacts::ContactAdapter;
pub use db::{
    MmsRow, PartRow, SmsRow, TelephonyDb, MMS_BOX_INBOX, MMS_BOX_SENT, SMS_TYPE_INBOX,
    SMS_TYPE_OUTBOX, SMS_TYPE_SENT,
};
pub use error::StoreError;
pub use mms::MmsAdapter;
pub use sms::SmsAdapter;
pub use threads::ThreadAdapter;
