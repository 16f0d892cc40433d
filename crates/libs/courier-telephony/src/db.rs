//! Connection owner and schema for the device message store.
//!
//! Reads go through the adapters; the write path here is what the radio
//! side of a deployment (and the test harness) uses to land rows.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::StoreError;

/// `sms.type` for a received message.
pub const SMS_TYPE_INBOX: i64 = 1;
/// `sms.type` for a sent message.
pub const SMS_TYPE_SENT: i64 = 2;
/// `sms.type` for a message queued in the outbox.
pub const SMS_TYPE_OUTBOX: i64 = 4;

/// `mms.msg_box` for a received message.
pub const MMS_BOX_INBOX: i64 = 1;
/// `mms.msg_box` for a sent message.
pub const MMS_BOX_SENT: i64 = 2;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS threads (
    _id INTEGER PRIMARY KEY AUTOINCREMENT
);
CREATE TABLE IF NOT EXISTS thread_recipients (
    thread_id INTEGER NOT NULL REFERENCES threads(_id),
    address   TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS sms (
    _id       INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id INTEGER NOT NULL,
    address   TEXT,
    date      INTEGER NOT NULL,
    type      INTEGER NOT NULL,
    subject   TEXT,
    body      TEXT,
    creator   TEXT
);
CREATE TABLE IF NOT EXISTS mms (
    _id       INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id INTEGER NOT NULL,
    date      INTEGER NOT NULL,
    msg_box   INTEGER NOT NULL,
    subject   TEXT,
    creator   TEXT
);
CREATE TABLE IF NOT EXISTS mms_part (
    _id          INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id   INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    name         TEXT,
    text         TEXT,
    data         BLOB,
    data_path    TEXT
);
CREATE TABLE IF NOT EXISTS mms_addr (
    message_id INTEGER NOT NULL,
    address    TEXT NOT NULL,
    kind       TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contacts (
    address  TEXT PRIMARY KEY,
    nickname TEXT NOT NULL,
    phones   TEXT
);
CREATE INDEX IF NOT EXISTS idx_sms_thread_date ON sms(thread_id, date);
CREATE INDEX IF NOT EXISTS idx_mms_thread_date ON mms(thread_id, date);
CREATE INDEX IF NOT EXISTS idx_part_message ON mms_part(message_id);
";

/// A writable SMS row. `date_ms` is Unix milliseconds (native SMS scale).
#[derive(Debug, Clone, Default)]
pub struct SmsRow {
    pub thread_id: i64,
    pub address: Option<String>,
    pub date_ms: i64,
    pub kind: i64,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub creator: Option<String>,
}

/// A writable MMS row. `date_secs` is Unix seconds (native MMS scale).
#[derive(Debug, Clone, Default)]
pub struct MmsRow {
    pub thread_id: i64,
    pub date_secs: i64,
    pub msg_box: i64,
    pub subject: Option<String>,
    pub creator: Option<String>,
    /// Sender address, recorded in `mms_addr` with kind `from`.
    pub from_address: Option<String>,
}

/// A writable MMS sub-part.
#[derive(Debug, Clone, Default)]
pub struct PartRow {
    pub content_type: String,
    pub name: Option<String>,
    pub text: Option<String>,
    pub data: Option<Vec<u8>>,
    pub data_path: Option<String>,
}

/// Owns the SQLite connection to the message store.
pub struct TelephonyDb {
    conn: Connection,
}

impl TelephonyDb {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(SCHEMA)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Creates a thread with the given recipient addresses and returns its id.
    pub fn insert_thread(&self, recipients: &[String]) -> Result<i64, StoreError> {
        self.conn.execute("INSERT INTO threads DEFAULT VALUES", [])?;
        let thread_id = self.conn.last_insert_rowid();
        for address in recipients {
            self.conn.execute(
                "INSERT INTO thread_recipients (thread_id, address) VALUES (?1, ?2)",
                params![thread_id, address],
            )?;
        }
        Ok(thread_id)
    }

    pub fn insert_sms(&self, row: &SmsRow) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO sms (thread_id, address, date, type, subject, body, creator)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.thread_id,
                row.address,
                row.date_ms,
                row.kind,
                row.subject,
                row.body,
                row.creator,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_mms(&self, row: &MmsRow, parts: &[PartRow]) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO mms (thread_id, date, msg_box, subject, creator)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.thread_id, row.date_secs, row.msg_box, row.subject, row.creator],
        )?;
        let message_id = self.conn.last_insert_rowid();
        if let Some(from) = &row.from_address {
            self.conn.execute(
                "INSERT INTO mms_addr (message_id, address, kind) VALUES (?1, ?2, 'from')",
                params![message_id, from],
            )?;
        }
        for part in parts {
            self.conn.execute(
                "INSERT INTO mms_part (message_id, content_type, name, text, data, data_path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message_id,
                    part.content_type,
                    part.name,
                    part.text,
                    part.data,
                    part.data_path,
                ],
            )?;
        }
        Ok(message_id)
    }

    pub fn insert_contact(
        &self,
        address: &str,
        nickname: &str,
        phones: &[String],
    ) -> Result<(), StoreError> {
        let phones_json = serde_json::to_string(phones).unwrap_or_default();
        self.conn.execute(
            "INSERT OR REPLACE INTO contacts (address, nickname, phones) VALUES (?1, ?2, ?3)",
            params![address, nickname, phones_json],
        )?;
        Ok(())
    }
}
