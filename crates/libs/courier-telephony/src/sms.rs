//! SMS projection: one native row per message.

use std::rc::Rc;

use log::warn;
use rusqlite::params;

use courier_proto::{chat_guid, Message};

use crate::db::{TelephonyDb, SMS_TYPE_OUTBOX, SMS_TYPE_SENT};
use crate::error::StoreError;

pub struct SmsAdapter {
    db: Rc<TelephonyDb>,
    creator_tag: String,
}

impl SmsAdapter {
    /// `creator_tag` is the value the bridge writes into `sms.creator` for
    /// its own messages; rows matching it report `sent_from_matrix`.
    pub fn new(db: Rc<TelephonyDb>, creator_tag: impl Into<String>) -> Self {
        Self {
            db,
            creator_tag: creator_tag.into(),
        }
    }

    /// Loads one message by native id. Rows without an address resolve to
    /// `None` (skipped with a warning, per the data-error policy).
    pub fn message(&self, id: i64) -> Result<Option<Message>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT _id, address, date, type, subject, body, creator
             FROM sms WHERE _id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(self.map_row(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            )),
            None => Ok(None),
        }
    }

    /// Distinct thread ids with SMS activity strictly after `millis`.
    pub fn thread_ids_after(&self, millis: i64) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT DISTINCT thread_id FROM sms WHERE date > ?1")?;
        let ids = stmt
            .query_map(params![millis], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    #[allow(clippy::too_many_arguments)]
    fn map_row(
        &self,
        id: i64,
        address: Option<String>,
        date_ms: i64,
        kind: i64,
        subject: Option<String>,
        body: Option<String>,
        creator: Option<String>,
    ) -> Option<Message> {
        let Some(address) = address else {
            warn!("sms row {id} has no address, skipping");
            return None;
        };
        let is_from_me = kind == SMS_TYPE_SENT || kind == SMS_TYPE_OUTBOX;
        let guid = chat_guid(std::slice::from_ref(&address));
        Some(Message {
            guid: id.to_string(),
            timestamp: date_ms / 1000,
            subject: subject.unwrap_or_default(),
            text: body.unwrap_or_default(),
            chat_guid: guid.clone(),
            sender_guid: (!is_from_me).then_some(guid),
            is_from_me,
            sent_from_matrix: creator.as_deref() == Some(self.creator_tag.as_str()),
            attachments: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SmsRow, SMS_TYPE_INBOX};

    fn store() -> (Rc<TelephonyDb>, i64) {
        let db = Rc::new(TelephonyDb::in_memory().expect("open store"));
        let thread = db
            .insert_thread(&["+15550001".to_string()])
            .expect("insert thread");
        (db, thread)
    }

    #[test]
    fn maps_inbound_row_to_protocol_message() {
        let (db, thread) = store();
        let id = db
            .insert_sms(&SmsRow {
                thread_id: thread,
                address: Some("+15550001".to_string()),
                date_ms: 1_500_000,
                kind: SMS_TYPE_INBOX,
                body: Some("hello".to_string()),
                ..SmsRow::default()
            })
            .expect("insert");

        let adapter = SmsAdapter::new(db, "courier");
        let message = adapter.message(id).expect("query").expect("mapped");
        assert_eq!(message.guid, id.to_string());
        assert_eq!(message.timestamp, 1_500);
        assert_eq!(message.text, "hello");
        assert_eq!(message.chat_guid, "SMS;-;+15550001");
        assert_eq!(message.sender_guid.as_deref(), Some("SMS;-;+15550001"));
        assert!(!message.is_from_me);
        assert!(!message.sent_from_matrix);
    }

    #[test]
    fn sent_row_has_no_sender_guid_and_honors_creator_tag() {
        let (db, thread) = store();
        let id = db
            .insert_sms(&SmsRow {
                thread_id: thread,
                address: Some("+15550001".to_string()),
                date_ms: 2_000_000,
                kind: SMS_TYPE_SENT,
                body: Some("sent".to_string()),
                creator: Some("courier".to_string()),
                ..SmsRow::default()
            })
            .expect("insert");

        let adapter = SmsAdapter::new(db, "courier");
        let message = adapter.message(id).expect("query").expect("mapped");
        assert!(message.is_from_me);
        assert_eq!(message.sender_guid, None);
        assert!(message.sent_from_matrix);
    }

    #[test]
    fn row_without_address_is_skipped() {
        let (db, thread) = store();
        let id = db
            .insert_sms(&SmsRow {
                thread_id: thread,
                address: None,
                date_ms: 1_000,
                kind: SMS_TYPE_INBOX,
                ..SmsRow::default()
            })
            .expect("insert");

        let adapter = SmsAdapter::new(db, "courier");
        assert!(adapter.message(id).expect("query").is_none());
    }

    #[test]
    fn thread_ids_after_is_strict_and_distinct() {
        let (db, thread) = store();
        for date_ms in [1_000, 2_000, 3_000] {
            db.insert_sms(&SmsRow {
                thread_id: thread,
                address: Some("+15550001".to_string()),
                date_ms,
                kind: SMS_TYPE_INBOX,
                ..SmsRow::default()
            })
            .expect("insert");
        }

        let adapter = SmsAdapter::new(db, "courier");
        assert_eq!(adapter.thread_ids_after(1_000).expect("query"), vec![thread]);
        assert!(adapter.thread_ids_after(3_000).expect("query").is_empty());
    }
}
