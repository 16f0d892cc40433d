//! Conversation identity: chat guid ↔ native thread id, and time-bounded
//! message listing as `(native id, is_mms)` pairs for the dispatch core to
//! resolve against the right adapter.

use std::rc::Rc;

use rusqlite::params;

use courier_proto::{chat_guid, chat_guid_recipients};

use crate::db::TelephonyDb;
use crate::error::StoreError;

pub struct ThreadAdapter {
    db: Rc<TelephonyDb>,
}

impl ThreadAdapter {
    pub fn new(db: Rc<TelephonyDb>) -> Self {
        Self { db }
    }

    /// Canonical chat guid for a thread, derived from its recipients in
    /// insertion order. `None` for a thread with no recipients.
    pub fn chat_guid(&self, thread_id: i64) -> Result<Option<String>, StoreError> {
        let recipients = self.recipients(thread_id)?;
        if recipients.is_empty() {
            return Ok(None);
        }
        Ok(Some(chat_guid(&recipients)))
    }

    /// Resolves a chat guid back to its native thread id. Lookup only —
    /// a missing thread yields `None` and the caller falls back to the
    /// null thread reference.
    pub fn thread_for_chat_guid(&self, guid: &str) -> Result<Option<i64>, StoreError> {
        let wanted = chat_guid_recipients(guid);
        let Some(first) = wanted.first() else {
            return Ok(None);
        };
        let mut sorted_wanted = wanted.clone();
        sorted_wanted.sort();

        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT DISTINCT thread_id FROM thread_recipients WHERE address = ?1")?;
        let candidates = stmt
            .query_map(params![first], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        for thread_id in candidates {
            let mut recipients = self.recipients(thread_id)?;
            recipients.sort();
            if recipients == sorted_wanted {
                return Ok(Some(thread_id));
            }
        }
        Ok(None)
    }

    /// Messages in a thread strictly after `seconds`, oldest first.
    pub fn messages_after(
        &self,
        thread_id: i64,
        seconds: i64,
    ) -> Result<Vec<(i64, bool)>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT _id, date / 1000 AS ts, 0 AS is_mms FROM sms
               WHERE thread_id = ?1 AND date > ?2 * 1000
             UNION ALL
             SELECT _id, date AS ts, 1 AS is_mms FROM mms
               WHERE thread_id = ?1 AND date > ?2
             ORDER BY ts ASC, is_mms ASC, _id ASC",
        )?;
        let pairs = stmt
            .query_map(params![thread_id, seconds], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(2)? == 1))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }

    /// The `limit` most recent messages in a thread, returned oldest first
    /// so callers emit them in reading order.
    pub fn recent_messages(
        &self,
        thread_id: i64,
        limit: usize,
    ) -> Result<Vec<(i64, bool)>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT _id, date / 1000 AS ts, 0 AS is_mms FROM sms WHERE thread_id = ?1
             UNION ALL
             SELECT _id, date AS ts, 1 AS is_mms FROM mms WHERE thread_id = ?1
             ORDER BY ts DESC, is_mms DESC, _id DESC
             LIMIT ?2",
        )?;
        let mut pairs = stmt
            .query_map(params![thread_id, limit as i64], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(2)? == 1))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        pairs.reverse();
        Ok(pairs)
    }

    fn recipients(&self, thread_id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT address FROM thread_recipients WHERE thread_id = ?1 ORDER BY rowid",
        )?;
        let addresses = stmt
            .query_map(params![thread_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(addresses)
    }
}
