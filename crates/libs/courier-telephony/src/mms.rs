//! MMS projection: message rows plus their sub-parts.
//!
//! Text parts are read inline from the `text` column or from the side file
//! named in `data_path`. `application/smil` parts are presentation
//! metadata, not content, and are discarded. Every other part is
//! materialized to a file under `<cache_dir>/mms/` with a random name
//! before the protocol record references it.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, warn};
use rand_core::{OsRng, RngCore};
use rusqlite::params;

use courier_proto::{chat_guid, mms_guid, Attachment, Message, Part};

use crate::db::{TelephonyDb, MMS_BOX_SENT};
use crate::error::StoreError;

pub struct MmsAdapter {
    db: Rc<TelephonyDb>,
    cache_dir: PathBuf,
    creator_tag: String,
}

impl MmsAdapter {
    pub fn new(db: Rc<TelephonyDb>, cache_dir: PathBuf, creator_tag: impl Into<String>) -> Self {
        Self {
            db,
            cache_dir,
            creator_tag: creator_tag.into(),
        }
    }

    /// Loads one message by native id, assembling text and attachments
    /// from its parts. Rows whose sender cannot be resolved are skipped
    /// with a warning.
    pub fn message(&self, id: i64) -> Result<Option<Message>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT thread_id, date, msg_box, subject, creator FROM mms WHERE _id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let thread_id: i64 = row.get(0)?;
        let date_secs: i64 = row.get(1)?;
        let msg_box: i64 = row.get(2)?;
        let subject: Option<String> = row.get(3)?;
        let creator: Option<String> = row.get(4)?;

        let recipients = self.thread_recipients(thread_id)?;
        if recipients.is_empty() {
            warn!("mms row {id} has no thread recipients, skipping");
            return Ok(None);
        }
        let is_from_me = msg_box == MMS_BOX_SENT;
        let sender_guid = if is_from_me {
            None
        } else {
            match self.sender_address(id)? {
                Some(address) => Some(chat_guid(std::slice::from_ref(&address))),
                None => {
                    warn!("mms row {id} has no sender address, skipping");
                    return Ok(None);
                }
            }
        };

        let mut text = String::new();
        let mut attachments = Vec::new();
        for part in self.parts(id)? {
            match part {
                Part::Text(t) => text.push_str(&t),
                Part::File(attachment) => attachments.push(attachment),
            }
        }

        Ok(Some(Message {
            guid: mms_guid(id),
            timestamp: date_secs,
            subject: subject.unwrap_or_default(),
            text,
            chat_guid: chat_guid(&recipients),
            sender_guid,
            is_from_me,
            sent_from_matrix: creator.as_deref() == Some(self.creator_tag.as_str()),
            attachments,
        }))
    }

    /// Distinct thread ids with MMS activity strictly after `seconds`.
    pub fn thread_ids_after(&self, seconds: i64) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT DISTINCT thread_id FROM mms WHERE date > ?1")?;
        let ids = stmt
            .query_map(params![seconds], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Projects the sub-parts of one message.
    pub fn parts(&self, message_id: i64) -> Result<Vec<Part>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT _id, content_type, name, text, data, data_path
             FROM mms_part WHERE message_id = ?1 ORDER BY _id",
        )?;
        let rows = stmt.query_map(params![message_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<Vec<u8>>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut parts = Vec::new();
        for row in rows {
            let (part_id, content_type, name, text, data, data_path) = row?;
            if content_type == "text/plain" {
                parts.push(Part::Text(self.read_text(text, data_path)?));
            } else if content_type == "application/smil" {
                debug!("ignoring {content_type} part {part_id}");
            } else {
                let Some(bytes) = self.part_bytes(data, data_path)? else {
                    warn!("mms part {part_id} ({content_type}) has no content, skipping");
                    continue;
                };
                let path = self.materialize(&bytes)?;
                parts.push(Part::File(Attachment {
                    mime_type: content_type,
                    file_name: name.unwrap_or_else(random_name),
                    path_on_disk: path,
                }));
            }
        }
        Ok(parts)
    }

    fn thread_recipients(&self, thread_id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT address FROM thread_recipients WHERE thread_id = ?1 ORDER BY rowid",
        )?;
        let addresses = stmt
            .query_map(params![thread_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(addresses)
    }

    fn sender_address(&self, message_id: i64) -> Result<Option<String>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT address FROM mms_addr WHERE message_id = ?1 AND kind = 'from' LIMIT 1",
        )?;
        let mut rows = stmt.query(params![message_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn read_text(
        &self,
        text: Option<String>,
        data_path: Option<String>,
    ) -> Result<String, StoreError> {
        if let Some(path) = data_path {
            return Ok(fs::read_to_string(path)?);
        }
        Ok(text.unwrap_or_default())
    }

    fn part_bytes(
        &self,
        data: Option<Vec<u8>>,
        data_path: Option<String>,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(bytes) = data {
            return Ok(Some(bytes));
        }
        if let Some(path) = data_path {
            return Ok(Some(fs::read(path)?));
        }
        Ok(None)
    }

    fn materialize(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let dir = self.cache_dir.join("mms");
        fs::create_dir_all(&dir)?;
        let path = dir.join(random_name());
        fs::write(&path, bytes)?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Collision-free random file name.
fn random_name() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MmsRow, PartRow, MMS_BOX_INBOX};

    fn store() -> (Rc<TelephonyDb>, i64, tempfile::TempDir) {
        let db = Rc::new(TelephonyDb::in_memory().expect("open store"));
        let thread = db
            .insert_thread(&["+15550001".to_string()])
            .expect("insert thread");
        let cache = tempfile::tempdir().expect("cache dir");
        (db, thread, cache)
    }

    fn inbound_row(thread: i64) -> MmsRow {
        MmsRow {
            thread_id: thread,
            date_secs: 1_500,
            msg_box: MMS_BOX_INBOX,
            from_address: Some("+15550001".to_string()),
            ..MmsRow::default()
        }
    }

    #[test]
    fn assembles_text_and_attachment_parts() {
        let (db, thread, cache) = store();
        let id = db
            .insert_mms(
                &inbound_row(thread),
                &[
                    PartRow {
                        content_type: "text/plain".to_string(),
                        text: Some("picture: ".to_string()),
                        ..PartRow::default()
                    },
                    PartRow {
                        content_type: "application/smil".to_string(),
                        text: Some("<smil/>".to_string()),
                        ..PartRow::default()
                    },
                    PartRow {
                        content_type: "image/jpeg".to_string(),
                        name: Some("photo.jpg".to_string()),
                        data: Some(vec![0xFF, 0xD8, 0xFF]),
                        ..PartRow::default()
                    },
                ],
            )
            .expect("insert mms");

        let adapter = MmsAdapter::new(db, cache.path().to_path_buf(), "courier");
        let message = adapter.message(id).expect("query").expect("mapped");
        assert_eq!(message.guid, format!("mms_{id}"));
        assert_eq!(message.timestamp, 1_500);
        assert_eq!(message.text, "picture: ");
        assert_eq!(message.attachments.len(), 1);
        let attachment = &message.attachments[0];
        assert_eq!(attachment.mime_type, "image/jpeg");
        assert_eq!(attachment.file_name, "photo.jpg");
        let materialized = fs::read(&attachment.path_on_disk).expect("read cache file");
        assert_eq!(materialized, vec![0xFF, 0xD8, 0xFF]);
        assert!(attachment.path_on_disk.contains("mms"));
    }

    #[test]
    fn text_part_prefers_side_file() {
        let (db, thread, cache) = store();
        let side = cache.path().join("part_text");
        fs::write(&side, "from side file").expect("write side file");
        let id = db
            .insert_mms(
                &inbound_row(thread),
                &[PartRow {
                    content_type: "text/plain".to_string(),
                    text: Some("inline".to_string()),
                    data_path: Some(side.to_string_lossy().into_owned()),
                    ..PartRow::default()
                }],
            )
            .expect("insert mms");

        let adapter = MmsAdapter::new(db, cache.path().to_path_buf(), "courier");
        let message = adapter.message(id).expect("query").expect("mapped");
        assert_eq!(message.text, "from side file");
    }

    #[test]
    fn inbound_without_sender_address_is_skipped() {
        let (db, thread, cache) = store();
        let id = db
            .insert_mms(
                &MmsRow {
                    thread_id: thread,
                    date_secs: 1_000,
                    msg_box: MMS_BOX_INBOX,
                    from_address: None,
                    ..MmsRow::default()
                },
                &[],
            )
            .expect("insert mms");

        let adapter = MmsAdapter::new(db, cache.path().to_path_buf(), "courier");
        assert!(adapter.message(id).expect("query").is_none());
    }

    #[test]
    fn sent_mms_needs_no_sender_address() {
        let (db, thread, cache) = store();
        let id = db
            .insert_mms(
                &MmsRow {
                    thread_id: thread,
                    date_secs: 1_000,
                    msg_box: MMS_BOX_SENT,
                    creator: Some("courier".to_string()),
                    ..MmsRow::default()
                },
                &[PartRow {
                    content_type: "text/plain".to_string(),
                    text: Some("sent".to_string()),
                    ..PartRow::default()
                }],
            )
            .expect("insert mms");

        let adapter = MmsAdapter::new(db, cache.path().to_path_buf(), "courier");
        let message = adapter.message(id).expect("query").expect("mapped");
        assert!(message.is_from_me);
        assert_eq!(message.sender_guid, None);
        assert!(message.sent_from_matrix);
    }
}
