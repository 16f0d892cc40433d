//! Contact projection keyed by a user guid (address or `SMS;-;` guid).

use std::rc::Rc;

use rusqlite::params;

use courier_proto::{chat_guid_recipients, Contact};

use crate::db::TelephonyDb;
use crate::error::StoreError;

pub struct ContactAdapter {
    db: Rc<TelephonyDb>,
}

impl ContactAdapter {
    pub fn new(db: Rc<TelephonyDb>) -> Self {
        Self { db }
    }

    /// Looks up a contact by user guid. Unknown guids fall back to a
    /// contact whose nickname is the bare address, so callers always get
    /// something displayable.
    pub fn contact(&self, user_guid: &str) -> Result<Contact, StoreError> {
        let address = chat_guid_recipients(user_guid)
            .into_iter()
            .next()
            .unwrap_or_else(|| user_guid.to_string());
        self.by_address(&address)
    }

    /// Batch lookup preserving input order.
    pub fn contacts(&self, addresses: &[String]) -> Result<Vec<Contact>, StoreError> {
        addresses.iter().map(|a| self.by_address(a)).collect()
    }

    fn by_address(&self, address: &str) -> Result<Contact, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT nickname, phones FROM contacts WHERE address = ?1")?;
        let mut rows = stmt.query(params![address])?;
        match rows.next()? {
            Some(row) => {
                let nickname: String = row.get(0)?;
                let phones_json: Option<String> = row.get(1)?;
                let phones = phones_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str(json).ok())
                    .unwrap_or_else(|| vec![address.to_string()]);
                Ok(Contact { nickname, phones })
            }
            None => Ok(Contact {
                nickname: address.to_string(),
                phones: vec![address.to_string()],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_contact_resolves_nickname_and_phones() {
        let db = Rc::new(TelephonyDb::in_memory().expect("open store"));
        db.insert_contact(
            "+15550001",
            "Ada",
            &["+15550001".to_string(), "+15559999".to_string()],
        )
        .expect("insert contact");

        let adapter = ContactAdapter::new(db);
        let contact = adapter.contact("SMS;-;+15550001").expect("lookup");
        assert_eq!(contact.nickname, "Ada");
        assert_eq!(contact.phones, vec!["+15550001", "+15559999"]);
    }

    #[test]
    fn unknown_guid_falls_back_to_bare_address() {
        let db = Rc::new(TelephonyDb::in_memory().expect("open store"));
        let adapter = ContactAdapter::new(db);
        let contact = adapter.contact("SMS;-;+17770000").expect("lookup");
        assert_eq!(contact.nickname, "+17770000");
        assert_eq!(contact.phones, vec!["+17770000"]);
    }

    #[test]
    fn batch_lookup_preserves_order() {
        let db = Rc::new(TelephonyDb::in_memory().expect("open store"));
        db.insert_contact("+15550002", "Grace", &["+15550002".to_string()])
            .expect("insert contact");

        let adapter = ContactAdapter::new(db);
        let contacts = adapter
            .contacts(&["+15550001".to_string(), "+15550002".to_string()])
            .expect("lookup");
        assert_eq!(contacts[0].nickname, "+15550001");
        assert_eq!(contacts[1].nickname, "Grace");
    }
}
