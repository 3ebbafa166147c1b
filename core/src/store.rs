/// Client-local persistence: bearer credential and per-conversation notes
///
/// Stored independently of the sync engine; losing this DB never corrupts
/// synchronized state.
use crate::error::{Result, SyncError};
use std::path::Path;

const CREDENTIAL_KEY: &str = "credential";
const NOTE_PREFIX: &str = "note:";

pub struct ClientStore {
    db: sled::Db,
}

impl ClientStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let db = sled::open(data_dir.join("client.db"))
            .map_err(|e| SyncError::Storage(format!("client DB: {}", e)))?;
        Ok(Self { db })
    }

    /// Store the bearer credential
    pub fn set_credential(&self, token: &str) -> Result<()> {
        self.db
            .insert(CREDENTIAL_KEY, token.as_bytes())
            .map_err(|e| SyncError::Storage(format!("set_credential: {}", e)))?;
        Ok(())
    }

    pub fn credential(&self) -> Result<Option<String>> {
        match self
            .db
            .get(CREDENTIAL_KEY)
            .map_err(|e| SyncError::Storage(format!("credential: {}", e)))?
        {
            Some(val) => Ok(Some(String::from_utf8_lossy(&val).to_string())),
            None => Ok(None),
        }
    }

    /// Remove the credential (forced sign-out)
    pub fn clear_credential(&self) -> Result<()> {
        self.db
            .remove(CREDENTIAL_KEY)
            .map_err(|e| SyncError::Storage(format!("clear_credential: {}", e)))?;
        Ok(())
    }

    /// Store a free-text note for a conversation
    pub fn set_note(&self, chat_id: &str, note: &str) -> Result<()> {
        let key = format!("{}{}", NOTE_PREFIX, chat_id);
        self.db
            .insert(key.as_bytes(), note.as_bytes())
            .map_err(|e| SyncError::Storage(format!("set_note: {}", e)))?;
        Ok(())
    }

    pub fn note(&self, chat_id: &str) -> Result<Option<String>> {
        let key = format!("{}{}", NOTE_PREFIX, chat_id);
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| SyncError::Storage(format!("note: {}", e)))?
        {
            Some(val) => Ok(Some(String::from_utf8_lossy(&val).to_string())),
            None => Ok(None),
        }
    }

    pub fn remove_note(&self, chat_id: &str) -> Result<bool> {
        let key = format!("{}{}", NOTE_PREFIX, chat_id);
        let removed = self
            .db
            .remove(key.as_bytes())
            .map_err(|e| SyncError::Storage(format!("remove_note: {}", e)))?;
        Ok(removed.is_some())
    }
}

impl Clone for ClientStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_credential_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let store = ClientStore::new(temp_dir.path()).unwrap();

        assert_eq!(store.credential().unwrap(), None);
        store.set_credential("tok-1").unwrap();
        assert_eq!(store.credential().unwrap(), Some("tok-1".to_string()));
        store.clear_credential().unwrap();
        assert_eq!(store.credential().unwrap(), None);
    }

    #[test]
    fn test_notes_keyed_by_chat() {
        let temp_dir = TempDir::new().unwrap();
        let store = ClientStore::new(temp_dir.path()).unwrap();

        store.set_note("a@c.us", "VIP customer").unwrap();
        store.set_note("b@c.us", "refund pending").unwrap();
        assert_eq!(store.note("a@c.us").unwrap(), Some("VIP customer".to_string()));
        assert_eq!(store.note("b@c.us").unwrap(), Some("refund pending".to_string()));

        assert!(store.remove_note("a@c.us").unwrap());
        assert!(!store.remove_note("a@c.us").unwrap());
        assert_eq!(store.note("a@c.us").unwrap(), None);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let store = ClientStore::new(temp_dir.path()).unwrap();
        store.set_credential("tok-2").unwrap();
        drop(store);

        let store2 = ClientStore::new(temp_dir.path()).unwrap();
        assert_eq!(store2.credential().unwrap(), Some("tok-2".to_string()));
    }
}
