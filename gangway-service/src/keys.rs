//! API-key storage
//!
//! Keys are XORed with a fixed pad and hex-encoded before hitting disk.
//! That hides them from a casual `sqlite3` dump and nothing more — this is
//! a demo store, not encryption.

use gangway_core::ApiKeyStatus;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const OBFUSCATION_PAD: &[u8] = b"gangway-local-dev-pad";

/// Keys shorter than this get no prefix in listings.
const PREFIX_MIN_LEN: usize = 12;
const PREFIX_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("stored key for {0} is corrupt")]
    Corrupt(String),
}

pub struct KeyStore {
    conn: Mutex<Connection>,
}

impl KeyStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS api_keys (
                provider   TEXT PRIMARY KEY,
                key_hex    TEXT NOT NULL,
                label      TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, provider: &str, key: &str, label: Option<&str>) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT INTO api_keys (provider, key_hex, label) VALUES (?1, ?2, ?3)
             ON CONFLICT(provider) DO UPDATE SET
                 key_hex = excluded.key_hex,
                 label = excluded.label",
            rusqlite::params![provider, obfuscate(key), label],
        )?;
        Ok(())
    }

    pub fn get(&self, provider: &str) -> Result<Option<String>, StoreError> {
        let stored: Option<String> = self
            .lock()
            .query_row(
                "SELECT key_hex FROM api_keys WHERE provider = ?1",
                [provider],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            Some(hex) => deobfuscate(&hex)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt(provider.to_string())),
            None => Ok(None),
        }
    }

    /// Deleting an absent provider succeeds; the end state is the same.
    pub fn delete(&self, provider: &str) -> Result<(), StoreError> {
        self.lock()
            .execute("DELETE FROM api_keys WHERE provider = ?1", [provider])?;
        Ok(())
    }

    pub fn exists(&self, provider: &str) -> Result<bool, StoreError> {
        let found: bool = self.lock().query_row(
            "SELECT EXISTS(SELECT 1 FROM api_keys WHERE provider = ?1)",
            [provider],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    pub fn has_any(&self) -> Result<bool, StoreError> {
        let found: bool =
            self.lock()
                .query_row("SELECT EXISTS(SELECT 1 FROM api_keys)", [], |row| row.get(0))?;
        Ok(found)
    }

    pub fn list(&self) -> Result<BTreeMap<String, ApiKeyStatus>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT provider, key_hex FROM api_keys ORDER BY provider")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut listing = BTreeMap::new();
        for row in rows {
            let (provider, hex) = row?;
            let key = deobfuscate(&hex).ok_or_else(|| StoreError::Corrupt(provider.clone()))?;
            listing.insert(
                provider,
                ApiKeyStatus {
                    exists: true,
                    prefix: key_prefix(&key),
                },
            );
        }
        Ok(listing)
    }
}

fn xor(input: &[u8]) -> Vec<u8> {
    input
        .iter()
        .zip(OBFUSCATION_PAD.iter().cycle())
        .map(|(byte, pad)| byte ^ pad)
        .collect()
}

fn obfuscate(plain: &str) -> String {
    hex::encode(xor(plain.as_bytes()))
}

fn deobfuscate(stored: &str) -> Option<String> {
    let bytes = hex::decode(stored).ok()?;
    String::from_utf8(xor(&bytes)).ok()
}

fn key_prefix(key: &str) -> Option<String> {
    (key.chars().count() >= PREFIX_MIN_LEN).then(|| key.chars().take(PREFIX_LEN).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obfuscation_round_trips() {
        for key in ["sk-ant-abc123", "", "short", "ünïcode-key-material"] {
            assert_eq!(deobfuscate(&obfuscate(key)).as_deref(), Some(key));
        }
    }

    #[test]
    fn obfuscated_form_does_not_contain_the_key() {
        let stored = obfuscate("sk-ant-secret");
        assert!(!stored.contains("sk-ant"));
    }

    #[test]
    fn set_get_delete_round_trip() {
        let store = KeyStore::open_in_memory().unwrap();

        assert!(!store.has_any().unwrap());
        store.set("anthropic", "sk-ant-abc123", Some("dev")).unwrap();
        assert!(store.has_any().unwrap());
        assert!(store.exists("anthropic").unwrap());
        assert_eq!(
            store.get("anthropic").unwrap().as_deref(),
            Some("sk-ant-abc123")
        );

        store.delete("anthropic").unwrap();
        assert!(!store.exists("anthropic").unwrap());
        assert_eq!(store.get("anthropic").unwrap(), None);
    }

    #[test]
    fn set_overwrites_existing_key() {
        let store = KeyStore::open_in_memory().unwrap();
        store.set("openai", "sk-old", None).unwrap();
        store.set("openai", "sk-new", Some("rotated")).unwrap();
        assert_eq!(store.get("openai").unwrap().as_deref(), Some("sk-new"));
    }

    #[test]
    fn delete_missing_provider_is_fine() {
        let store = KeyStore::open_in_memory().unwrap();
        store.delete("nobody").unwrap();
    }

    #[test]
    fn listing_prefixes_only_long_keys() {
        let store = KeyStore::open_in_memory().unwrap();
        store.set("anthropic", "sk-ant-abc123xyz", None).unwrap();
        store.set("openai", "short", None).unwrap();

        let listing = store.list().unwrap();
        assert_eq!(
            listing["anthropic"].prefix.as_deref(),
            Some("sk-ant-a")
        );
        assert!(listing["anthropic"].exists);
        assert_eq!(listing["openai"].prefix, None);
        assert!(listing["openai"].exists);
    }
}
