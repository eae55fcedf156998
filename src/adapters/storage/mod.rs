//! Key-value persistence over a single SQLite table.
//!
//! Stands in for the browser-origin string store the original design
//! assumed: string keys, JSON string values, no transactions across
//! keys. Conversations live under `chat_<id>`, the profile under
//! `user_data`.

use std::path::Path;

use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::core::ports::store::ConversationStore;
use crate::core::types::{Conversation, UserProfile};

#[cfg(test)]
mod tests;

pub const CHAT_PREFIX: &str = "chat_";
pub const PROFILE_KEY: &str = "user_data";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    fn chat_key(id: &str) -> String {
        format!("{CHAT_PREFIX}{id}")
    }

    fn put(&self, key: &str, value: &str) {
        let result = self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        );
        if let Err(e) = result {
            log::error!("failed to write key {key}: {e}");
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        {
            Ok(value) => value,
            Err(e) => {
                log::error!("failed to read key {key}: {e}");
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
        {
            log::error!("failed to delete key {key}: {e}");
        }
    }

    fn chat_entries(&self) -> Vec<(String, String)> {
        let mut stmt = match self
            .conn
            .prepare("SELECT key, value FROM kv WHERE key LIKE ?1")
        {
            Ok(stmt) => stmt,
            Err(e) => {
                log::error!("failed to scan conversation keys: {e}");
                return Vec::new();
            }
        };
        let rows = stmt.query_map(params![format!("{CHAT_PREFIX}%")], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        });
        match rows {
            Ok(rows) => rows.filter_map(|row| row.ok()).collect(),
            Err(e) => {
                log::error!("failed to scan conversation keys: {e}");
                Vec::new()
            }
        }
    }
}

fn updated_sort_key(value: &str) -> i64 {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.timestamp_millis())
        .unwrap_or(0)
}

impl ConversationStore for KvStore {
    fn save_conversation(&self, conversation: &Conversation) {
        match serde_json::to_string(conversation) {
            Ok(json) => self.put(&Self::chat_key(&conversation.id), &json),
            Err(e) => log::error!("failed to serialize conversation {}: {e}", conversation.id),
        }
    }

    fn load_conversation(&self, id: &str) -> Option<Conversation> {
        let raw = self.get(&Self::chat_key(id))?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("conversation {id} failed to parse: {e}");
                None
            }
        }
    }

    fn delete_conversation(&self, id: &str) {
        self.remove(&Self::chat_key(id));
    }

    fn list_conversations(&self) -> Vec<Conversation> {
        let mut records: Vec<Conversation> = Vec::new();
        for (key, raw) in self.chat_entries() {
            match serde_json::from_str::<Conversation>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // Corrupt entries are purged so they never resurface.
                    log::warn!("purging unparsable record under {key}: {e}");
                    self.remove(&key);
                }
            }
        }
        records.sort_by_key(|record| std::cmp::Reverse(updated_sort_key(&record.last_updated)));
        records
    }

    fn save_profile(&self, profile: &UserProfile) {
        match serde_json::to_string(profile) {
            Ok(json) => self.put(PROFILE_KEY, &json),
            Err(e) => log::error!("failed to serialize profile: {e}"),
        }
    }

    fn load_profile(&self) -> Option<UserProfile> {
        let raw = self.get(PROFILE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                log::warn!("stored profile failed to parse: {e}");
                None
            }
        }
    }

    fn clear_profile(&self) {
        self.remove(PROFILE_KEY);
    }

    fn clear_all(&self) {
        let result = self.conn.execute(
            "DELETE FROM kv WHERE key LIKE ?1 OR key = ?2",
            params![format!("{CHAT_PREFIX}%"), PROFILE_KEY],
        );
        if let Err(e) = result {
            log::error!("failed to clear stored data: {e}");
        }
    }
}
