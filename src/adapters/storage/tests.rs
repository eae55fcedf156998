use std::path::PathBuf;

use rusqlite::{params, Connection};

use super::KvStore;
use crate::core::ports::store::ConversationStore;
use crate::core::types::{Conversation, Message, UserProfile};

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("vita-kv-{}.db", uuid::Uuid::new_v4()))
}

fn conversation(id: &str, updated: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        name: "🔍 Test Conversation".to_string(),
        messages: vec![
            Message::user(1, "i have a question", None),
            Message::bot(2, "happy to help"),
        ],
        last_updated: updated.to_string(),
    }
}

#[test]
fn conversation_round_trip_is_deep_equal() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");

    let record = conversation("abc", "2024-06-01T10:00:00.000Z");
    store.save_conversation(&record);
    let loaded = store.load_conversation("abc").expect("record present");
    assert_eq!(loaded, record);

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn save_overwrites_record_with_same_id() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");

    store.save_conversation(&conversation("abc", "2024-06-01T10:00:00.000Z"));
    let mut updated = conversation("abc", "2024-06-02T10:00:00.000Z");
    updated.messages.push(Message::user(3, "one more thing", None));
    store.save_conversation(&updated);

    let listed = store.list_conversations();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].messages.len(), 3);

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn deleted_conversation_never_appears_in_listing() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");

    store.save_conversation(&conversation("keep", "2024-06-01T10:00:00.000Z"));
    store.save_conversation(&conversation("drop", "2024-06-02T10:00:00.000Z"));
    store.delete_conversation("drop");
    // Idempotent: a second delete of an absent record is fine.
    store.delete_conversation("drop");

    let ids: Vec<String> = store
        .list_conversations()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["keep".to_string()]);

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn listing_is_sorted_newest_first() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");

    store.save_conversation(&conversation("old", "2024-01-01T00:00:00.000Z"));
    store.save_conversation(&conversation("new", "2024-12-01T00:00:00.000Z"));
    store.save_conversation(&conversation("mid", "2024-06-01T00:00:00.000Z"));

    let ids: Vec<String> = store
        .list_conversations()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn corrupt_entry_is_purged_not_surfaced() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");
    store.save_conversation(&conversation("good", "2024-06-01T10:00:00.000Z"));
    drop(store);

    // Plant an unparsable value under a namespaced key.
    let conn = Connection::open(&db_path).expect("open raw sqlite");
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)",
        params!["chat_bad", "{not json"],
    )
    .expect("insert corrupt row");
    drop(conn);

    let store = KvStore::open(&db_path).expect("reopen store");
    let ids: Vec<String> = store
        .list_conversations()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["good".to_string()]);

    // The offending key must be gone from the underlying store.
    let conn = Connection::open(&db_path).expect("open raw sqlite");
    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM kv WHERE key = 'chat_bad'",
            [],
            |row| row.get(0),
        )
        .expect("count corrupt rows");
    assert_eq!(remaining, 0);

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn profile_is_a_singleton_with_clear() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");
    assert!(store.load_profile().is_none());

    let profile = UserProfile {
        name: Some("Ana".into()),
        age: Some("34".into()),
        concerns: Some("sleep".into()),
        ..Default::default()
    };
    store.save_profile(&profile);
    assert_eq!(store.load_profile(), Some(profile.clone()));

    let replacement = UserProfile {
        name: Some("Ana M.".into()),
        ..profile
    };
    store.save_profile(&replacement);
    assert_eq!(store.load_profile(), Some(replacement));

    store.clear_profile();
    assert!(store.load_profile().is_none());

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn clear_all_removes_namespaced_keys_only() {
    let db_path = temp_db_path();
    let store = KvStore::open(&db_path).expect("open store");

    store.save_conversation(&conversation("one", "2024-06-01T10:00:00.000Z"));
    store.save_profile(&UserProfile::default());
    drop(store);

    let conn = Connection::open(&db_path).expect("open raw sqlite");
    conn.execute(
        "INSERT INTO kv (key, value) VALUES ('unrelated', 'x')",
        [],
    )
    .expect("insert unrelated row");
    drop(conn);

    let store = KvStore::open(&db_path).expect("reopen store");
    store.clear_all();
    assert!(store.list_conversations().is_empty());
    assert!(store.load_profile().is_none());

    let conn = Connection::open(&db_path).expect("open raw sqlite");
    let unrelated: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM kv WHERE key = 'unrelated'",
            [],
            |row| row.get(0),
        )
        .expect("count unrelated rows");
    assert_eq!(unrelated, 1);

    let _ = std::fs::remove_file(db_path);
}
