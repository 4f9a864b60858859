use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::models::user::User;

pub mod mongo;
pub mod sqlite;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

/// A document read back from a collection: its key plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    /// The fields with the document key folded in as `id`, ready for
    /// deserializing into a model.
    pub fn into_value(self) -> Value {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Value::Object(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A single-field ordered listing with a result cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub order_by: String,
    pub direction: Direction,
    pub limit: usize,
}

impl Query {
    pub fn new(order_by: &str, direction: Direction, limit: usize) -> Self {
        Query {
            order_by: order_by.to_string(),
            direction,
            limit,
        }
    }
}

/// Keep only `[A-Za-z0-9_]` so a field name can be embedded in a JSON path.
pub(crate) fn sanitize_field(field: &str) -> String {
    field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Shallow merge: every field in `patch` overwrites the same field in `base`,
/// fields absent from `patch` are preserved.
pub fn merge_fields(base: &mut Fields, patch: &Fields) {
    for (k, v) in patch {
        base.insert(k.clone(), v.clone());
    }
}

/// Prefix of the error a batch merge returns when one of its ids is absent.
pub const MISSING_DOC: &str = "Document not found";

pub fn missing_doc(id: &str) -> String {
    format!("{}: {}", MISSING_DOC, id)
}

pub fn is_missing_doc(err: &str) -> bool {
    err.starts_with(MISSING_DOC)
}

/// Firestore-style 20 character alphanumeric document id.
pub fn generate_doc_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

/// Unified data-access trait. Every persistence operation goes through here.
/// Implementations: `SqliteStore` (wraps rusqlite/r2d2) and `MongoStore` (wraps mongodb).
///
/// Document reads return `Err` on backend failure so callers can fall back
/// to a secondary source; `Ok(None)` / empty vectors mean "nothing there".
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn seed_defaults(&self) -> Result<(), String>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_get_bool(&self, key: &str) -> bool {
        self.setting_get(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<(), String>;
    fn setting_all(&self) -> HashMap<String, String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_get_by_id(&self, id: i64) -> Option<User>;
    fn user_get_by_email(&self, email: &str) -> Option<User>;
    fn user_create(&self, email: &str, password_hash: &str) -> Result<i64, String>;
    fn user_count(&self) -> i64;
    fn user_touch_last_login(&self, id: i64) -> Result<(), String>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_create(&self, user_id: i64, session_id: &str, expires_at: &str)
        -> Result<(), String>;
    /// User of an unexpired session.
    fn session_get_user(&self, session_id: &str) -> Option<User>;
    /// Push the expiry of a live session forward.
    fn session_refresh(&self, session_id: &str, expires_at: &str) -> Result<(), String>;
    fn session_delete(&self, session_id: &str) -> Result<(), String>;
    /// Delete expired sessions, return count deleted.
    fn session_cleanup_expired(&self) -> Result<usize, String>;

    // ── Documents ───────────────────────────────────────────────────
    fn doc_get(&self, collection: &str, id: &str) -> Result<Option<Document>, String>;
    /// Write a document under `id`. With `merge`, existing fields not in
    /// `fields` are kept; without it the document is replaced.
    fn doc_set(&self, collection: &str, id: &str, fields: &Fields, merge: bool)
        -> Result<(), String>;
    /// Insert under a generated id and return it.
    fn doc_add(&self, collection: &str, fields: &Fields) -> Result<String, String>;
    fn doc_delete(&self, collection: &str, id: &str) -> Result<(), String>;
    fn doc_query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, String>;
    /// Merge-write several existing documents as one unit: either every write
    /// lands or none does. An id with no document fails the whole batch with
    /// a `missing_doc` error and nothing is created.
    fn doc_batch_merge(&self, collection: &str, writes: &[(String, Fields)])
        -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;
    use serde_json::json;

    /// Create a fresh in-memory SqliteStore with migrations + seed applied.
    fn test_store() -> SqliteStore {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("Failed to create in-memory pool");
        let store = SqliteStore::new(pool);
        store.run_migrations().expect("migrations failed");
        store.seed_defaults().expect("seed failed");
        store
    }

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    // ── Settings ────────────────────────────────────────────────────

    #[test]
    fn test_setting_get_set() {
        let s = test_store();
        assert!(s.setting_get("nonexistent_key_xyz").is_none());
        s.setting_set("test_key", "hello").unwrap();
        assert_eq!(s.setting_get("test_key"), Some("hello".to_string()));
        s.setting_set("test_key", "again").unwrap();
        assert_eq!(s.setting_get("test_key"), Some("again".to_string()));
    }

    #[test]
    fn test_seeded_defaults() {
        let s = test_store();
        assert_eq!(s.setting_get_i64("session_expiry_hours"), 24);
        assert_eq!(s.setting_get_i64("featured_public_cap"), 12);
        assert!(s.setting_all().len() >= crate::db::DEFAULT_SETTINGS.len());
    }

    #[test]
    fn test_setting_get_bool() {
        let s = test_store();
        assert!(!s.setting_get_bool("missing_bool"));
        s.setting_set("flag_one", "1").unwrap();
        s.setting_set("flag_false", "false").unwrap();
        assert!(s.setting_get_bool("flag_one"));
        assert!(!s.setting_get_bool("flag_false"));
    }

    // ── Users & sessions ────────────────────────────────────────────

    #[test]
    fn test_user_create_and_find() {
        let s = test_store();
        let id = s.user_create("owner@example.com", "hash").unwrap();
        assert!(id > 0);
        assert_eq!(s.user_get_by_id(id).unwrap().email, "owner@example.com");
        assert_eq!(s.user_get_by_email("owner@example.com").unwrap().id, id);
        assert!(s.user_create("owner@example.com", "other").is_err());
        assert_eq!(s.user_count(), 1);
    }

    #[test]
    fn test_session_lifecycle() {
        let s = test_store();
        let uid = s.user_create("a@b.it", "h").unwrap();
        s.session_create(uid, "live", "2999-01-01 00:00:00").unwrap();
        s.session_create(uid, "stale", "2000-01-01 00:00:00").unwrap();

        assert_eq!(s.session_get_user("live").unwrap().id, uid);
        assert!(s.session_get_user("stale").is_none());

        assert_eq!(s.session_cleanup_expired().unwrap(), 1);
        s.session_delete("live").unwrap();
        assert!(s.session_get_user("live").is_none());
    }

    #[test]
    fn test_session_refresh_extends_expiry() {
        let s = test_store();
        let uid = s.user_create("a@b.it", "h").unwrap();
        s.session_create(uid, "sess", "2000-01-01 00:00:00").unwrap();
        assert!(s.session_get_user("sess").is_none());
        s.session_refresh("sess", "2999-01-01 00:00:00").unwrap();
        assert!(s.session_get_user("sess").is_some());
    }

    // ── Documents ───────────────────────────────────────────────────

    #[test]
    fn test_doc_set_merge_preserves_fields() {
        let s = test_store();
        s.doc_set("posts", "torta", &fields(json!({"title": "Torta", "image": "a.jpg"})), true)
            .unwrap();
        s.doc_set("posts", "torta", &fields(json!({"title": "Torta 2"})), true)
            .unwrap();
        let doc = s.doc_get("posts", "torta").unwrap().unwrap();
        assert_eq!(doc.data["title"], "Torta 2");
        assert_eq!(doc.data["image"], "a.jpg");
    }

    #[test]
    fn test_doc_set_replace_drops_fields() {
        let s = test_store();
        s.doc_set("posts", "x", &fields(json!({"a": 1, "b": 2})), false).unwrap();
        s.doc_set("posts", "x", &fields(json!({"a": 3})), false).unwrap();
        let doc = s.doc_get("posts", "x").unwrap().unwrap();
        assert_eq!(doc.data.get("b"), None);
        assert_eq!(doc.data["a"], 3);
    }

    #[test]
    fn test_doc_add_generates_ids() {
        let s = test_store();
        let a = s.doc_add("gallery", &fields(json!({"url": "u1"}))).unwrap();
        let b = s.doc_add("gallery", &fields(json!({"url": "u2"}))).unwrap();
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
        assert!(s.doc_get("gallery", &a).unwrap().is_some());
        assert!(s.doc_get("featured", &a).unwrap().is_none());
    }

    #[test]
    fn test_doc_query_order_and_limit() {
        let s = test_store();
        for (id, date) in [("a", "2024-01-05"), ("b", "2024-03-01"), ("c", "2023-12-31")] {
            s.doc_set("posts", id, &fields(json!({ "date": date })), false).unwrap();
        }
        let desc = s
            .doc_query("posts", &Query::new("date", Direction::Desc, 10))
            .unwrap();
        let ids: Vec<&str> = desc.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let capped = s
            .doc_query("posts", &Query::new("date", Direction::Asc, 2))
            .unwrap();
        let ids: Vec<&str> = capped.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_doc_query_numeric_order() {
        let s = test_store();
        for (id, order) in [("x", 10), ("y", 2), ("z", 1)] {
            s.doc_set("featured", id, &fields(json!({ "order": order })), false).unwrap();
        }
        let docs = s
            .doc_query("featured", &Query::new("order", Direction::Asc, 10))
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_doc_batch_merge() {
        let s = test_store();
        s.doc_set("featured", "a", &fields(json!({"name": "A", "order": 5})), false).unwrap();
        s.doc_set("featured", "b", &fields(json!({"name": "B", "order": 6})), false).unwrap();
        s.doc_batch_merge(
            "featured",
            &[
                ("b".to_string(), fields(json!({"order": 1}))),
                ("a".to_string(), fields(json!({"order": 2}))),
            ],
        )
        .unwrap();
        let a = s.doc_get("featured", "a").unwrap().unwrap();
        assert_eq!(a.data["order"], 2);
        assert_eq!(a.data["name"], "A");
    }

    #[test]
    fn test_doc_batch_merge_unknown_id_writes_nothing() {
        let s = test_store();
        s.doc_set("featured", "a", &fields(json!({"name": "A", "order": 5})), false).unwrap();
        let err = s
            .doc_batch_merge(
                "featured",
                &[
                    ("a".to_string(), fields(json!({"order": 1}))),
                    ("ghost".to_string(), fields(json!({"order": 2}))),
                ],
            )
            .unwrap_err();
        assert!(is_missing_doc(&err));
        assert!(s.doc_get("featured", "ghost").unwrap().is_none());
        assert_eq!(s.doc_get("featured", "a").unwrap().unwrap().data["order"], 5);
    }

    #[test]
    fn test_doc_delete() {
        let s = test_store();
        s.doc_set("gallery", "g", &fields(json!({})), false).unwrap();
        s.doc_delete("gallery", "g").unwrap();
        assert!(s.doc_get("gallery", "g").unwrap().is_none());
        // Deleting a missing document is not an error
        s.doc_delete("gallery", "g").unwrap();
    }

    #[test]
    fn test_merge_and_sanitize_helpers() {
        let mut base = fields(json!({"a": 1, "b": 2}));
        merge_fields(&mut base, &fields(json!({"b": 3, "c": 4})));
        assert_eq!(Value::Object(base), json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(sanitize_field("order'); DROP"), "orderDROP");
    }

    #[test]
    fn test_document_into_value_folds_id() {
        let doc = Document {
            id: "abc".to_string(),
            data: fields(json!({"name": "Cannolo"})),
        };
        assert_eq!(doc.into_value(), json!({"id": "abc", "name": "Cannolo"}));
    }
}
