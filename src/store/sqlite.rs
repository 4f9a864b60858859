use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};

use crate::models::settings::Setting;
use crate::models::user::User;

use super::{generate_doc_id, merge_fields, missing_doc, sanitize_field, Direction, Document, Fields, Query, Store};

pub use crate::db::DbPool;

/// SQLite-backed implementation of the Store trait.
/// Documents are JSON objects in the `documents` table; listings order by
/// `json_extract` on the requested field.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn new_at(path: &str) -> Result<Self, String> {
        let pool = crate::db::init_pool_at(path)?;
        Ok(Self { pool })
    }
}

fn parse_fields(raw: &str) -> Result<Fields, String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("Stored document is not an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn doc_exists(conn: &rusqlite::Connection, collection: &str, id: &str) -> Result<bool, String> {
    conn.query_row(
        "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
    .map_err(|e| e.to_string())
}

fn write_doc(
    conn: &rusqlite::Connection,
    collection: &str,
    id: &str,
    fields: &Fields,
    merge: bool,
) -> Result<(), String> {
    let mut data = if merge {
        let existing: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.to_string())?;
        match existing {
            Some(raw) => parse_fields(&raw)?,
            None => Fields::new(),
        }
    } else {
        Fields::new()
    };
    merge_fields(&mut data, fields);
    let json = serde_json::to_string(&data).map_err(|e| e.to_string())?;

    conn.execute(
        "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
         ON CONFLICT(collection, id) DO UPDATE SET data = ?3, updated_at = CURRENT_TIMESTAMP",
        params![collection, id, json],
    )
    .map_err(|e| e.to_string())?;
    Ok(())
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool).map_err(|e| e.to_string())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        crate::db::seed_defaults(&self.pool).map_err(|e| e.to_string())
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        Setting::get(&self.pool, key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), String> {
        Setting::set(&self.pool, key, value)
    }

    fn setting_all(&self) -> HashMap<String, String> {
        Setting::all(&self.pool)
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        User::get_by_id(&self.pool, id)
    }

    fn user_get_by_email(&self, email: &str) -> Option<User> {
        User::get_by_email(&self.pool, email)
    }

    fn user_create(&self, email: &str, password_hash: &str) -> Result<i64, String> {
        User::create(&self.pool, email, password_hash)
    }

    fn user_count(&self) -> i64 {
        User::count(&self.pool)
    }

    fn user_touch_last_login(&self, id: i64) -> Result<(), String> {
        User::touch_last_login(&self.pool, id)
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(&self, user_id: i64, session_id: &str, expires_at: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO sessions (id, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![session_id, user_id, expires_at],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_get_user(&self, session_id: &str) -> Option<User> {
        let conn = self.pool.get().ok()?;
        let cols = User::SELECT_COLS
            .split(", ")
            .map(|c| format!("u.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        conn.query_row(
            &format!(
                "SELECT {} FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.id = ?1 AND s.expires_at > datetime('now')",
                cols
            ),
            params![session_id],
            User::from_row,
        )
        .ok()
    }

    fn session_refresh(&self, session_id: &str, expires_at: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let n = conn
            .execute(
                "UPDATE sessions SET expires_at = ?1 WHERE id = ?2",
                params![expires_at, session_id],
            )
            .map_err(|e| e.to_string())?;
        if n == 0 {
            return Err("Session not found".to_string());
        }
        Ok(())
    }

    fn session_delete(&self, session_id: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_cleanup_expired(&self) -> Result<usize, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM sessions WHERE expires_at <= datetime('now')",
            [],
        )
        .map_err(|e| e.to_string())
    }

    // ── Documents ───────────────────────────────────────────────────

    fn doc_get(&self, collection: &str, id: &str) -> Result<Option<Document>, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.to_string())?;
        match raw {
            Some(raw) => Ok(Some(Document {
                id: id.to_string(),
                data: parse_fields(&raw)?,
            })),
            None => Ok(None),
        }
    }

    fn doc_set(&self, collection: &str, id: &str, fields: &Fields, merge: bool) -> Result<(), String> {
        let mut conn = self.pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;
        write_doc(&tx, collection, id, fields, merge)?;
        tx.commit().map_err(|e| e.to_string())
    }

    fn doc_add(&self, collection: &str, fields: &Fields) -> Result<String, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let id = generate_doc_id();
        write_doc(&conn, collection, &id, fields, false)?;
        Ok(id)
    }

    fn doc_delete(&self, collection: &str, id: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn doc_query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let path = format!("$.{}", sanitize_field(&query.order_by));
        let dir = match query.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        // Documents missing the field sort last either way, like an index would skip them.
        let sql = format!(
            "SELECT id, data FROM documents WHERE collection = ?1
             ORDER BY json_extract(data, ?2) IS NULL, json_extract(data, ?2) {}, id ASC
             LIMIT ?3",
            dir
        );
        let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map(params![collection, path, query.limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| e.to_string())?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, raw) = row.map_err(|e| e.to_string())?;
            docs.push(Document {
                id,
                data: parse_fields(&raw)?,
            });
        }
        Ok(docs)
    }

    fn doc_batch_merge(&self, collection: &str, writes: &[(String, Fields)]) -> Result<(), String> {
        let mut conn = self.pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;
        for (id, fields) in writes {
            // Dropping the transaction rolls back earlier writes.
            if !doc_exists(&tx, collection, id)? {
                return Err(missing_doc(id));
            }
            write_doc(&tx, collection, id, fields, true)?;
        }
        tx.commit().map_err(|e| e.to_string())
    }
}
