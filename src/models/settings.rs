use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

use crate::db::DbPool;

/// Runtime tunables (list caps, intervals, retry delays) kept as text in
/// the `settings` table.
pub struct Setting;

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .unwrap_or_else(|e| {
                log::warn!("Setting {} unreadable: {}", key, e);
                None
            })
    }

    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map(|_| ())
        .map_err(|e| e.to_string())
    }

    /// Insert every missing default; values already present are kept.
    /// Returns how many keys were added.
    pub fn seed(pool: &DbPool, defaults: &[(&str, &str)]) -> Result<usize, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let mut added = 0;
        for (key, value) in defaults {
            added += conn
                .execute(
                    "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .map_err(|e| e.to_string())?;
        }
        Ok(added)
    }

    pub fn all(pool: &DbPool) -> HashMap<String, String> {
        let Ok(conn) = pool.get() else {
            return HashMap::new();
        };
        let Ok(mut stmt) = conn.prepare("SELECT key, value FROM settings") else {
            return HashMap::new();
        };
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map(|rows| rows.filter_map(Result::ok).collect())
            .unwrap_or_default()
    }
}
