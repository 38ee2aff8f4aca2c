use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::format_timestamp;
use crate::migrations::current_version;
use crate::models::{BadgeRow, TrendRow};

/// Auxiliary store for badges and trending counters.
///
/// Lives in its own SQLite file so it can be wiped or rebuilt without touching
/// accounts and messages.
pub struct DocStore {
    conn: Mutex<Connection>,
}

impl DocStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        run_migrations(&conn)?;

        info!("Document store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Doc store lock poisoned: {}", e))?;
        f(&conn)
    }

    // -- Badges --

    /// Append a badge award. Awards are never updated or removed.
    pub fn award_badge(
        &self,
        id: &str,
        user_id: &str,
        name: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> Result<BadgeRow> {
        let earned_at = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO badges (id, user_id, name, description, image_url, earned_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, user_id, name, description, image_url, earned_at],
            )?;
            Ok(BadgeRow {
                id: id.to_string(),
                user_id: user_id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                image_url: image_url.map(str::to_string),
                earned_at,
            })
        })
    }

    /// Oldest award first.
    pub fn list_badges(&self, user_id: &str) -> Result<Vec<BadgeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, description, image_url, earned_at
                 FROM badges WHERE user_id = ?1 ORDER BY earned_at, rowid",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(BadgeRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        description: row.get(3)?,
                        image_url: row.get(4)?,
                        earned_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Trends --

    /// Increment the counter for `(kind, name)`, creating it at 1. Returns the new count.
    pub fn bump_trend(&self, kind: &str, name: &str) -> Result<i64> {
        let now = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            let count = conn.query_row(
                "INSERT INTO trends (type, name, count, updated_at) VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(type, name) DO UPDATE SET count = count + 1, updated_at = excluded.updated_at
                 RETURNING count",
                params![kind, name, now],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Highest counts first, optionally restricted to one kind.
    pub fn top_trends(&self, kind: Option<&str>, limit: u32) -> Result<Vec<TrendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT type, name, count, updated_at FROM trends
                 WHERE ?1 IS NULL OR type = ?1
                 ORDER BY count DESC, updated_at DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![kind, limit], |row| {
                    Ok(TrendRow {
                        kind: row.get(0)?,
                        name: row.get(1)?,
                        count: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    if current_version(conn)? < 1 {
        info!("Doc store: running migration v1 (badges, trends)");
        conn.execute_batch(
            "
            CREATE TABLE badges (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                image_url   TEXT,
                earned_at   TEXT NOT NULL
            );

            CREATE INDEX idx_badges_user ON badges(user_id);

            CREATE TABLE trends (
                type        TEXT NOT NULL,
                name        TEXT NOT NULL,
                count       INTEGER NOT NULL DEFAULT 0,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (type, name)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}
