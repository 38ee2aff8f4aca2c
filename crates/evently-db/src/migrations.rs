use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

const NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version = current_version(conn)?;

    if version < 1 {
        info!("DB: running migration v1 (initial schema)");
        conn.execute_batch(&format!(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user',
                image       TEXT,
                created_at  TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE TABLE events (
                id              TEXT PRIMARY KEY,
                organizer_id    TEXT NOT NULL REFERENCES users(id),
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                location        TEXT,
                starts_at       TEXT NOT NULL,
                price_cents     INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE INDEX idx_events_starts_at ON events(starts_at);

            -- No UNIQUE on name: duplicate tags are distinct records
            CREATE TABLE tags (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE TABLE private_messages (
                id              TEXT PRIMARY KEY,
                sender_id       TEXT NOT NULL REFERENCES users(id),
                recipient_id    TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT {NOW},
                updated_at      TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE INDEX idx_private_messages_sender ON private_messages(sender_id);
            CREATE INDEX idx_private_messages_recipient ON private_messages(recipient_id);

            INSERT INTO schema_version (version) VALUES (1);
            "
        ))?;
    }

    if version < 2 {
        info!("DB: running migration v2 (password resets, payments)");
        conn.execute_batch(&format!(
            "
            CREATE TABLE password_resets (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash  TEXT NOT NULL UNIQUE,
                expires_at  TEXT NOT NULL,
                used_at     TEXT,
                created_at  TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE TABLE payments (
                id              TEXT PRIMARY KEY,
                event_id        TEXT NOT NULL REFERENCES events(id),
                user_id         TEXT NOT NULL REFERENCES users(id),
                amount_cents    INTEGER NOT NULL,
                reference       TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT {NOW}
            );

            INSERT INTO schema_version (version) VALUES (2);
            "
        ))?;
    }

    info!("Database migrations complete");
    Ok(())
}

pub(crate) fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
        r.get(0)
    })?;
    Ok(version)
}
