use crate::models::{EventRow, PaymentRow, PrivateMessageRow, TagRow, UserRow};
use crate::{Database, format_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use evently_types::models::Role;
use rusqlite::{OptionalExtension, Row, ffi, params};

const USER_COLUMNS: &str = "id, name, email, password, role, image, created_at";
const EVENT_COLUMNS: &str =
    "id, organizer_id, title, description, location, starts_at, price_cents, created_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, content, created_at, updated_at";

impl Database {
    // -- Users --

    /// Returns false when the email is already registered.
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (id, name, email, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, email, password_hash, role.as_str()],
            ) {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Case-insensitive on email.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns false when no user has that id.
    pub fn set_user_image(&self, id: &str, image: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE users SET image = ?1 WHERE id = ?2", [image, id])?;
            Ok(n == 1)
        })
    }

    // -- Events --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_event(
        &self,
        id: &str,
        organizer_id: &str,
        title: &str,
        description: &str,
        location: Option<&str>,
        starts_at: DateTime<Utc>,
        price_cents: i64,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, organizer_id, title, description, location, starts_at, price_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    organizer_id,
                    title,
                    description,
                    location,
                    format_timestamp(starts_at),
                    price_cents
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_event(&self, id: &str) -> Result<Option<EventRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
                    [id],
                    event_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Upcoming events soonest first, then past events most recent first.
    pub fn list_events(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events
                 ORDER BY starts_at < ?1,
                          CASE WHEN starts_at >= ?1 THEN starts_at END ASC,
                          starts_at DESC,
                          rowid ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![format_timestamp(now), limit], event_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Tags --

    pub fn insert_tag(&self, id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO tags (id, name) VALUES (?1, ?2)", [id, name])?;
            Ok(())
        })
    }

    /// All tags in creation order. No pagination.
    pub fn list_tags(&self) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY created_at, rowid")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(TagRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Private messages --

    pub fn insert_private_message(
        &self,
        id: &str,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO private_messages (id, sender_id, recipient_id, content) VALUES (?1, ?2, ?3, ?4)",
                [id, sender_id, recipient_id, content],
            )?;
            Ok(())
        })
    }

    /// Messages the user sent or received, newest first.
    pub fn get_private_messages_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<PrivateMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM private_messages
                 WHERE sender_id = ?1 OR recipient_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], |row| {
                    Ok(PrivateMessageRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        recipient_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Scoped mutation: the sender check lives in the WHERE clause.
    /// Returns rows affected; 0 means unknown id or not the sender, indistinguishably.
    pub fn update_private_message(&self, id: &str, sender_id: &str, content: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE private_messages SET content = ?1, updated_at = ?2
                 WHERE id = ?3 AND sender_id = ?4",
                params![content, format_timestamp(Utc::now()), id, sender_id],
            )?;
            Ok(n)
        })
    }

    /// Scoped delete, same semantics as [`Database::update_private_message`].
    pub fn delete_private_message(&self, id: &str, sender_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM private_messages WHERE id = ?1 AND sender_id = ?2",
                [id, sender_id],
            )?;
            Ok(n)
        })
    }

    // -- Password resets --

    /// Store a new reset and drop any earlier unused ones for the same user.
    pub fn create_password_reset(
        &self,
        id: &str,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM password_resets WHERE user_id = ?1 AND used_at IS NULL",
                [user_id],
            )?;
            tx.execute(
                "INSERT INTO password_resets (id, user_id, token_hash, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, user_id, token_hash, format_timestamp(expires_at)],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Swap in `password_hash` for the user owning an unused, unexpired reset
    /// with `token_hash`, and mark the reset used. Returns false if no such reset.
    pub fn complete_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let now = format_timestamp(now);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let found: Option<(String, String)> = tx
                .query_row(
                    "SELECT id, user_id FROM password_resets
                     WHERE token_hash = ?1 AND used_at IS NULL AND expires_at > ?2",
                    [token_hash, now.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((reset_id, user_id)) = found else {
                return Ok(false);
            };

            tx.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                [password_hash, user_id.as_str()],
            )?;
            tx.execute(
                "UPDATE password_resets SET used_at = ?1 WHERE id = ?2",
                [now.as_str(), reset_id.as_str()],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    // -- Payments --

    pub fn insert_payment(
        &self,
        id: &str,
        event_id: &str,
        user_id: &str,
        amount_cents: i64,
        reference: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO payments (id, event_id, user_id, amount_cents, reference) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, event_id, user_id, amount_cents, reference],
            )?;
            Ok(())
        })
    }

    pub fn get_payments_for_user(&self, user_id: &str) -> Result<Vec<PaymentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_id, user_id, amount_cents, reference, created_at
                 FROM payments WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(PaymentRow {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        user_id: row.get(2)?,
                        amount_cents: row.get(3)?,
                        reference: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        image: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        organizer_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        starts_at: row.get(5)?,
        price_cents: row.get(6)?,
        created_at: row.get(7)?,
    })
}
