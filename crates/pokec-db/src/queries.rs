use crate::Database;
use crate::models::{MessageRow, SupportRequestRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a new user. Runs inside a transaction so the first-user check
    /// and the insert are atomic: exactly one registration can ever observe
    /// an empty users table and receive the admin/VIP bootstrap flags.
    ///
    /// Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        avatar: &str,
        now: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let count: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            let first = count == 0;

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO users
                    (email, username, password, avatar, is_admin, is_vip, last_seen, join_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?6)",
                rusqlite::params![email, username, password_hash, avatar, first, now],
            )?;

            if inserted == 0 {
                // Email already present
                return Ok(None);
            }

            let row = query_user_by_email(&tx, email)?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY join_date"
            ))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no user with that email exists.
    pub fn set_banned(&self, email: &str, banned: bool) -> Result<bool> {
        self.update_flag(email, "is_banned", banned)
    }

    pub fn set_muted(&self, email: &str, muted: bool) -> Result<bool> {
        self.update_flag(email, "is_muted", muted)
    }

    pub fn set_vip(&self, email: &str, vip: bool) -> Result<bool> {
        self.update_flag(email, "is_vip", vip)
    }

    fn update_flag(&self, email: &str, column: &str, value: bool) -> Result<bool> {
        // `column` is one of the fixed flag names above, never caller input
        self.with_conn(|conn| {
            let changed = conn.execute(
                &format!("UPDATE users SET {column} = ?2 WHERE email = ?1"),
                rusqlite::params![email, value],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn update_profile(
        &self,
        email: &str,
        bio: Option<&str>,
        status: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    bio    = COALESCE(?2, bio),
                    status = COALESCE(?3, status),
                    avatar = COALESCE(?4, avatar)
                 WHERE email = ?1",
                rusqlite::params![email, bio, status, avatar],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn touch_last_seen(&self, email: &str, now: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_seen = ?2 WHERE email = ?1",
                rusqlite::params![email, now],
            )?;
            Ok(())
        })
    }

    pub fn delete_user(&self, email: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE email = ?1", [email])?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages
                    (id, sender_email, sender_username, avatar, text, image_url, room,
                     recipient_email, is_announcement, is_admin, is_vip, client_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    msg.id,
                    msg.sender_email,
                    msg.sender_username,
                    msg.avatar,
                    msg.text,
                    msg.image_url,
                    msg.room,
                    msg.recipient_email,
                    msg.is_announcement,
                    msg.is_admin,
                    msg.is_vip,
                    msg.client_key,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Look up a previously stored post by its idempotency token.
    pub fn find_message_by_client_key(
        &self,
        sender_email: &str,
        client_key: &str,
    ) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE sender_email = ?1 AND client_key = ?2"
            ))?;
            stmt.query_row([sender_email, client_key], message_from_row)
                .optional()
        })
    }

    /// Newest `limit` messages in a room, newest first. Callers reverse for
    /// oldest-first display.
    pub fn room_messages(&self, room: &str, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE room = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![room, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Newest `limit` DM messages the given identity is party to, newest
    /// first.
    pub fn dm_messages(&self, room: &str, email: &str, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE room = ?1 AND (sender_email = ?2 OR recipient_email = ?2)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![room, email, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Idempotent: deleting an id that no longer exists is a no-op.
    pub fn delete_message(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn delete_messages_from(&self, sender_email: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM messages WHERE sender_email = ?1",
                [sender_email],
            )?;
            Ok(deleted)
        })
    }

    /// Delete every message, or only one room's when `room` is given.
    pub fn clear_messages(&self, room: Option<&str>) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = match room {
                Some(room) => conn.execute("DELETE FROM messages WHERE room = ?1", [room])?,
                None => conn.execute("DELETE FROM messages", [])?,
            };
            Ok(deleted)
        })
    }

    // -- Support requests --

    pub fn insert_support_request(&self, req: &SupportRequestRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO support_requests
                    (id, email, username, requested_tier, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    req.id,
                    req.email,
                    req.username,
                    req.requested_tier,
                    req.status,
                    req.created_at,
                ],
            )?;
            Ok(())
        })
    }
}

const USER_COLUMNS: &str = "email, username, password, avatar, bio, status, \
                            is_admin, is_vip, is_muted, is_banned, last_seen, join_date";

const MESSAGE_COLUMNS: &str = "id, sender_email, sender_username, avatar, text, image_url, \
                               room, recipient_email, is_announcement, is_admin, is_vip, \
                               client_key, created_at";

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
    ))?;
    stmt.query_row([email], user_from_row).optional()
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        email: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        avatar: row.get(3)?,
        bio: row.get(4)?,
        status: row.get(5)?,
        is_admin: row.get(6)?,
        is_vip: row.get(7)?,
        is_muted: row.get(8)?,
        is_banned: row.get(9)?,
        last_seen: row.get(10)?,
        join_date: row.get(11)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_email: row.get(1)?,
        sender_username: row.get(2)?,
        avatar: row.get(3)?,
        text: row.get(4)?,
        image_url: row.get(5)?,
        room: row.get(6)?,
        recipient_email: row.get(7)?,
        is_announcement: row.get(8)?,
        is_admin: row.get(9)?,
        is_vip: row.get(10)?,
        client_key: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
