use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            email       TEXT PRIMARY KEY,
            username    TEXT NOT NULL,
            password    TEXT NOT NULL,
            avatar      TEXT NOT NULL DEFAULT '',
            bio         TEXT NOT NULL DEFAULT '',
            status      TEXT NOT NULL DEFAULT '',
            is_admin    INTEGER NOT NULL DEFAULT 0,
            is_vip      INTEGER NOT NULL DEFAULT 0,
            is_muted    INTEGER NOT NULL DEFAULT 0,
            is_banned   INTEGER NOT NULL DEFAULT 0,
            last_seen   TEXT NOT NULL,
            join_date   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            sender_email    TEXT NOT NULL,
            sender_username TEXT NOT NULL,
            avatar          TEXT NOT NULL DEFAULT '',
            text            TEXT NOT NULL,
            image_url       TEXT,
            room            TEXT NOT NULL,
            recipient_email TEXT,
            is_announcement INTEGER NOT NULL DEFAULT 0,
            is_admin        INTEGER NOT NULL DEFAULT 0,
            is_vip          INTEGER NOT NULL DEFAULT 0,
            client_key      TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_room
            ON messages(room, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_email);

        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_email)
            WHERE recipient_email IS NOT NULL;

        -- Post idempotency: a re-sent client key must not create a duplicate
        CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_client_key
            ON messages(sender_email, client_key)
            WHERE client_key IS NOT NULL;

        CREATE TABLE IF NOT EXISTS support_requests (
            id              TEXT PRIMARY KEY,
            email           TEXT NOT NULL,
            username        TEXT NOT NULL,
            requested_tier  TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'Pending',
            created_at      TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
