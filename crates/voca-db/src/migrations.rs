use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            birthdate   TEXT,
            created_at  INTEGER NOT NULL
        );

        -- created_at is unix microseconds, strictly increasing per insert
        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            group_id    TEXT NOT NULL,
            text        TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_created
            ON messages(created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_user_group
            ON messages(user_id, group_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
