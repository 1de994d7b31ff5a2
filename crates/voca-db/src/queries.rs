use crate::models::{MessageRow, NewUser, UserRow, UserUpdate};
use crate::{Database, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, name, email, username, password, birthdate, created_at";
const MESSAGE_COLUMNS: &str = "id, user_id, group_id, text, created_at";

impl Database {
    // -- Users --

    /// Insert a new user and return its id. A taken username or email
    /// surfaces as `DbError::Conflict` from the UNIQUE constraint.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<i64> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (name, email, username, password, birthdate, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.name,
                    user.email,
                    user.username,
                    user.password_hash,
                    user.birthdate,
                    Utc::now().timestamp_micros(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Look a user up by username or email.
    pub fn get_user_by_login(&self, username_or_email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1 LIMIT 1"
            );
            Ok(conn
                .query_row(&sql, [username_or_email], user_from_row)
                .optional()?)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Apply a profile edit. Returns `None` if no user has this id.
    pub fn update_user(&self, id: i64, update: &UserUpdate<'_>) -> Result<Option<UserRow>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE users
                 SET name = ?1, username = ?2, email = ?3, password = COALESCE(?4, password)
                 WHERE id = ?5",
                rusqlite::params![
                    update.name,
                    update.username,
                    update.email,
                    update.password_hash,
                    id,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(tx, id)
        })
    }

    // -- Messages --

    /// Append a message. The timestamp is assigned here and is strictly
    /// greater than every stored one, so insertion order is recoverable.
    pub fn insert_message(&self, user_id: i64, group_id: &str, text: &str) -> Result<MessageRow> {
        self.with_tx(|tx| {
            let last: Option<i64> =
                tx.query_row("SELECT MAX(created_at) FROM messages", [], |row| row.get(0))?;
            let now = Utc::now().timestamp_micros();
            let created_at = match last {
                Some(last) if last >= now => last + 1,
                _ => now,
            };

            tx.execute(
                "INSERT INTO messages (user_id, group_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, group_id, text, created_at],
            )?;

            Ok(MessageRow {
                id: tx.last_insert_rowid(),
                user_id,
                group_id: group_id.to_string(),
                text: text.to_string(),
                created_at,
            })
        })
    }

    /// Most recent message by `user_id` in `group_id`.
    pub fn latest_message(&self, user_id: i64, group_id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE user_id = ?1 AND group_id = ?2
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1"
            );
            Ok(conn
                .query_row(&sql, rusqlite::params![user_id, group_id], message_from_row)
                .optional()?)
        })
    }

    /// Every message, oldest first.
    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at ASC, id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        username: row.get(3)?,
        password: row.get(4)?,
        birthdate: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        group_id: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}
