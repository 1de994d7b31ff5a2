//! Database row types. These map directly to SQLite rows.
//! Distinct from voca-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use voca_types::models::{Message, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub birthdate: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub user_id: i64,
    pub group_id: String,
    pub text: String,
    pub created_at: i64,
}

/// Fields of a user about to be registered.
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub birthdate: Option<&'a str>,
}

/// Profile edit. `password_hash: None` keeps the stored hash.
pub struct UserUpdate<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
}

fn micros_to_utc(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            username: row.username,
            birthdate: row.birthdate,
            created_at: micros_to_utc(row.created_at),
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            user_id: row.user_id,
            group_id: row.group_id,
            text: row.text,
            created_at: micros_to_utc(row.created_at),
        }
    }
}
