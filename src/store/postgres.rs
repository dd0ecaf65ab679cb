use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use ulid::Ulid;
use uuid::Uuid;

use super::{DuplicateField, StoreError, UserStore};
use crate::database::{Message, User};

/// Postgres-backed store, schema in `migrations/0001_init.sql`.
pub struct PgUserStore {
    db: Arc<sqlx::PgPool>,
}

impl PgUserStore {
    pub fn new(db: Arc<sqlx::PgPool>) -> Self {
        Self { db }
    }

    pub async fn connect(uri: &str) -> anyhow::Result<Self> {
        let db = sqlx::PgPool::connect_with(
            PgConnectOptions::from_str(uri)?
                .disable_statement_logging()
                .to_owned(),
        )
        .await?;

        Ok(Self::new(Arc::new(db)))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    verification_code: Option<String>,
    code_expires_at: Option<DateTime<Utc>>,
    email_verified: bool,
    accepting_messages: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: Ulid::from(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            verification_code: row.verification_code,
            code_expires_at: row.code_expires_at,
            email_verified: row.email_verified,
            accepting_messages: row.accepting_messages,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: Ulid::from(row.id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Maps a unique violation (SQLSTATE 23505) to the column it hit, by the
/// constraint names in the migration.
fn unique_violation(err: &sqlx::Error) -> Option<DuplicateField> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            match db.constraint() {
                Some("users_username_key") => Some(DuplicateField::Username),
                Some("users_email_key") => Some(DuplicateField::Email),
                _ => None,
            }
        }
        _ => None,
    }
}

fn foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Ulid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                id,
                username,
                email,
                password_hash,
                verification_code,
                code_expires_at,
                email_verified,
                accepting_messages,
                created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9
            )
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.verification_code)
        .bind(user.code_expires_at)
        .bind(user.email_verified)
        .bind(user.accepting_messages)
        .bind(user.created_at)
        .execute(self.db.as_ref())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match unique_violation(&err) {
                Some(field) => Err(StoreError::Duplicate(field)),
                None => Err(StoreError::Database(err)),
            },
        }
    }

    async fn mark_verified(&self, id: Ulid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET email_verified = true, verification_code = NULL, code_expires_at = NULL WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .execute(self.db.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_accepting_messages(&self, id: Ulid, accepting: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET accepting_messages = $1 WHERE id = $2")
            .bind(accepting)
            .bind(Uuid::from(id))
            .execute(self.db.as_ref())
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn add_message(&self, user_id: Ulid, message: &Message) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO messages (id, user_id, content, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(user_id))
        .bind(&message.content)
        .bind(message.created_at)
        .execute(self.db.as_ref())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if foreign_key_violation(&err) => Err(StoreError::UserNotFound),
            Err(err) => Err(StoreError::Database(err)),
        }
    }

    async fn messages_for_user(&self, user_id: Ulid) -> Result<Vec<Message>, StoreError> {
        // Same-timestamp rows tie-break on id so the order is stable.
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, content, created_at FROM messages WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(Uuid::from(user_id))
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn delete_message(&self, user_id: Ulid, message_id: Ulid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(message_id))
            .bind(Uuid::from(user_id))
            .execute(self.db.as_ref())
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
