use async_trait::async_trait;
use ulid::Ulid;

use crate::database::{Message, User};

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already in use")]
    Duplicate(DuplicateField),
    #[error("user not found")]
    UserNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for accounts and their inboxes.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Ulid) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a new user. Username and email collisions surface as
    /// `StoreError::Duplicate` so a lost registration race maps to the same
    /// response as an upfront taken check.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Marks the user verified and clears the stored code and expiry in one
    /// mutation. Returns whether a user was updated.
    async fn mark_verified(&self, id: Ulid) -> Result<bool, StoreError>;

    /// Returns whether the user exists.
    async fn set_accepting_messages(&self, id: Ulid, accepting: bool) -> Result<bool, StoreError>;

    async fn add_message(&self, user_id: Ulid, message: &Message) -> Result<(), StoreError>;

    /// Messages for the user, newest first.
    async fn messages_for_user(&self, user_id: Ulid) -> Result<Vec<Message>, StoreError>;

    /// Returns whether a message was removed. Deleting a message that is not
    /// in this user's inbox is not an error, it just removes nothing.
    async fn delete_message(&self, user_id: Ulid, message_id: Ulid) -> Result<bool, StoreError>;
}
