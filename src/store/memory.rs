use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use ulid::Ulid;

use super::{DuplicateField, StoreError, UserStore};
use crate::database::{Message, User};

/// In-memory store for tests and `database.mode = "memory"` runs. Same
/// semantics as the Postgres store, nothing survives a restart.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<HashMap<Ulid, StoredUser>>,
}

struct StoredUser {
    user: User,
    messages: Vec<Message>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Ulid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;

        Ok(inner.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;

        Ok(inner
            .values()
            .find(|stored| stored.user.username == username)
            .map(|stored| stored.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;

        Ok(inner
            .values()
            .find(|stored| stored.user.email == email)
            .map(|stored| stored.user.clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        if inner
            .values()
            .any(|stored| stored.user.username == user.username)
        {
            return Err(StoreError::Duplicate(DuplicateField::Username));
        }

        if inner.values().any(|stored| stored.user.email == user.email) {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }

        inner.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                messages: Vec::new(),
            },
        );

        Ok(())
    }

    async fn mark_verified(&self, id: Ulid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;

        let stored = match inner.get_mut(&id) {
            Some(stored) => stored,
            None => return Ok(false),
        };

        stored.user.email_verified = true;
        stored.user.verification_code = None;
        stored.user.code_expires_at = None;

        Ok(true)
    }

    async fn set_accepting_messages(&self, id: Ulid, accepting: bool) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;

        let stored = match inner.get_mut(&id) {
            Some(stored) => stored,
            None => return Ok(false),
        };

        stored.user.accepting_messages = accepting;

        Ok(true)
    }

    async fn add_message(&self, user_id: Ulid, message: &Message) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        let stored = inner.get_mut(&user_id).ok_or(StoreError::UserNotFound)?;

        stored.messages.push(message.clone());

        Ok(())
    }

    async fn messages_for_user(&self, user_id: Ulid) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.lock().await;

        let stored = match inner.get(&user_id) {
            Some(stored) => stored,
            None => return Ok(Vec::new()),
        };

        let mut messages = stored.messages.clone();
        messages.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(messages)
    }

    async fn delete_message(&self, user_id: Ulid, message_id: Ulid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;

        let stored = match inner.get_mut(&user_id) {
            Some(stored) => stored,
            None => return Ok(false),
        };

        let before = stored.messages.len();
        stored.messages.retain(|message| message.id != message_id);

        Ok(stored.messages.len() != before)
    }
}
