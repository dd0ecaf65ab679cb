use chrono::{Duration, Utc};
use ulid::Ulid;

use crate::database::{Message, User};
use crate::store::{DuplicateField, MemoryUserStore, StoreError, UserStore};

fn mock_user(username: &str, email: &str) -> User {
    User::new(
        username.to_string(),
        email.to_string(),
        "password123",
        "123456".to_string(),
        Utc::now() + Duration::seconds(60),
    )
}

#[tokio::test]
async fn test_insert_and_find() {
    let store = MemoryUserStore::default();
    let user = mock_user("test", "test@example.com");

    store.insert_user(&user).await.expect("insert failed");

    let by_id = store
        .find_by_id(user.id)
        .await
        .expect("query failed")
        .expect("user missing");
    assert_eq!(by_id.username, "test");

    let by_username = store
        .find_by_username("test")
        .await
        .expect("query failed")
        .expect("user missing");
    assert_eq!(by_username.id, user.id);

    let by_email = store
        .find_by_email("test@example.com")
        .await
        .expect("query failed")
        .expect("user missing");
    assert_eq!(by_email.id, user.id);

    assert!(store
        .find_by_id(Ulid::new())
        .await
        .expect("query failed")
        .is_none());
    assert!(store
        .find_by_username("other")
        .await
        .expect("query failed")
        .is_none());
    assert!(store
        .find_by_email("other@example.com")
        .await
        .expect("query failed")
        .is_none());
}

#[tokio::test]
async fn test_insert_duplicate() {
    let store = MemoryUserStore::default();

    store
        .insert_user(&mock_user("test", "test@example.com"))
        .await
        .expect("insert failed");

    let err = store
        .insert_user(&mock_user("test", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Duplicate(DuplicateField::Username)
    ));

    let err = store
        .insert_user(&mock_user("other", "test@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(DuplicateField::Email)));
}

#[tokio::test]
async fn test_mark_verified() {
    let store = MemoryUserStore::default();
    let user = mock_user("test", "test@example.com");

    store.insert_user(&user).await.expect("insert failed");

    let updated = store.mark_verified(user.id).await.expect("update failed");
    assert!(updated);

    // The pending code is cleared together with the flag
    let user = store
        .find_by_id(user.id)
        .await
        .expect("query failed")
        .expect("user missing");
    assert!(user.email_verified);
    assert_eq!(user.verification_code, None);
    assert_eq!(user.code_expires_at, None);

    let updated = store
        .mark_verified(Ulid::new())
        .await
        .expect("update failed");
    assert!(!updated);
}

#[tokio::test]
async fn test_set_accepting_messages() {
    let store = MemoryUserStore::default();
    let user = mock_user("test", "test@example.com");

    store.insert_user(&user).await.expect("insert failed");

    let updated = store
        .set_accepting_messages(user.id, false)
        .await
        .expect("update failed");
    assert!(updated);

    let stored = store
        .find_by_id(user.id)
        .await
        .expect("query failed")
        .expect("user missing");
    assert!(!stored.accepting_messages);

    let updated = store
        .set_accepting_messages(Ulid::new(), false)
        .await
        .expect("update failed");
    assert!(!updated);
}

#[tokio::test]
async fn test_message_ordering() {
    let store = MemoryUserStore::default();
    let user = mock_user("test", "test@example.com");

    store.insert_user(&user).await.expect("insert failed");

    let base = Utc::now();
    for (content, offset) in [("first", 0), ("second", 1), ("third", 2)] {
        let mut message = Message::new(content.to_string());
        message.created_at = base + Duration::seconds(offset);
        store
            .add_message(user.id, &message)
            .await
            .expect("add failed");
    }

    let messages = store
        .messages_for_user(user.id)
        .await
        .expect("query failed");

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, "third");
    assert_eq!(messages[1].content, "second");
    assert_eq!(messages[2].content, "first");

    // A user with no messages and an unknown user both read as empty
    let other = mock_user("other", "other@example.com");
    store.insert_user(&other).await.expect("insert failed");

    assert!(store
        .messages_for_user(other.id)
        .await
        .expect("query failed")
        .is_empty());
    assert!(store
        .messages_for_user(Ulid::new())
        .await
        .expect("query failed")
        .is_empty());
}

#[tokio::test]
async fn test_add_message_unknown_user() {
    let store = MemoryUserStore::default();

    let err = store
        .add_message(Ulid::new(), &Message::new("into the void".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UserNotFound));
}

#[tokio::test]
async fn test_delete_message() {
    let store = MemoryUserStore::default();
    let user = mock_user("test", "test@example.com");
    let other = mock_user("other", "other@example.com");

    store.insert_user(&user).await.expect("insert failed");
    store.insert_user(&other).await.expect("insert failed");

    let message = Message::new("kept or deleted".to_string());
    store
        .add_message(user.id, &message)
        .await
        .expect("add failed");

    // Scoped to the owner, someone else's inbox does not contain it
    let deleted = store
        .delete_message(other.id, message.id)
        .await
        .expect("delete failed");
    assert!(!deleted);

    let deleted = store
        .delete_message(user.id, message.id)
        .await
        .expect("delete failed");
    assert!(deleted);

    // Gone means gone
    let deleted = store
        .delete_message(user.id, message.id)
        .await
        .expect("delete failed");
    assert!(!deleted);

    assert!(store
        .messages_for_user(user.id)
        .await
        .expect("query failed")
        .is_empty());
}
