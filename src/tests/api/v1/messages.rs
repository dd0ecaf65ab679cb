use core::time;

use chrono::{Duration, Utc};
use hyper::StatusCode;
use serde_json::{json, Value};

use crate::api;
use crate::config::{ApiConfig, AppConfig};
use crate::database::User;
use crate::store::UserStore;
use crate::tests::global::mock_global_state;
use crate::utils::FutureTimeout;

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
async fn test_send_message() {
    let port = portpicker::pick_unused_port().expect("failed to pick port");
    let (global, handler) = mock_global_state(AppConfig {
        api: ApiConfig {
            bind_address: format!("0.0.0.0:{}", port).parse().unwrap(),
            ..Default::default()
        },
        ..Default::default()
    })
    .await;

    let user = mock_user("ivan", "ivan@example.com");
    global
        .store
        .insert_user(&user)
        .await
        .expect("failed to insert user");

    let handle = tokio::spawn(api::run(global.clone()));

    // We need to wait for the server to start
    tokio::time::sleep(time::Duration::from_millis(300)).await;

    // No Authorization header anywhere, the sender stays anonymous
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "ivan",
            "content": "a".repeat(10)
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("failed to read body");
    assert_eq!(body, json!({ "success": true, "message": "message sent" }));

    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "ivan",
            "content": "a".repeat(500)
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "ivan",
            "content": "a".repeat(9)
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("failed to read body");
    assert_eq!(
        body,
        json!({ "message": "Message must be at least 10 characters long", "success": false })
    );

    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "ivan",
            "content": "a".repeat(501)
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("failed to read body");
    assert_eq!(
        body,
        json!({ "message": "Message must be at most 500 characters long", "success": false })
    );

    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "ghost",
            "content": "a message for nobody"
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("failed to read body");
    assert_eq!(
        body,
        json!({ "message": "user not found", "success": false })
    );

    // Only the two valid sends landed
    let messages = global
        .store
        .messages_for_user(user.id)
        .await
        .expect("failed to query messages");
    assert_eq!(messages.len(), 2);

    // The client uses Keep-Alive, so we need to drop it to release the global context
    drop(global);
    drop(client);

    handler
        .cancel()
        .timeout(time::Duration::from_secs(1))
        .await
        .expect("failed to cancel context");

    handle
        .timeout(time::Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_send_message_acceptance_gate() {
    let port = portpicker::pick_unused_port().expect("failed to pick port");
    let (global, handler) = mock_global_state(AppConfig {
        api: ApiConfig {
            bind_address: format!("0.0.0.0:{}", port).parse().unwrap(),
            ..Default::default()
        },
        ..Default::default()
    })
    .await;

    let user = mock_user("judy", "judy@example.com");
    global
        .store
        .insert_user(&user)
        .await
        .expect("failed to insert user");

    let updated = global
        .store
        .set_accepting_messages(user.id, false)
        .await
        .expect("failed to update user");
    assert!(updated);

    let handle = tokio::spawn(api::run(global.clone()));

    // We need to wait for the server to start
    tokio::time::sleep(time::Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "judy",
            "content": "a message judy never wanted"
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("failed to read body");
    assert_eq!(
        body,
        json!({ "message": "user is not accepting messages", "success": false })
    );

    let updated = global
        .store
        .set_accepting_messages(user.id, true)
        .await
        .expect("failed to update user");
    assert!(updated);

    let resp = client
        .post(format!("http://localhost:{}/v1/messages", port))
        .json(&json!({
            "username": "judy",
            "content": "a message judy asked for"
        }))
        .send()
        .await
        .expect("failed to send message");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("failed to read body");
    assert_eq!(body, json!({ "success": true, "message": "message sent" }));

    let messages = global
        .store
        .messages_for_user(user.id)
        .await
        .expect("failed to query messages");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "a message judy asked for");

    // The client uses Keep-Alive, so we need to drop it to release the global context
    drop(global);
    drop(client);

    handler
        .cancel()
        .timeout(time::Duration::from_secs(1))
        .await
        .expect("failed to cancel context");

    handle
        .timeout(time::Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
