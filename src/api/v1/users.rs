use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::prelude::RequestExt as _;
use routerify::Router;
use serde::Deserialize;
use serde_json::json;
use ulid::Ulid;

use super::parse_json_body;
use crate::api::auth::UserIdentity;
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::ext::RequestExt as _;
use crate::api::macros::make_response;
use crate::api::middleware::auth::AuthError;
use crate::database::User;
use crate::global::GlobalState;
use crate::store::UserStore;

async fn check_username(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;

    let username = req
        .uri()
        .query()
        .and_then(|v| {
            url::form_urlencoded::parse(v.as_bytes()).find_map(|(k, v)| {
                if k == "username" {
                    Some(v.to_string())
                } else {
                    None
                }
            })
        })
        .ok_or((StatusCode::BAD_REQUEST, "missing username query parameter"))?;

    if let Err(err) = User::validate_username(&username) {
        return Err((StatusCode::BAD_REQUEST, err).into());
    }

    let taken = global
        .store
        .find_by_username(&username)
        .await
        .map_err_route("failed to query user")?
        .is_some();

    // A taken name is a successful probe, not an error.
    let message = if taken {
        "username already taken"
    } else {
        "username is available"
    };

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "message": message,
            "available": !taken
        })
    ))
}

async fn get_accept_messages(req: Request<Body>) -> Result<Response<Body>> {
    let identity = req.context::<UserIdentity>().ok_or(AuthError::NotLoggedIn)?;
    let global = req.get_global()?;

    // The token carries a snapshot of this flag, the store has the truth.
    let user = global
        .store
        .find_by_id(identity.id)
        .await
        .map_err_route("failed to query user")?
        .ok_or((StatusCode::NOT_FOUND, "user not found"))?;

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "accepting_messages": user.accepting_messages
        })
    ))
}

#[derive(Deserialize)]
struct SetAcceptMessagesRequest {
    accepting_messages: bool,
}

async fn set_accept_messages(mut req: Request<Body>) -> Result<Response<Body>> {
    let identity = req.context::<UserIdentity>().ok_or(AuthError::NotLoggedIn)?;

    let body: SetAcceptMessagesRequest = parse_json_body(&mut req).await?;
    let global = req.get_global()?;

    let updated = global
        .store
        .set_accepting_messages(identity.id, body.accepting_messages)
        .await
        .map_err_route("failed to update user")?;

    if !updated {
        return Err((StatusCode::NOT_FOUND, "user not found").into());
    }

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "acceptance updated",
            "accepting_messages": body.accepting_messages
        })
    ))
}

async fn list_messages(req: Request<Body>) -> Result<Response<Body>> {
    let identity = req.context::<UserIdentity>().ok_or(AuthError::NotLoggedIn)?;
    let global = req.get_global()?;

    let messages = global
        .store
        .messages_for_user(identity.id)
        .await
        .map_err_route("failed to query messages")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "messages": messages
        })
    ))
}

async fn delete_message(req: Request<Body>) -> Result<Response<Body>> {
    let identity = req.context::<UserIdentity>().ok_or(AuthError::NotLoggedIn)?;
    let global = req.get_global()?;

    let message_id = Ulid::from_string(req.param("id").unwrap())
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid message id"))?;

    let deleted = global
        .store
        .delete_message(identity.id, message_id)
        .await
        .map_err_route("failed to delete message")?;

    if !deleted {
        return Err((StatusCode::NOT_FOUND, "message not found").into());
    }

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "message deleted"
        })
    ))
}

pub fn routes(_: &Arc<GlobalState>) -> Router<Body, RouteError> {
    Router::builder()
        .get("/check-username", check_username)
        .get("/me/accept-messages", get_accept_messages)
        .put("/me/accept-messages", set_accept_messages)
        .get("/me/messages", list_messages)
        .delete("/me/messages/:id", delete_message)
        .build()
        .expect("failed to build router")
}
