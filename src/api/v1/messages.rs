use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde::Deserialize;
use serde_json::json;

use super::parse_json_body;
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::ext::RequestExt as _;
use crate::api::macros::make_response;
use crate::database::Message;
use crate::global::GlobalState;
use crate::store::{StoreError, UserStore};

#[derive(Deserialize)]
struct SendMessageRequest {
    username: String,
    content: String,
}

/// Anonymous ingest. No authentication on purpose, sender anonymity is the
/// product.
async fn send_message(mut req: Request<Body>) -> Result<Response<Body>> {
    let body: SendMessageRequest = parse_json_body(&mut req).await?;
    let global = req.get_global()?;

    if let Err(err) = Message::validate_content(&body.content) {
        return Err((StatusCode::BAD_REQUEST, err).into());
    }

    let user = global
        .store
        .find_by_username(&body.username)
        .await
        .map_err_route("failed to query user")?
        .ok_or((StatusCode::NOT_FOUND, "user not found"))?;

    if !user.accepting_messages {
        return Err((StatusCode::FORBIDDEN, "user is not accepting messages").into());
    }

    let message = Message::new(body.content);

    match global.store.add_message(user.id, &message).await {
        Ok(()) => {}
        Err(StoreError::UserNotFound) => {
            return Err((StatusCode::NOT_FOUND, "user not found").into());
        }
        Err(err) => {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "failed to save message", err).into());
        }
    }

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "message sent"
        })
    ))
}

pub fn routes(_: &Arc<GlobalState>) -> Router<Body, RouteError> {
    Router::builder()
        .post("/", send_message)
        .build()
        .expect("failed to build router")
}
