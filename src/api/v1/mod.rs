use std::sync::Arc;

use hyper::{Body, Request, StatusCode};
use routerify::Router;
use serde::de::DeserializeOwned;

use super::error::{Result, ResultExt, RouteError};
use crate::global::GlobalState;

pub mod auth;
pub mod health;
pub mod messages;
pub mod users;

/// Reads the whole request body and deserializes it. Any failure is a 400
/// charged to the caller.
pub async fn parse_json_body<T: DeserializeOwned>(req: &mut Request<Body>) -> Result<T> {
    let body = hyper::body::to_bytes(req.body_mut())
        .await
        .map_err_route((StatusCode::BAD_REQUEST, "failed to read request body"))?;

    serde_json::from_slice(&body)
        .map_err_route((StatusCode::BAD_REQUEST, "request body is not valid json"))
}

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError> {
    Router::builder()
        .scope("/health", health::routes(global))
        .scope("/auth", auth::routes(global))
        .scope("/users", users::routes(global))
        .scope("/messages", messages::routes(global))
        .build()
        .expect("failed to build router")
}
