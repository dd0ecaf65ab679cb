use std::sync::Arc;

use hyper::http::header;
use hyper::{Body, StatusCode};
use routerify::prelude::RequestExt as _;
use routerify::Middleware;
use serde_json::json;

use crate::api::auth::UserIdentity;
use crate::api::error::RouteError;
use crate::api::ext::RequestExt as _;
use crate::api::jwt::JwtState;
use crate::api::macros::make_response;
use crate::global::GlobalState;

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
    #[error("token must be ascii only")]
    HeaderToStr,
    #[error("token must be a bearer token")]
    NotBearerToken,
    #[error("invalid authentication token")]
    InvalidToken,
    /// The route needs an identity and none was presented.
    #[error("you must be logged in")]
    NotLoggedIn,
}

impl From<AuthError> for RouteError {
    #[track_caller]
    fn from(err: AuthError) -> Self {
        RouteError::from(make_response!(
            StatusCode::UNAUTHORIZED,
            json!({ "message": err.to_string(), "success": false })
        ))
    }
}

/// Verifies a presented bearer token and stores the identity in the request
/// context. A missing Authorization header passes through, handlers that
/// need an identity reject with `AuthError::NotLoggedIn` themselves.
pub fn auth_middleware(_: &Arc<GlobalState>) -> Middleware<Body, RouteError> {
    Middleware::pre(|req| async move {
        let Some(token) = req.headers().get(header::AUTHORIZATION) else {
            // No Authorization header
            return Ok(req);
        };

        let global = req.get_global()?;

        // Tokens will start with "Bearer " so we need to remove that
        let token = token
            .to_str()
            .map_err(|_| AuthError::HeaderToStr)?
            .strip_prefix("Bearer ")
            .ok_or(AuthError::NotBearerToken)?;

        let jwt = JwtState::verify(&global, token).ok_or(AuthError::InvalidToken)?;

        req.set_context(UserIdentity::from(&jwt));

        Ok(req)
    })
}
