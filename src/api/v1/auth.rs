use std::sync::Arc;

use chrono::{Duration, Utc};
use hyper::{Body, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use routerify::Router;
use serde::Deserialize;
use serde_json::json;

use super::parse_json_body;
use crate::api::auth::UserIdentity;
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::ext::RequestExt as _;
use crate::api::jwt::JwtState;
use crate::api::macros::make_response;
use crate::database::User;
use crate::global::GlobalState;
use crate::store::{DuplicateField, StoreError, UserStore};

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

async fn register(mut req: Request<Body>) -> Result<Response<Body>> {
    let body: RegisterRequest = parse_json_body(&mut req).await?;
    let global = req.get_global()?;

    if let Err(err) = User::validate_username(&body.username) {
        return Err((StatusCode::BAD_REQUEST, err).into());
    }

    if let Err(err) = User::validate_email(&body.email) {
        return Err((StatusCode::BAD_REQUEST, err).into());
    }

    if let Err(err) = User::validate_password(&body.password) {
        return Err((StatusCode::BAD_REQUEST, err).into());
    }

    if global
        .store
        .find_by_username(&body.username)
        .await
        .map_err_route("failed to query user")?
        .is_some()
    {
        return Err((StatusCode::BAD_REQUEST, "username already taken").into());
    }

    if global
        .store
        .find_by_email(&body.email)
        .await
        .map_err_route("failed to query user")?
        .is_some()
    {
        return Err((StatusCode::BAD_REQUEST, "email already in use").into());
    }

    let code = User::generate_verification_code();
    let expires_at =
        Utc::now() + Duration::seconds(global.config.auth.verification_code_ttl_secs as i64);

    let user = User::new(
        body.username,
        body.email,
        &body.password,
        code.clone(),
        expires_at,
    );

    // The taken checks above can lose a race, the store reports which column
    // collided.
    match global.store.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(DuplicateField::Username)) => {
            return Err((StatusCode::BAD_REQUEST, "username already taken").into());
        }
        Err(StoreError::Duplicate(DuplicateField::Email)) => {
            return Err((StatusCode::BAD_REQUEST, "email already in use").into());
        }
        Err(err) => {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "failed to create user", err).into());
        }
    }

    // Mail failure does not roll the account back, the code flow can be
    // retried once mail works again.
    global
        .mailer
        .send_verification(
            &user.email,
            &user.username,
            &code,
            global.config.auth.verification_code_ttl_secs,
        )
        .await
        .map_err_route((
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to send verification email",
        ))?;

    Ok(make_response!(
        StatusCode::CREATED,
        json!({
            "success": true,
            "message": "user registered, check your email for a verification code"
        })
    ))
}

#[derive(Deserialize)]
struct VerifyRequest {
    username: String,
    code: String,
}

async fn verify(mut req: Request<Body>) -> Result<Response<Body>> {
    let body: VerifyRequest = parse_json_body(&mut req).await?;
    let global = req.get_global()?;

    // Clients send the username the way it appeared in the link, URI encoded.
    let username = percent_decode_str(&body.username)
        .decode_utf8()
        .map_err_route((StatusCode::BAD_REQUEST, "username is not valid utf-8"))?;

    let user = global
        .store
        .find_by_username(&username)
        .await
        .map_err_route("failed to query user")?
        .ok_or((StatusCode::NOT_FOUND, "user not found"))?;

    if let Err(err) = user.check_verification_code(&body.code, Utc::now()) {
        let message = err.to_string();
        return Err((StatusCode::BAD_REQUEST, message.as_str()).into());
    }

    if !user.email_verified {
        let updated = global
            .store
            .mark_verified(user.id)
            .await
            .map_err_route("failed to update user")?;

        if !updated {
            return Err((StatusCode::NOT_FOUND, "user not found").into());
        }
    }

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "account verified"
        })
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    identifier: String,
    password: String,
}

async fn login(mut req: Request<Body>) -> Result<Response<Body>> {
    let body: LoginRequest = parse_json_body(&mut req).await?;
    let global = req.get_global()?;

    // An '@' in the identifier means the user typed their email.
    let user = if body.identifier.contains('@') {
        global.store.find_by_email(&body.identifier).await
    } else {
        global.store.find_by_username(&body.identifier).await
    }
    .map_err_route("failed to query user")?
    .ok_or((StatusCode::UNAUTHORIZED, "user not found"))?;

    if global.config.auth.require_verified_login && !user.email_verified {
        return Err((StatusCode::UNAUTHORIZED, "verify your account before logging in").into());
    }

    if !user.verify_password(&body.password) {
        return Err((StatusCode::UNAUTHORIZED, "incorrect password").into());
    }

    let expires_at =
        Utc::now() + Duration::seconds(global.config.auth.session_duration_secs as i64);

    let token = JwtState::new(&user, expires_at)
        .serialize(&global)
        .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "failed to sign session token"))?;

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "logged in",
            "token": token,
            "identity": UserIdentity::from(&user)
        })
    ))
}

pub fn routes(_: &Arc<GlobalState>) -> Router<Body, RouteError> {
    Router::builder()
        .post("/register", register)
        .post("/verify", verify)
        .post("/login", login)
        .build()
        .expect("failed to build router")
}
