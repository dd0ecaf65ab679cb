use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use sha2::Sha256;
use ulid::Ulid;

use crate::database::User;
use crate::global::GlobalState;

/// The session token contents. Minted at login, carried as an HS256 JWT.
pub struct JwtState {
    pub user_id: Ulid,
    pub session_id: Ulid,
    pub username: String,
    pub accepting_messages: bool,
    pub expiration: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub not_before: Option<DateTime<Utc>>,
}

impl JwtState {
    pub fn new(user: &User, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id,
            session_id: Ulid::new(),
            username: user.username.clone(),
            accepting_messages: user.accepting_messages,
            expiration: Some(expires_at),
            issued_at: Utc::now(),
            not_before: None,
        }
    }

    pub fn serialize(&self, global: &Arc<GlobalState>) -> Option<String> {
        let key = Hmac::<Sha256>::new_from_slice(global.config.jwt.secret.as_bytes()).ok()?;

        let mut claims = Claims::new(RegisteredClaims {
            issued_at: Some(self.issued_at.timestamp() as u64),
            expiration: self.expiration.map(|x| x.timestamp() as u64),
            issuer: Some(global.config.jwt.issuer.to_string()),
            json_web_token_id: Some(self.session_id.to_string()),
            subject: Some(self.user_id.to_string()),
            not_before: self.not_before.map(|x| x.timestamp() as u64),
            audience: None,
        });

        claims.private.insert(
            "username".to_string(),
            serde_json::Value::String(self.username.clone()),
        );
        claims.private.insert(
            "accepting_messages".to_string(),
            serde_json::Value::Bool(self.accepting_messages),
        );

        claims.sign_with_key(&key).ok()
    }

    pub fn verify(global: &Arc<GlobalState>, token: &str) -> Option<Self> {
        let key = Hmac::<Sha256>::new_from_slice(global.config.jwt.secret.as_bytes()).ok()?;
        let token: Token<Header, Claims, _> = token.verify_with_key(&key).ok()?;

        let claims = token.claims();

        if claims.registered.issuer.clone()? != global.config.jwt.issuer {
            return None;
        }

        let iat = Utc
            .timestamp_opt(claims.registered.issued_at? as i64, 0)
            .single()?;
        if iat > Utc::now() {
            return None;
        }

        let nbf = claims
            .registered
            .not_before
            .and_then(|x| Utc.timestamp_opt(x as i64, 0).single());
        if let Some(nbf) = nbf {
            if nbf > Utc::now() {
                return None;
            }
        }

        let exp = claims
            .registered
            .expiration
            .and_then(|x| Utc.timestamp_opt(x as i64, 0).single());
        if let Some(exp) = exp {
            if exp < Utc::now() {
                return None;
            }
        }

        let user_id = Ulid::from_string(claims.registered.subject.as_deref()?).ok()?;
        let session_id = Ulid::from_string(claims.registered.json_web_token_id.as_deref()?).ok()?;

        let username = claims.private.get("username")?.as_str()?.to_string();
        let accepting_messages = claims.private.get("accepting_messages")?.as_bool()?;

        Some(JwtState {
            user_id,
            session_id,
            username,
            accepting_messages,
            expiration: exp,
            issued_at: iat,
            not_before: nbf,
        })
    }
}
