use serde::Serialize;
use ulid::Ulid;

use super::jwt::JwtState;
use crate::database::User;

/// Session-scoped snapshot of an account, embedded in the token at login and
/// rebuilt from it by the auth middleware. Flag changes after minting do not
/// rewrite outstanding tokens, handlers that care read the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub id: Ulid,
    pub username: String,
    pub accepting_messages: bool,
}

impl From<&User> for UserIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            accepting_messages: user.accepting_messages,
        }
    }
}

impl From<&JwtState> for UserIdentity {
    fn from(jwt: &JwtState) -> Self {
        Self {
            id: jwt.user_id,
            username: jwt.username.clone(),
            accepting_messages: jwt.accepting_messages,
        }
    }
}
