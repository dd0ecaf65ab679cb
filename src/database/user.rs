use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use rand::Rng;
use ulid::Ulid;

#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("invalid verification code")]
    InvalidCode,
    #[error("verification code expired")]
    CodeExpired,
}

#[derive(Debug, Clone)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Ulid,
    /// The username of the user.
    pub username: String,
    /// The email of the user.
    pub email: String,
    /// The hashed password of the user. (argon2)
    pub password_hash: String,
    /// The verification code mailed to the user, present until verified.
    pub verification_code: Option<String>,
    /// When the verification code stops being accepted.
    pub code_expires_at: Option<DateTime<Utc>>,
    /// Whether the user has verified their email.
    pub email_verified: bool,
    /// Whether the user currently accepts anonymous messages.
    pub accepting_messages: bool,
    /// The time the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        password: &str,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            username,
            email,
            password_hash: Self::hash_password(password),
            verification_code: Some(verification_code),
            code_expires_at: Some(code_expires_at),
            email_verified: false,
            accepting_messages: true,
            created_at: Utc::now(),
        }
    }

    /// Uses argon2 to verify the password hash against the provided password.
    pub fn verify_password(&self, password: &str) -> bool {
        let hash = match PasswordHash::new(&self.password_hash) {
            Ok(hash) => hash,
            Err(err) => {
                tracing::error!("failed to parse password hash: {}", err);
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    }

    /// Generates a new password hash using argon2.
    pub fn hash_password(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .expect("failed to hash password");

        hash.to_string()
    }

    /// Generates a 6 digit verification code.
    pub fn generate_verification_code() -> String {
        rand::thread_rng().gen_range(100_000..1_000_000).to_string()
    }

    /// Checks a submitted verification code against the account state.
    ///
    /// Verified accounts accept any code, verification is terminal and the
    /// submission is a no-op. Pending accounts match the stored code first
    /// and only then consider expiry, so a wrong code never reveals whether
    /// the right one would still have worked.
    pub fn check_verification_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        if self.email_verified {
            return Ok(());
        }

        let (expected, expires_at) = match (&self.verification_code, self.code_expires_at) {
            (Some(expected), Some(expires_at)) => (expected, expires_at),
            _ => return Err(VerificationError::InvalidCode),
        };

        if expected != code {
            return Err(VerificationError::InvalidCode);
        }

        if now > expires_at {
            return Err(VerificationError::CodeExpired);
        }

        Ok(())
    }

    /// Validates a username.
    pub fn validate_username(username: &str) -> Result<(), &'static str> {
        if username.len() < 2 {
            return Err("Username must be at least 2 characters long");
        }

        if username.len() > 25 {
            return Err("Username must be at most 25 characters long");
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err("Username must only contain alphanumeric characters and underscores");
        }

        Ok(())
    }

    /// Validates a password.
    pub fn validate_password(password: &str) -> Result<(), &'static str> {
        if password.len() < 8 {
            return Err("Password must be at least 8 characters long");
        }

        if password.len() > 100 {
            return Err("Password must be at most 100 characters long");
        }

        Ok(())
    }

    /// Validates an email.
    pub fn validate_email(email: &str) -> Result<(), &'static str> {
        if !email_address::EmailAddress::is_valid(email) {
            return Err("Email is not a valid email address");
        }

        Ok(())
    }
}
