use chrono::{Duration, Utc};

use crate::database::{User, VerificationError};

fn mock_user() -> User {
    User::new(
        "test".to_string(),
        "test@example.com".to_string(),
        "password123",
        "123456".to_string(),
        Utc::now() + Duration::seconds(60),
    )
}

#[test]
fn test_validate_username() {
    assert_eq!(User::validate_username("ab"), Ok(()));
    assert_eq!(User::validate_username("some_user_42"), Ok(()));
    assert_eq!(User::validate_username(&"a".repeat(25)), Ok(()));

    assert_eq!(
        User::validate_username("a"),
        Err("Username must be at least 2 characters long")
    );
    assert_eq!(
        User::validate_username(&"a".repeat(26)),
        Err("Username must be at most 25 characters long")
    );
    assert_eq!(
        User::validate_username("spaced out"),
        Err("Username must only contain alphanumeric characters and underscores")
    );
    assert_eq!(
        User::validate_username("dashed-name"),
        Err("Username must only contain alphanumeric characters and underscores")
    );
}

#[test]
fn test_validate_password() {
    assert_eq!(User::validate_password("12345678"), Ok(()));
    assert_eq!(User::validate_password(&"a".repeat(100)), Ok(()));

    assert_eq!(
        User::validate_password("1234567"),
        Err("Password must be at least 8 characters long")
    );
    assert_eq!(
        User::validate_password(&"a".repeat(101)),
        Err("Password must be at most 100 characters long")
    );
}

#[test]
fn test_validate_email() {
    assert_eq!(User::validate_email("test@example.com"), Ok(()));

    assert_eq!(
        User::validate_email("not-an-email"),
        Err("Email is not a valid email address")
    );
    assert_eq!(
        User::validate_email("@example.com"),
        Err("Email is not a valid email address")
    );
}

#[test]
fn test_password_hash() {
    let user = mock_user();

    assert_ne!(user.password_hash, "password123");
    assert!(user.verify_password("password123"));
    assert!(!user.verify_password("password124"));
}

#[test]
fn test_generate_verification_code() {
    for _ in 0..100 {
        let code = User::generate_verification_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        // Never starts with a zero, the range is 100000..1000000
        assert_ne!(code.as_bytes()[0], b'0');
    }
}

#[test]
fn test_check_verification_code() {
    let user = mock_user();

    assert_eq!(user.check_verification_code("123456", Utc::now()), Ok(()));
    assert_eq!(
        user.check_verification_code("654321", Utc::now()),
        Err(VerificationError::InvalidCode)
    );

    // After expiry the right code is expired, a wrong one is still invalid
    let later = Utc::now() + Duration::seconds(120);
    assert_eq!(
        user.check_verification_code("123456", later),
        Err(VerificationError::CodeExpired)
    );
    assert_eq!(
        user.check_verification_code("654321", later),
        Err(VerificationError::InvalidCode)
    );
}

#[test]
fn test_check_verification_code_verified() {
    let mut user = mock_user();
    user.email_verified = true;
    user.verification_code = None;
    user.code_expires_at = None;

    // Verification is terminal, any submission is accepted
    assert_eq!(user.check_verification_code("000000", Utc::now()), Ok(()));
}

#[test]
fn test_check_verification_code_missing() {
    let mut user = mock_user();
    user.verification_code = None;
    user.code_expires_at = None;

    assert_eq!(
        user.check_verification_code("123456", Utc::now()),
        Err(VerificationError::InvalidCode)
    );
}
