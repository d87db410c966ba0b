/// Authentication service tests
/// Tests session tokens, password hashing and cookie attributes
mod common;

use axum_extra::extract::cookie::SameSite;
use common::TEST_SECRET;
use playlister_core::UserId;
use playlister_server::services::auth::{AuthService, MIN_BCRYPT_COST, SESSION_COOKIE};

fn create_test_auth_service() -> AuthService {
    AuthService::new(TEST_SECRET.to_string(), 1, true, MIN_BCRYPT_COST)
}

/// Test password hashing produces salted bcrypt hashes
#[test]
fn test_password_hashing() {
    let auth_service = create_test_auth_service();

    let hash = auth_service.hash_password("pw12345678").unwrap();
    assert!(hash.starts_with("$2b$") || hash.starts_with("$2a$"));

    let hash2 = auth_service.hash_password("pw12345678").unwrap();
    assert_ne!(hash, hash2, "Hashes should differ due to random salt");

    assert!(auth_service.verify_password("pw12345678", &hash));
    assert!(!auth_service.verify_password("pw87654321", &hash));
}

/// A corrupt stored hash is a failed login, not an error
#[test]
fn test_malformed_hash_does_not_verify() {
    let auth_service = create_test_auth_service();
    assert!(!auth_service.verify_password("pw12345678", "not-a-bcrypt-hash"));
}

/// Test a session token resolves back to its user
#[test]
fn test_session_token_round_trip() {
    let auth_service = create_test_auth_service();
    let user_id = UserId::new("42");

    let token = auth_service.create_session_token(&user_id).unwrap();
    assert_eq!(auth_service.verify_session_token(&token).unwrap(), user_id);
}

/// Tokens signed with another secret are rejected
#[test]
fn test_token_from_other_secret_is_rejected() {
    let ours = create_test_auth_service();
    let theirs = AuthService::new("another-secret".to_string(), 1, true, MIN_BCRYPT_COST);

    let token = theirs.create_session_token(&UserId::new("42")).unwrap();
    assert!(ours.verify_session_token(&token).is_err());
    assert!(ours.verify_session_token("garbage").is_err());
}

/// Session cookie is HTTP-only and strict same-site
#[test]
fn test_session_cookie_attributes() {
    let auth_service = create_test_auth_service();
    let cookie = auth_service.session_cookie("abc".to_string());

    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "abc");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert_eq!(cookie.path(), Some("/"));

    let insecure = AuthService::new(TEST_SECRET.to_string(), 1, false, MIN_BCRYPT_COST);
    assert_eq!(insecure.session_cookie("abc".to_string()).secure(), Some(false));
}
