//! Integration tests for the verification-token lifecycle.
//!
//! All tests run against the in-memory token store, which implements the
//! same conditional-update semantics as the Postgres store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use server_core::domains::auth::{Authenticator, AuthError, JwtService};
use server_core::kernel::test_dependencies::InMemoryTokenStore;

const PHONE: &str = "+15551234567";

fn authenticator() -> (Authenticator, Arc<InMemoryTokenStore>) {
    let store = Arc::new(InMemoryTokenStore::new());
    let jwt_service = Arc::new(JwtService::new("test_secret_key", "test_issuer".to_string()));
    (Authenticator::new(store.clone(), jwt_service), store)
}

#[tokio::test]
async fn test_round_trip_token_redemption() {
    let (auth, _store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();
    let result = auth.verify_and_login(&plaintext).await.unwrap();

    let login = result.expect("fresh token should redeem");
    assert_eq!(login.user.phone_number, PHONE);
    assert!(!login.access_token.is_empty());
    assert!(!login.refresh_token.is_empty());
}

#[tokio::test]
async fn test_redemption_succeeds_at_most_once() {
    let (auth, _store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();

    let first = auth.verify_and_login(&plaintext).await.unwrap();
    assert!(first.is_some());

    let second = auth.verify_and_login(&plaintext).await.unwrap();
    assert!(second.is_none(), "second redemption must be rejected");
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let (auth, _store) = authenticator();

    let result = auth.verify_and_login("no-such-token").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_redemption_fails_at_expiry() {
    let (auth, store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();
    store.set_token_expiry(&plaintext, Utc::now());

    let result = auth.verify_and_login(&plaintext).await.unwrap();
    assert!(result.is_none(), "token at expiry must be rejected");
}

#[tokio::test]
async fn test_redemption_succeeds_strictly_before_expiry() {
    let (auth, store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();
    store.set_token_expiry(&plaintext, Utc::now() + Duration::seconds(30));

    let result = auth.verify_and_login(&plaintext).await.unwrap();
    assert!(result.is_some(), "token strictly before expiry must redeem");
}

#[tokio::test]
async fn test_concurrent_redemption_has_exactly_one_winner() {
    let (auth, _store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();

    let (a, b) = tokio::join!(
        auth.verify_and_login(&plaintext),
        auth.verify_and_login(&plaintext),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    let successes = [a.is_some(), b.is_some()]
        .iter()
        .filter(|&&won| won)
        .count();
    assert_eq!(successes, 1, "exactly one concurrent redemption may win");
}

#[tokio::test]
async fn test_find_user_by_phone_is_side_effect_free() {
    let (auth, store) = authenticator();

    for _ in 0..3 {
        let user = auth.find_user_by_phone(PHONE).await.unwrap();
        assert!(user.is_none());
    }
    assert_eq!(store.user_count(), 0, "lookups must never create rows");
}

#[tokio::test]
async fn test_redemption_creates_user_on_first_touch_only() {
    let (auth, store) = authenticator();

    let first = auth.create_verification_token(PHONE).await.unwrap();
    auth.verify_and_login(&first).await.unwrap().unwrap();
    assert_eq!(store.user_count(), 1);

    // A second login for the same phone reuses the user
    let second = auth.create_verification_token(PHONE).await.unwrap();
    let login = auth.verify_and_login(&second).await.unwrap().unwrap();
    assert_eq!(store.user_count(), 1);
    assert_eq!(login.user.phone_number, PHONE);
}

#[tokio::test]
async fn test_returning_user_login_reports_fresh_last_login() {
    let (auth, _store) = authenticator();

    let first = auth.create_verification_token(PHONE).await.unwrap();
    let initial = auth.verify_and_login(&first).await.unwrap().unwrap();

    let before_second = Utc::now();
    let second = auth.create_verification_token(PHONE).await.unwrap();
    let login = auth.verify_and_login(&second).await.unwrap().unwrap();

    assert_eq!(login.user.id, initial.user.id);
    assert!(
        login.user.last_login >= before_second,
        "returned user must carry the last_login of this login, not the previous one"
    );
}

#[tokio::test]
async fn test_login_records_a_session() {
    let (auth, store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();
    auth.verify_and_login(&plaintext).await.unwrap().unwrap();

    assert_eq!(store.session_count(), 1);
}

#[tokio::test]
async fn test_create_user_conflict_on_duplicate_phone() {
    let (auth, _store) = authenticator();

    auth.create_user(PHONE).await.unwrap();
    let err = auth.create_user(PHONE).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict));
}

#[tokio::test]
async fn test_refresh_rotation() {
    let (auth, _store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();
    let login = auth.verify_and_login(&plaintext).await.unwrap().unwrap();

    let rotated = auth
        .refresh_session(&login.refresh_token)
        .await
        .unwrap()
        .expect("live refresh token should rotate");
    assert!(!rotated.access_token.is_empty());
    assert_ne!(rotated.refresh_token, login.refresh_token);

    // The old refresh token was revoked by the rotation
    let replay = auth.refresh_session(&login.refresh_token).await.unwrap();
    assert!(replay.is_none(), "rotated-out refresh token must be dead");

    // The new one still works
    let again = auth.refresh_session(&rotated.refresh_token).await.unwrap();
    assert!(again.is_some());
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let (auth, _store) = authenticator();

    let plaintext = auth.create_verification_token(PHONE).await.unwrap();
    let login = auth.verify_and_login(&plaintext).await.unwrap().unwrap();

    let result = auth.refresh_session(&login.access_token).await.unwrap();
    assert!(result.is_none(), "access tokens must not refresh sessions");
}
