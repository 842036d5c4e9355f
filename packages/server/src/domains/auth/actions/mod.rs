mod create_user;
mod create_verification_token;
mod refresh_session;
mod verify_login;

pub use create_user::create_user;
pub use create_verification_token::create_verification_token;
pub use refresh_session::{refresh_session, RefreshResult};
pub use verify_login::{verify_and_login, LoginResult};

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::domains::auth::errors::AuthError;
use crate::domains::auth::jwt::JwtService;
use crate::domains::auth::models::User;
use crate::kernel::{BaseSignupService, BaseTokenStore};

/// Verification Authenticator - issues and redeems single-use verification
/// tokens and turns successful redemptions into signed credentials.
///
/// Holds no long-lived state of its own; everything durable goes through
/// the injected token store.
pub struct Authenticator {
    store: Arc<dyn BaseTokenStore>,
    jwt_service: Arc<JwtService>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn BaseTokenStore>, jwt_service: Arc<JwtService>) -> Self {
        Self { store, jwt_service }
    }

    /// Pure lookup, no side effects
    pub async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        self.store.find_user_by_phone(phone_number).await
    }

    /// Insert a fresh user row. Fails with `AuthError::Conflict` when the
    /// phone number is already registered - this never upserts.
    pub async fn create_user(&self, phone_number: &str) -> Result<User, AuthError> {
        create_user(phone_number, self.store.as_ref()).await
    }

    /// Issue a verification token and return the plaintext (shown once)
    pub async fn create_verification_token(&self, phone_number: &str) -> Result<String> {
        create_verification_token(phone_number, self.store.as_ref()).await
    }

    /// Redeem a plaintext verification token for session credentials.
    /// `Ok(None)` covers every normal rejection: unknown, expired, used.
    pub async fn verify_and_login(
        &self,
        plaintext_token: &str,
    ) -> Result<Option<LoginResult>, AuthError> {
        verify_and_login(plaintext_token, self.store.as_ref(), &self.jwt_service).await
    }

    /// Rotate a refresh credential into a fresh access/refresh pair
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshResult>, AuthError> {
        refresh_session(refresh_token, self.store.as_ref(), &self.jwt_service).await
    }
}

/// The webhook actor only sees this narrow slice of the authenticator.
#[async_trait]
impl BaseSignupService for Authenticator {
    async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        self.store.find_user_by_phone(phone_number).await
    }

    async fn create_verification_token(&self, phone_number: &str) -> Result<String> {
        create_verification_token(phone_number, self.store.as_ref()).await
    }
}
