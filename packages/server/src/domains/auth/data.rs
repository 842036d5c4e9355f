//! Postgres-backed BaseTokenStore. SQL lives with the models; this type
//! only adapts them to the store trait.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::auth::models::{RefreshToken, Session, User, VerificationToken};
use crate::kernel::BaseTokenStore;

#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseTokenStore for PgTokenStore {
    async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        User::find_by_phone(phone_number, &self.pool).await
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        user.insert(&self.pool).await
    }

    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        User::touch_last_login(user_id, at, &self.pool).await
    }

    async fn insert_verification_token(&self, token: &VerificationToken) -> Result<()> {
        token.insert(&self.pool).await
    }

    async fn find_verification_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>> {
        VerificationToken::find_by_hash(token_hash, &self.pool).await
    }

    async fn mark_verification_token_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        VerificationToken::mark_used(id, at, &self.pool).await
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        token.insert(&self.pool).await
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>> {
        RefreshToken::find_active_by_hash(token_hash, now, &self.pool).await
    }

    async fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        RefreshToken::revoke(id, at, &self.pool).await
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        session.insert(&self.pool).await
    }
}
