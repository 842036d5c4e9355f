use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::verification_token::hash_token;
use crate::domains::auth::jwt::REFRESH_TOKEN_TTL_DAYS;

/// RefreshToken - durable record of an issued refresh credential.
///
/// `user_id` is an owning reference, not ownership: revocation never
/// cascades into user deletion. Only the digest of the signed token is
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Record for a freshly signed refresh credential
    pub fn issue(user_id: Uuid, signed_token: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash_token(signed_token),
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            created_at: now,
            revoked_at: None,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl RefreshToken {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.token_hash)
        .bind(self.expires_at)
        .bind(self.created_at)
        .bind(self.revoked_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_active_by_hash(
        token_hash: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT * FROM refresh_tokens
            WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(token)
    }

    /// Conditional revocation, same affected-row discipline as
    /// verification-token redemption.
    pub async fn revoke(id: Uuid, at: DateTime<Utc>, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
