use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::auth::jwt::REFRESH_TOKEN_TTL_DAYS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Revoked,
}

/// Session - advisory record of an issued credential pair.
///
/// Credential verification goes through the signed tokens themselves;
/// session rows exist for audit and operator visibility.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub auth_token: Option<String>,
    pub refresh_token: Option<String>,
    pub status: SessionStatus,
}

impl Session {
    /// Active session covering the lifetime of the refresh credential
    pub fn active(user_id: Uuid, auth_token: &str, refresh_token: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            auth_token: Some(auth_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            status: SessionStatus::Active,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Session {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at, auth_token, refresh_token, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(self.created_at)
        .bind(self.expires_at)
        .bind(&self.auth_token)
        .bind(&self.refresh_token)
        .bind(self.status)
        .execute(pool)
        .await?;
        Ok(())
    }
}
