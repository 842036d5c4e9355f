use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Verification tokens expire 10 minutes after issuance
pub const VERIFICATION_TOKEN_TTL_MINUTES: i64 = 10;

/// VerificationToken - single-use, time-boxed proof of phone ownership.
///
/// Only the SHA-256 digest of the plaintext is stored; the plaintext is
/// handed out once in the verification link and is never recoverable.
/// Rows are kept after redemption for audit and replay detection.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerificationToken {
    pub id: Uuid,
    pub token_hash: String,
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Build a token record for a freshly generated plaintext
    pub fn issue(phone_number: &str, plaintext: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            token_hash: hash_token(plaintext),
            phone_number: phone_number.to_string(),
            expires_at: now + Duration::minutes(VERIFICATION_TOKEN_TTL_MINUTES),
            used_at: None,
            created_at: now,
        }
    }

    /// A token is redeemable iff it is unused and not yet expired
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl VerificationToken {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens (id, token_hash, phone_number, expires_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(&self.token_hash)
        .bind(&self.phone_number)
        .bind(self.expires_at)
        .bind(self.used_at)
        .bind(self.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_hash(token_hash: &str, pool: &PgPool) -> Result<Option<Self>> {
        let token = sqlx::query_as::<_, VerificationToken>(
            "SELECT * FROM verification_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;
        Ok(token)
    }

    /// Conditional redemption: a single UPDATE guarded by `used_at IS NULL`
    /// closes the race where two concurrent requests both pass the read
    /// check. The affected-row count decides who won.
    pub async fn mark_used(id: Uuid, at: DateTime<Utc>, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE verification_tokens SET used_at = $1 WHERE id = $2 AND used_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Digest a plaintext token with SHA-256 for storage and lookup.
///
/// Lookups always go through the digest, never a plaintext comparison,
/// so the store never holds a usable secret.
pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consistency() {
        let hash1 = hash_token("some-token");
        let hash2 = hash_token("some-token");
        assert_eq!(hash1, hash2, "Same plaintext should produce same hash");
    }

    #[test]
    fn test_hash_uniqueness() {
        let hash1 = hash_token("token-a");
        let hash2 = hash_token("token-b");
        assert_ne!(hash1, hash2, "Different plaintexts should have different hashes");
    }

    #[test]
    fn test_hash_format() {
        let hash = hash_token("some-token");
        assert_eq!(hash.len(), 64, "SHA256 hash should be 64 hex characters");
        assert!(
            hash.chars().all(|c| c.is_ascii_hexdigit()),
            "Hash should only contain hex digits"
        );
    }

    #[test]
    fn test_issued_token_is_redeemable() {
        let token = VerificationToken::issue("+15551234567", "plaintext");
        assert!(token.is_redeemable(Utc::now()));
        assert!(token.used_at.is_none());
    }

    #[test]
    fn test_token_not_redeemable_at_expiry() {
        let token = VerificationToken::issue("+15551234567", "plaintext");
        assert!(!token.is_redeemable(token.expires_at));
        assert!(token.is_redeemable(token.expires_at - Duration::seconds(1)));
    }
}
