use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User - owner of a verified phone number.
///
/// Created on first successful verification (first-touch signup).
/// Never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl User {
    /// New user for a normalized phone number, not yet persisted
    pub fn new(phone_number: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phone_number,
            name: None,
            created_at: now,
            last_login: now,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl User {
    pub async fn find_by_phone(phone_number: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, phone_number, name, created_at, last_login)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(self.id)
        .bind(&self.phone_number)
        .bind(&self.name)
        .bind(self.created_at)
        .bind(self.last_login)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn touch_last_login(id: Uuid, at: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_has_no_name() {
        let user = User::new("+15551234567".to_string());
        assert!(user.name.is_none());
        assert_eq!(user.phone_number, "+15551234567");
        assert_eq!(user.created_at, user.last_login);
    }
}
