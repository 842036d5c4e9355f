//! Postgres-backed processing arena.
//!
//! One row per (partition_key, key); the actor's status snapshot and
//! per-message records live here as JSONB values.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::{BaseArenaFactory, ProcessingArena};

/// Arena key holding the single most-recent ActorStatus snapshot
pub const PROCESSING_STATUS_KEY: &str = "processingStatus";

pub struct PgProcessingArena {
    pool: PgPool,
    partition_key: String,
}

impl PgProcessingArena {
    pub fn new(pool: PgPool, partition_key: String) -> Self {
        Self { pool, partition_key }
    }
}

#[async_trait]
impl ProcessingArena for PgProcessingArena {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM processing_state WHERE partition_key = $1 AND key = $2",
        )
        .bind(&self.partition_key)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processing_state (partition_key, key, value, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (partition_key, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&self.partition_key)
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Creates a partition-scoped Postgres arena on demand
#[derive(Clone)]
pub struct PgArenaFactory {
    pool: PgPool,
}

impl PgArenaFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BaseArenaFactory for PgArenaFactory {
    fn arena_for(&self, partition_key: &str) -> Arc<dyn ProcessingArena> {
        Arc::new(PgProcessingArena::new(
            self.pool.clone(),
            partition_key.to_string(),
        ))
    }
}
