// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (token lifecycle, webhook dispatch) lives in domain
// functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseTokenStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domains::auth::models::{RefreshToken, Session, User, VerificationToken};

// =============================================================================
// Token Store Trait (Infrastructure - durable auth records)
// =============================================================================

/// Durable store for users, verification tokens, sessions and refresh
/// tokens. The store must provide at least read-committed isolation and
/// an atomic conditional update on `used_at` / `revoked_at`.
#[async_trait]
pub trait BaseTokenStore: Send + Sync {
    async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn insert_verification_token(&self, token: &VerificationToken) -> Result<()>;

    async fn find_verification_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>>;

    /// Set `used_at` iff it is still null. Returns true when this call won
    /// the redemption; false means another caller already consumed the
    /// token. This is the authoritative single-use point.
    async fn mark_verification_token_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool>;

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()>;

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>>;

    /// Set `revoked_at` iff it is still null. Returns true when this call
    /// performed the revocation.
    async fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool>;

    async fn insert_session(&self, session: &Session) -> Result<()>;
}

// =============================================================================
// Messaging Gateway Trait (Infrastructure - outbound chat API)
// =============================================================================

/// Interactive call-to-action content, provider-agnostic.
#[derive(Debug, Clone)]
pub struct CtaMessage {
    pub body: String,
    pub display_text: String,
    pub url: String,
    pub footer: Option<String>,
}

#[async_trait]
pub trait BaseMessagingGateway: Send + Sync {
    /// Mark an inbound message as read (read receipt)
    async fn mark_message_as_read(&self, message_id: &str) -> Result<()>;

    /// Show a typing indicator in the conversation
    async fn send_typing_indicator(&self, message_id: &str) -> Result<()>;

    /// Send a plain text reply
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;

    /// Send an interactive message with a URL button
    async fn send_cta_url(&self, to: &str, cta: &CtaMessage) -> Result<()>;
}

// =============================================================================
// Signup Service Trait (narrow auth surface consumed by the webhook actor)
// =============================================================================

/// The only part of the authenticator the webhook actor is allowed to see.
/// Keeps messaging logic decoupled from credential issuance.
#[async_trait]
pub trait BaseSignupService: Send + Sync {
    async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>>;

    /// Create a verification token and return the plaintext (shown once).
    async fn create_verification_token(&self, phone_number: &str) -> Result<String>;
}

// =============================================================================
// Processing Arena Trait (durable key/value space per conversation)
// =============================================================================

/// Durable key/value arena scoped to one logical conversation partition.
/// Backs the webhook actor's processing-status snapshot and per-message
/// bookkeeping records.
#[async_trait]
pub trait ProcessingArena: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Hands out an arena for a partition key. The partition key is a routing
/// decision made by the caller (normalized sender phone number here).
pub trait BaseArenaFactory: Send + Sync {
    fn arena_for(&self, partition_key: &str) -> Arc<dyn ProcessingArena>;
}
