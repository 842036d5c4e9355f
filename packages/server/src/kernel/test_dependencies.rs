// Test dependencies - mock and in-memory implementations for testing
//
// Compiled into the library so both unit tests and the integration suites
// under tests/ can use them.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domains::auth::models::{
    hash_token, RefreshToken, Session, User, VerificationToken,
};
use crate::kernel::{
    BaseArenaFactory, BaseMessagingGateway, BaseSignupService, BaseTokenStore, CtaMessage,
    ProcessingArena,
};

// =============================================================================
// Mock Messaging Gateway
// =============================================================================

/// Records every outbound call so tests can assert on gateway traffic.
pub struct MockMessagingGateway {
    read_receipts: Arc<Mutex<Vec<String>>>,
    typing_indicators: Arc<Mutex<Vec<String>>>,
    text_sends: Arc<Mutex<Vec<(String, String)>>>,
    cta_sends: Arc<Mutex<Vec<(String, CtaMessage)>>>,
    fail_sends: bool,
}

impl MockMessagingGateway {
    pub fn new() -> Self {
        Self {
            read_receipts: Arc::new(Mutex::new(Vec::new())),
            typing_indicators: Arc::new(Mutex::new(Vec::new())),
            text_sends: Arc::new(Mutex::new(Vec::new())),
            cta_sends: Arc::new(Mutex::new(Vec::new())),
            fail_sends: false,
        }
    }

    /// Make every outbound call fail, to exercise error paths
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::new()
        }
    }

    pub fn read_receipts(&self) -> Vec<String> {
        self.read_receipts.lock().unwrap().clone()
    }

    pub fn typing_indicators(&self) -> Vec<String> {
        self.typing_indicators.lock().unwrap().clone()
    }

    pub fn text_sends(&self) -> Vec<(String, String)> {
        self.text_sends.lock().unwrap().clone()
    }

    pub fn cta_sends(&self) -> Vec<(String, CtaMessage)> {
        self.cta_sends.lock().unwrap().clone()
    }

    /// Total number of outbound calls of any kind
    pub fn call_count(&self) -> usize {
        self.read_receipts.lock().unwrap().len()
            + self.typing_indicators.lock().unwrap().len()
            + self.text_sends.lock().unwrap().len()
            + self.cta_sends.lock().unwrap().len()
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_sends {
            anyhow::bail!("gateway unavailable");
        }
        Ok(())
    }
}

impl Default for MockMessagingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMessagingGateway for MockMessagingGateway {
    async fn mark_message_as_read(&self, message_id: &str) -> Result<()> {
        self.check_failure()?;
        self.read_receipts.lock().unwrap().push(message_id.to_string());
        Ok(())
    }

    async fn send_typing_indicator(&self, message_id: &str) -> Result<()> {
        self.check_failure()?;
        self.typing_indicators
            .lock()
            .unwrap()
            .push(message_id.to_string());
        Ok(())
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        self.check_failure()?;
        self.text_sends
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }

    async fn send_cta_url(&self, to: &str, cta: &CtaMessage) -> Result<()> {
        self.check_failure()?;
        self.cta_sends
            .lock()
            .unwrap()
            .push((to.to_string(), cta.clone()));
        Ok(())
    }
}

// =============================================================================
// Mock Signup Service
// =============================================================================

/// Stands in for the authenticator on the webhook side. Returns a fixed
/// plaintext token and records which phone numbers requested one.
pub struct MockSignupService {
    users: Mutex<HashMap<String, User>>,
    plaintext_token: String,
    token_requests: Arc<Mutex<Vec<String>>>,
}

impl MockSignupService {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            plaintext_token: Uuid::new_v4().to_string(),
            token_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-register a user so lookups find them
    pub fn with_user(self, user: User) -> Self {
        self.users
            .lock()
            .unwrap()
            .insert(user.phone_number.clone(), user);
        self
    }

    /// Fix the plaintext token returned by create_verification_token
    pub fn with_plaintext_token(mut self, token: impl Into<String>) -> Self {
        self.plaintext_token = token.into();
        self
    }

    /// Phone numbers that requested a verification token, in order
    pub fn token_requests(&self) -> Vec<String> {
        self.token_requests.lock().unwrap().clone()
    }
}

impl Default for MockSignupService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSignupService for MockSignupService {
    async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(phone_number).cloned())
    }

    async fn create_verification_token(&self, phone_number: &str) -> Result<String> {
        self.token_requests
            .lock()
            .unwrap()
            .push(phone_number.to_string());
        Ok(self.plaintext_token.clone())
    }
}

// =============================================================================
// In-Memory Token Store
// =============================================================================

#[derive(Default)]
struct TokenStoreInner {
    users: HashMap<Uuid, User>,
    verification_tokens: HashMap<String, VerificationToken>,
    refresh_tokens: HashMap<String, RefreshToken>,
    sessions: Vec<Session>,
}

/// In-memory BaseTokenStore. A single mutex over the whole store gives the
/// same conditional-update atomicity the Postgres implementation gets from
/// its `WHERE used_at IS NULL` updates.
pub struct InMemoryTokenStore {
    inner: Mutex<TokenStoreInner>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TokenStoreInner::default()),
        }
    }

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    /// Rewrite a verification token's expiry, keyed by the digest of the
    /// plaintext. Used by expiry-boundary tests.
    pub fn set_token_expiry(&self, plaintext: &str, expires_at: DateTime<Utc>) {
        let hash = hash_token(plaintext);
        let mut inner = self.inner.lock().unwrap();
        if let Some(token) = inner.verification_tokens.get_mut(&hash) {
            token.expires_at = expires_at;
        }
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseTokenStore for InMemoryTokenStore {
    async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.phone_number == phone_number)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .values()
            .any(|u| u.phone_number == user.phone_number)
        {
            anyhow::bail!("unique violation: users.phone_number");
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.last_login = at;
        }
        Ok(())
    }

    async fn insert_verification_token(&self, token: &VerificationToken) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.verification_tokens.contains_key(&token.token_hash) {
            anyhow::bail!("unique violation: verification_tokens.token_hash");
        }
        inner
            .verification_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_verification_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.verification_tokens.get(token_hash).cloned())
    }

    async fn mark_verification_token_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let token = inner
            .verification_tokens
            .values_mut()
            .find(|t| t.id == id);
        match token {
            Some(token) if token.used_at.is_none() => {
                token.used_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .refresh_tokens
            .get(token_hash)
            .filter(|t| t.revoked_at.is_none() && t.expires_at > now)
            .cloned())
    }

    async fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let token = inner.refresh_tokens.values_mut().find(|t| t.id == id);
        match token {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        self.inner.lock().unwrap().sessions.push(session.clone());
        Ok(())
    }
}

// =============================================================================
// In-Memory Processing Arena
// =============================================================================

pub struct InMemoryArena {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemoryArena {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryArena {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessingArena for InMemoryArena {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Arena factory that keeps one in-memory arena per partition key
pub struct InMemoryArenaFactory {
    arenas: Mutex<HashMap<String, Arc<InMemoryArena>>>,
}

impl InMemoryArenaFactory {
    pub fn new() -> Self {
        Self {
            arenas: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryArenaFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseArenaFactory for InMemoryArenaFactory {
    fn arena_for(&self, partition_key: &str) -> Arc<dyn ProcessingArena> {
        let mut arenas = self.arenas.lock().unwrap();
        arenas
            .entry(partition_key.to_string())
            .or_insert_with(|| Arc::new(InMemoryArena::new()))
            .clone()
    }
}
