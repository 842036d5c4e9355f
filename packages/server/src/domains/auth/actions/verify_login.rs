//! Verify-and-login action: redeem a verification token for credentials

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::domains::auth::errors::AuthError;
use crate::domains::auth::jwt::JwtService;
use crate::domains::auth::models::{hash_token, RefreshToken, Session, User};
use crate::kernel::BaseTokenStore;

/// Successful redemption: the owning user plus both signed credentials
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Redeem a plaintext verification token.
///
/// Every normal rejection (no matching digest, expired, already used)
/// returns `Ok(None)` so the caller can answer with one indistinguishable
/// "invalid or expired" message. Marking the token used happens BEFORE any
/// credential is issued and is guarded by a conditional update, so a token
/// is consumed at most once even under concurrent redemption.
pub async fn verify_and_login(
    plaintext_token: &str,
    store: &dyn BaseTokenStore,
    jwt_service: &JwtService,
) -> Result<Option<LoginResult>, AuthError> {
    let token_hash = hash_token(plaintext_token);

    let Some(token) = store.find_verification_token_by_hash(&token_hash).await? else {
        debug!("Verification token not found");
        return Ok(None);
    };

    let now = Utc::now();
    if !token.is_redeemable(now) {
        debug!(
            token_id = %token.id,
            expired = token.expires_at <= now,
            already_used = token.used_at.is_some(),
            "Verification token rejected"
        );
        return Ok(None);
    }

    // Authoritative redemption point. Losing the conditional update means
    // a concurrent request already consumed the token.
    if !store.mark_verification_token_used(token.id, now).await? {
        debug!(token_id = %token.id, "Lost redemption race");
        return Ok(None);
    }

    // First-touch signup: the only place a successful auth event creates
    // a user implicitly.
    let user = match store.find_user_by_phone(&token.phone_number).await? {
        Some(mut user) => {
            store.touch_last_login(user.id, now).await?;
            user.last_login = now;
            user
        }
        None => {
            let user = User::new(token.phone_number.clone());
            store.insert_user(&user).await?;
            info!("Created user {} on first verification", user.id);
            user
        }
    };

    let access_token = jwt_service.create_access_token(user.id)?;
    let refresh_token = jwt_service.create_refresh_token(user.id)?;

    store
        .insert_refresh_token(&RefreshToken::issue(user.id, &refresh_token))
        .await?;
    store
        .insert_session(&Session::active(user.id, &access_token, &refresh_token))
        .await?;

    info!(user_id = %user.id, "Verification login succeeded");
    Ok(Some(LoginResult {
        user,
        access_token,
        refresh_token,
    }))
}
