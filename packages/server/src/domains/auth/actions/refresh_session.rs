//! Refresh session action: rotate a refresh credential

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::domains::auth::errors::AuthError;
use crate::domains::auth::jwt::{JwtService, TokenKind};
use crate::domains::auth::models::{hash_token, RefreshToken};
use crate::kernel::BaseTokenStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub access_token: String,
    pub refresh_token: String,
}

/// Exchange a refresh credential for a fresh access/refresh pair.
///
/// The presented token must verify as a refresh-kind JWT AND match a live
/// store row; the row is revoked before new credentials are issued
/// (rotation), with the same conditional-update discipline as token
/// redemption. All rejections are `Ok(None)`.
pub async fn refresh_session(
    refresh_token: &str,
    store: &dyn BaseTokenStore,
    jwt_service: &JwtService,
) -> Result<Option<RefreshResult>, AuthError> {
    let claims = match jwt_service.verify_token(refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Refresh token failed signature check: {}", e);
            return Ok(None);
        }
    };
    if claims.kind != TokenKind::Refresh {
        debug!("Non-refresh token presented for refresh");
        return Ok(None);
    }

    let now = Utc::now();
    let token_hash = hash_token(refresh_token);
    let Some(row) = store.find_active_refresh_token(&token_hash, now).await? else {
        debug!("Refresh token unknown, revoked or expired");
        return Ok(None);
    };

    if !store.revoke_refresh_token(row.id, now).await? {
        debug!(token_id = %row.id, "Lost refresh rotation race");
        return Ok(None);
    }

    let access_token = jwt_service.create_access_token(row.user_id)?;
    let new_refresh_token = jwt_service.create_refresh_token(row.user_id)?;
    store
        .insert_refresh_token(&RefreshToken::issue(row.user_id, &new_refresh_token))
        .await?;

    info!(user_id = %row.user_id, "Refresh rotation succeeded");
    Ok(Some(RefreshResult {
        access_token,
        refresh_token: new_refresh_token,
    }))
}
