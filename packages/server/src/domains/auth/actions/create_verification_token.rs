//! Create verification token action

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use crate::domains::auth::models::VerificationToken;
use crate::kernel::BaseTokenStore;

/// Generate a random verification token for a phone number.
///
/// Only the digest is persisted; the returned plaintext is the one and
/// only copy and goes straight into the verification link.
pub async fn create_verification_token(
    phone_number: &str,
    store: &dyn BaseTokenStore,
) -> Result<String> {
    let plaintext = Uuid::new_v4().to_string();
    let token = VerificationToken::issue(phone_number, &plaintext);

    store.insert_verification_token(&token).await?;
    info!(
        "Issued verification token {} for {} (expires {})",
        token.id, phone_number, token.expires_at
    );

    Ok(plaintext)
}
