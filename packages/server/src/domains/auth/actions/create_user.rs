//! Create user action

use tracing::info;

use crate::domains::auth::errors::AuthError;
use crate::domains::auth::models::User;
use crate::kernel::BaseTokenStore;

/// Insert a fresh user row for a normalized phone number.
///
/// Callers are expected to have checked for an existing user first; a
/// duplicate phone number is a `Conflict`, not an upsert.
pub async fn create_user(
    phone_number: &str,
    store: &dyn BaseTokenStore,
) -> Result<User, AuthError> {
    if store.find_user_by_phone(phone_number).await?.is_some() {
        return Err(AuthError::Conflict);
    }

    let user = User::new(phone_number.to_string());
    store.insert_user(&user).await?;
    info!("Created user {} for {}", user.id, phone_number);
    Ok(user)
}
