//! Username/password verification at login time.

use std::sync::LazyLock;

use tracing::{error, instrument, warn};

use super::AuthError;
use super::password::{HASH_COST, verify_password};
use crate::user::{CredentialStore, User};

/// Hash checked when the username is unknown, so both failure paths cost
/// one bcrypt verification.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| bcrypt::hash("moviemate-dummy-password", HASH_COST).unwrap_or_default());

/// Look up `username` and check `password` against its stored hash.
///
/// Unknown users and wrong passwords yield the same error.
#[instrument(skip(store, password))]
pub async fn verify_credentials(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = store.find_by_username(username).await.map_err(|e| {
        error!("Credential lookup failed: {:#}", e);
        AuthError::StoreUnavailable
    })?;

    match user {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        Some(_) => {
            warn!("Login rejected: wrong password");
            Err(AuthError::InvalidCredentials)
        }
        None => {
            let _ = verify_password(password, &DUMMY_HASH);
            warn!("Login rejected: unknown username");
            Err(AuthError::InvalidCredentials)
        }
    }
}
