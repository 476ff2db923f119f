//! Password hashing (bcrypt).

use super::AuthError;

/// bcrypt work factor.
pub const HASH_COST: u32 = 10;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, HASH_COST)
        .map_err(|e| AuthError::Internal(format!("hashing password: {e}")))
}

/// Check a password against a stored bcrypt hash.
///
/// A stored value that is not a bcrypt hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
