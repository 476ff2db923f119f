//! Ownership checks for per-user resources.

use super::AuthError;
use crate::user::User;

/// Allow only when `identity` owns the resource belonging to `owner_id`.
pub fn authorize(identity: &User, owner_id: &str) -> Result<(), AuthError> {
    if identity.id == owner_id {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}
