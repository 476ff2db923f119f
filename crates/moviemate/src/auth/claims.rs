//! JWT claims.

use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
///
/// Only identity references travel in the token; the full record is looked
/// up again on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username at issuance time).
    pub sub: String,

    /// Credential record id.
    pub uid: String,

    /// Issued at (as Unix timestamp).
    pub iat: i64,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Unique token id.
    pub jti: String,
}
