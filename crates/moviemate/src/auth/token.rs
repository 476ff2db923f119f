//! Access token issuance and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::warn;

use super::{AuthError, Claims};
use crate::user::User;

/// Mints signed access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_days: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            ttl: Duration::days(i64::from(ttl_days)),
        }
    }

    /// Issue a token for `user`, valid from now.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token for `user` as if it were `now`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            jti: nanoid::nanoid!(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

/// Checks signature, algorithm and expiry of presented tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                warn!("JWT validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::InvalidToken("token expired".into()),
                    ErrorKind::InvalidSignature => {
                        AuthError::InvalidToken("signature mismatch".into())
                    }
                    ErrorKind::InvalidAlgorithm => {
                        AuthError::InvalidToken("unexpected algorithm".into())
                    }
                    _ => AuthError::InvalidToken("malformed token".into()),
                }
            })?;

        Ok(token_data.claims)
    }
}
