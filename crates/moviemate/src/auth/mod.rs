//! Authentication module.
//!
//! Provides:
//! - bcrypt password hashing and login-time credential checks
//! - HS256 access token issuance and verification
//! - bearer-token middleware resolving each request to a live user
//! - ownership checks for per-user routes

mod claims;
mod config;
mod credentials;
mod error;
mod guard;
mod middleware;
mod password;
mod token;

pub use claims::Claims;
pub use config::{AuthConfig, ConfigValidationError, DEFAULT_TOKEN_TTL_DAYS, MIN_SECRET_LEN};
pub use credentials::verify_credentials;
pub use error::{AuthError, AuthErrorResponse};
pub use guard::authorize;
pub use middleware::{AuthState, CurrentUser, RequireOwner, auth_middleware};
pub use password::{HASH_COST, hash_password, verify_password};
pub use token::{TokenIssuer, TokenVerifier};
