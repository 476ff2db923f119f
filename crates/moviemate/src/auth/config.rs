//! Authentication configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Secret shipped in early tutorials of this app; refused outright.
const INSECURE_SECRETS: &[&str] = &["your_jwt_secret", "change-me"];

/// Minimum accepted secret length for HS256.
pub const MIN_SECRET_LEN: usize = 32;

/// Default access token lifetime.
pub const DEFAULT_TOKEN_TTL_DAYS: u32 = 7;

/// Longest accepted access token lifetime.
pub const MAX_TOKEN_TTL_DAYS: u32 = 365;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Either a literal or `env:VAR_NAME`.
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens, in days.
    pub token_ttl_days: u32,

    /// Allowed CORS origins. Empty disables cross-origin access.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default JWT secret - must be explicitly configured
            jwt_secret: None,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            allowed_origins: vec![
                "http://localhost:1234".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration and return the usable signing secret.
    pub fn validated_secret(&self) -> Result<String, ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or(ConfigValidationError::MissingJwtSecret)?;

        if INSECURE_SECRETS.contains(&secret.as_str()) {
            return Err(ConfigValidationError::InsecureJwtSecret);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
            return Err(ConfigValidationError::InvalidTokenTtl);
        }

        Ok(secret)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.validated_secret().map(|_| ())
    }

    /// Generate a secure random JWT secret.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error(
        "JWT secret is required. Set MOVIEMATE__AUTH__JWT_SECRET or auth.jwt_secret in the config file."
    )]
    MissingJwtSecret,

    #[error("JWT secret cannot be a well-known placeholder value.")]
    InsecureJwtSecret,

    #[error("JWT secret must be at least 32 characters long.")]
    JwtSecretTooShort,

    #[error("auth.token_ttl_days must be between 1 and {}.", MAX_TOKEN_TTL_DAYS)]
    InvalidTokenTtl,

    #[error("Environment variable '{0}' not found (referenced via env:{0} in config).")]
    EnvVarNotFound(String),

    #[error("Environment variable '{0}' is empty (referenced via env:{0} in config).")]
    EnvVarEmpty(String),
}
