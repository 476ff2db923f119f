//! Authentication middleware and extractors.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use log::{debug, error};

use super::credentials::verify_credentials;
use super::guard::authorize;
use super::token::{TokenIssuer, TokenVerifier};
use super::{AuthConfig, AuthError, ConfigValidationError};
use crate::user::{CredentialStore, User};

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Authentication state shared across handlers.
///
/// Built once at startup; the signing secret never changes afterwards.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    store: Arc<dyn CredentialStore>,
}

impl AuthState {
    /// Create auth state, validating the signing secret.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigValidationError> {
        let secret = config.validated_secret()?;

        Ok(Self {
            issuer: TokenIssuer::new(secret.as_bytes(), config.token_ttl_days),
            verifier: TokenVerifier::new(secret.as_bytes()),
            config: Arc::new(config),
            store,
        })
    }

    /// Get allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Check credentials and mint a token for the matching user.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let user = verify_credentials(self.store.as_ref(), username, password).await?;
        let token = self.issuer.issue(&user)?;
        Ok((user, token))
    }

    /// Verify a token and load the live record it refers to.
    pub async fn resolve_identity(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.verifier.verify(token)?;

        match self.store.find_by_id(&claims.uid).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                debug!("Token for vanished user {}", claims.uid);
                Err(AuthError::IdentityNotFound)
            }
            Err(e) => {
                error!("Identity lookup failed: {:#}", e);
                Err(AuthError::StoreUnavailable)
            }
        }
    }
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Live record resolved from the token.
    pub user: User,
}

impl CurrentUser {
    /// Get the user ID.
    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Check that this user owns `owner_id`.
    pub fn authorize(&self, owner_id: &str) -> Result<(), AuthError> {
        authorize(&self.user, owner_id)
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a live user and injects
/// `CurrentUser` into request extensions. Requests that fail never reach
/// the handler.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = bearer_token_from_header(header)?;
    let user = auth.resolve_identity(token).await?;

    req.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(req).await)
}

/// Require that the caller owns the user named by the `{id}` path segment.
///
/// Use as an extractor in handlers under `/users/{id}`.
#[derive(Debug, Clone)]
pub struct RequireOwner(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireOwner
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AuthError::Validation(e.body_text()))?;
        let owner_id = params
            .get("id")
            .ok_or_else(|| AuthError::Validation("missing user id in path".to_string()))?;

        user.authorize(owner_id)?;

        Ok(RequireOwner(user))
    }
}
