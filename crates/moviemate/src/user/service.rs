//! User service for business logic.

use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use super::models::{
    BIRTHDAY_FORMAT, CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges,
};
use super::store::CredentialStore;
use crate::auth::hash_password;

/// Minimum password length.
const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt only looks at the first 72 bytes.
const MAX_PASSWORD_BYTES: usize = 72;

/// Service for user management operations.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
}

impl UserService {
    /// Create a new user service.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Register a new user with validation.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: CreateUserRequest) -> Result<User> {
        if !is_valid_username(&request.username) {
            bail!(
                "Invalid username format. Must be 5-50 alphanumeric characters, underscores, or hyphens."
            );
        }

        if !is_valid_email(&request.email) {
            bail!("Invalid email format.");
        }

        validate_password(&request.password)?;
        let birthday = request.birthday.as_deref().map(parse_birthday).transpose()?;

        if self.store.find_by_username(&request.username).await?.is_some() {
            bail!("Username '{}' is already taken.", request.username);
        }

        let user = self
            .store
            .create(NewUser {
                username: request.username,
                password_hash: hash_password(&request.password)?,
                email: request.email,
                birthday,
            })
            .await?;
        info!(user_id = %user.id, username = %user.username, "Registered new user");

        Ok(user)
    }

    /// Update a user's profile.
    #[instrument(skip(self, request))]
    pub async fn update_user(&self, id: &str, request: UpdateUserRequest) -> Result<User> {
        let mut changes = UserChanges::default();

        if let Some(username) = request.username {
            if !is_valid_username(&username) {
                bail!("Invalid username format.");
            }
            let taken = self
                .store
                .find_by_username(&username)
                .await?
                .is_some_and(|existing| existing.id != id);
            if taken {
                bail!("Username '{}' is already taken.", username);
            }
            changes.username = Some(username);
        }

        if let Some(email) = request.email {
            if !is_valid_email(&email) {
                bail!("Invalid email format.");
            }
            changes.email = Some(email);
        }

        if let Some(password) = request.password {
            validate_password(&password)?;
            changes.password_hash = Some(hash_password(&password)?);
        }

        if let Some(birthday) = request.birthday {
            changes.birthday = Some(birthday.as_deref().map(parse_birthday).transpose()?);
        }

        match self.store.update(id, changes).await? {
            Some(user) => {
                info!(user_id = %user.id, "Updated user");
                Ok(user)
            }
            None => bail!("User not found: {}", id),
        }
    }

    /// Delete a user and their favorites.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        if !self.store.delete(id).await? {
            bail!("User not found: {}", id);
        }

        warn!(user_id = %id, "Deleted user");
        Ok(())
    }

    /// Add a movie to a user's favorites.
    #[instrument(skip(self))]
    pub async fn add_favorite(&self, id: &str, movie_id: &str) -> Result<User> {
        match self.store.add_favorite(id, movie_id).await? {
            Some(user) => Ok(user),
            None => bail!("User not found: {}", id),
        }
    }

    /// Remove a movie from a user's favorites.
    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, id: &str, movie_id: &str) -> Result<User> {
        match self.store.remove_favorite(id, movie_id).await? {
            Some(user) => Ok(user),
            None => bail!("User not found: {}", id),
        }
    }
}

/// Validate username format.
fn is_valid_username(username: &str) -> bool {
    let len = username.len();
    if !(5..=50).contains(&len) {
        return false;
    }

    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty()
        && !local.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains(char::is_whitespace)
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {} characters.", MIN_PASSWORD_LEN);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        bail!("Password must be at most {} bytes.", MAX_PASSWORD_BYTES);
    }
    Ok(())
}

fn parse_birthday(raw: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT) {
        Ok(date) => Ok(date),
        Err(_) => bail!("Invalid birthday '{}', expected YYYY-MM-DD.", raw),
    }
}
