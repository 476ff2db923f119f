//! Credential store abstraction.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewUser, User, UserChanges};

/// Storage backend for credential records.
///
/// Errors mean the backend itself failed (connectivity, corruption); a
/// missing record is `Ok(None)` / `Ok(false)`. Each method is a single
/// atomic operation on one record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a record by its unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up a record by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Persist a new record. Fails if the username is already taken.
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Apply a partial update. Returns `None` if the record does not exist.
    async fn update(&self, id: &str, changes: UserChanges) -> Result<Option<User>>;

    /// Delete a record. Returns `false` if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Add a movie id to the record's favorites (no-op if already present).
    async fn add_favorite(&self, id: &str, movie_id: &str) -> Result<Option<User>>;

    /// Remove a movie id from the record's favorites (no-op if absent).
    async fn remove_favorite(&self, id: &str, movie_id: &str) -> Result<Option<User>>;
}
