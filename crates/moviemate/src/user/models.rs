//! User data models.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Date format used for birthdays, both on the wire and in the database.
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// Credential record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
    /// Favorite movie ids in the order they were added.
    pub favorites: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Row shape of the `users` table; favorites live in their own table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub(crate) fn into_user(self, favorites: Vec<String>) -> Result<User> {
        let birthday = self
            .birthday
            .as_deref()
            .map(|raw| NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT))
            .transpose()
            .with_context(|| format!("decoding stored birthday for user {}", self.id))?;

        Ok(User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            birthday,
            favorites,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Public user info (safe to return to clients).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
    pub favorites: Vec<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            birthday: user.birthday,
            favorites: user.favorites,
        }
    }
}

/// Registration request as received from clients.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(default)]
    pub birthday: Option<String>,
}

/// Profile update as received from clients. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    /// Absent keeps the birthday, `null` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub birthday: Option<Option<String>>,
}

/// Distinguish an explicit `null` from a missing field.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validated, hashed input for creating a record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
}

/// Validated partial update for a record.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the stored birthday.
    pub birthday: Option<Option<NaiveDate>>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password_hash.is_none()
            && self.email.is_none()
            && self.birthday.is_none()
    }
}
