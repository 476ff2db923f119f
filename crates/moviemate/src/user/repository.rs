//! User repository for database operations.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{BIRTHDAY_FORMAT, NewUser, User, UserChanges, UserRow};
use super::store::CredentialStore;

const USER_COLUMNS: &str =
    "id, username, password_hash, email, birthday, created_at, updated_at";

/// SQLite-backed credential store.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate a new user ID.
    fn generate_id() -> String {
        format!("usr_{}", nanoid::nanoid!(12))
    }

    async fn favorites_of(&self, id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT movie_id FROM user_favorites WHERE user_id = ? ORDER BY added_at, rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch favorites")?;

        Ok(rows.into_iter().map(|(movie_id,)| movie_id).collect())
    }

    async fn hydrate(&self, row: Option<UserRow>) -> Result<Option<User>> {
        match row {
            Some(row) => {
                let favorites = self.favorites_of(&row.id).await?;
                Ok(Some(row.into_user(favorites)?))
            }
            None => Ok(None),
        }
    }

    /// Count total users.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(count.0)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl CredentialStore for UserRepository {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")?;

        self.hydrate(row).await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        self.hydrate(row).await
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: NewUser) -> Result<User> {
        let id = Self::generate_id();
        debug!("Creating user: {} ({})", user.username, id);

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, email, birthday)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.birthday.map(|d| d.format(BIRTHDAY_FORMAT).to_string()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(anyhow!("Username '{}' is already taken.", user.username));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert user")),
        }

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| anyhow!("User not found after creation"))
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: &str, changes: UserChanges) -> Result<Option<User>> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut updates = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(username) = &changes.username {
            updates.push("username = ?");
            values.push(username.clone());
        }

        if let Some(password_hash) = &changes.password_hash {
            updates.push("password_hash = ?");
            values.push(password_hash.clone());
        }

        if let Some(email) = &changes.email {
            updates.push("email = ?");
            values.push(email.clone());
        }

        match &changes.birthday {
            Some(Some(birthday)) => {
                updates.push("birthday = ?");
                values.push(birthday.format(BIRTHDAY_FORMAT).to_string());
            }
            Some(None) => updates.push("birthday = NULL"),
            None => {}
        }

        updates.push("updated_at = datetime('now')");

        let sql = format!("UPDATE users SET {} WHERE id = ?", updates.join(", "));

        let mut query_builder = sqlx::query(&sql);
        for value in &values {
            query_builder = query_builder.bind(value);
        }
        query_builder = query_builder.bind(id);

        let result = match query_builder.execute(&self.pool).await {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) => {
                let username = changes.username.unwrap_or_default();
                return Err(anyhow!("Username '{}' is already taken.", username));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to update user")),
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn add_favorite(&self, id: &str, movie_id: &str) -> Result<Option<User>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_favorites (user_id, movie_id)
            SELECT users.id, movies.id FROM users, movies
            WHERE users.id = ? AND movies.id = ?
            "#,
        )
        .bind(id)
        .bind(movie_id)
        .execute(&self.pool)
        .await
        .context("Failed to add favorite")?;

        debug!(rows = result.rows_affected(), "Added favorite");
        self.find_by_id(id).await
    }

    #[instrument(skip(self))]
    async fn remove_favorite(&self, id: &str, movie_id: &str) -> Result<Option<User>> {
        sqlx::query("DELETE FROM user_favorites WHERE user_id = ? AND movie_id = ?")
            .bind(id)
            .bind(movie_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove favorite")?;

        self.find_by_id(id).await
    }
}
