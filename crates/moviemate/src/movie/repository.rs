//! Movie repository for database operations.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{Director, Genre, Movie, MovieRow, NewMovie};

const MOVIE_COLUMNS: &str = "id, title, description, genre_name, genre_description, \
     director_name, director_biography, director_birth_year, director_death_year, \
     actors, image_path, featured";

/// Read and import access to the movie catalog.
#[derive(Debug, Clone)]
pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    /// Create a new movie repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn generate_id() -> String {
        format!("mov_{}", nanoid::nanoid!(12))
    }

    /// All movies ordered by title.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title");
        let rows: Vec<MovieRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list movies")?;

        rows.into_iter().map(Movie::try_from).collect()
    }

    /// Find a movie by ID.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ?");
        let row: Option<MovieRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get movie by id")?;

        row.map(Movie::try_from).transpose()
    }

    /// Find a movie by its exact title.
    #[instrument(skip(self))]
    pub async fn get_by_title(&self, title: &str) -> Result<Option<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE title = ?");
        let row: Option<MovieRow> = sqlx::query_as(&query)
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get movie by title")?;

        row.map(Movie::try_from).transpose()
    }

    /// Look up a genre by name, ignoring case.
    #[instrument(skip(self))]
    pub async fn genre_by_name(&self, name: &str) -> Result<Option<Genre>> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT genre_name, genre_description FROM movies \
             WHERE genre_name = ? COLLATE NOCASE ORDER BY title LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get genre")?;

        Ok(row.map(|(name, description)| Genre { name, description }))
    }

    /// Look up a director by name, ignoring case.
    #[instrument(skip(self))]
    pub async fn director_by_name(&self, name: &str) -> Result<Option<Director>> {
        let row: Option<(String, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT director_name, director_biography, director_birth_year, director_death_year \
             FROM movies WHERE director_name = ? COLLATE NOCASE ORDER BY title LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get director")?;

        Ok(row.map(|(name, biography, birth_year, death_year)| Director {
            name,
            biography,
            birth_year,
            death_year,
        }))
    }

    /// Insert a movie, or replace the details of the one with the same title.
    ///
    /// An existing movie keeps its ID so favorites pointing at it survive.
    #[instrument(skip(self, movie), fields(title = %movie.title))]
    pub async fn upsert_by_title(&self, movie: NewMovie) -> Result<Movie> {
        let actors = serde_json::to_string(&movie.actors).context("encoding actors")?;

        sqlx::query(
            r#"
            INSERT INTO movies (id, title, description, genre_name, genre_description,
                                director_name, director_biography, director_birth_year,
                                director_death_year, actors, image_path, featured)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (title) DO UPDATE SET
                description = excluded.description,
                genre_name = excluded.genre_name,
                genre_description = excluded.genre_description,
                director_name = excluded.director_name,
                director_biography = excluded.director_biography,
                director_birth_year = excluded.director_birth_year,
                director_death_year = excluded.director_death_year,
                actors = excluded.actors,
                image_path = excluded.image_path,
                featured = excluded.featured
            "#,
        )
        .bind(Self::generate_id())
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(&movie.genre.name)
        .bind(&movie.genre.description)
        .bind(&movie.director.name)
        .bind(&movie.director.biography)
        .bind(&movie.director.birth_year)
        .bind(&movie.director.death_year)
        .bind(&actors)
        .bind(&movie.image_path)
        .bind(movie.featured)
        .execute(&self.pool)
        .await
        .context("Failed to upsert movie")?;

        debug!("Upserted movie");

        self.get_by_title(&movie.title)
            .await?
            .with_context(|| format!("movie '{}' vanished after upsert", movie.title))
    }

    /// Delete a movie. Favorites referencing it are removed with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete movie")?;

        Ok(result.rows_affected() > 0)
    }

    /// Count movies in the catalog.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count movies")?;

        Ok(count.0)
    }
}
