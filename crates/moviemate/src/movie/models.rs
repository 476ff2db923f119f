//! Movie catalog models.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Genre embedded in a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Genre {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Director embedded in a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Director {
    pub name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default, alias = "birthyear")]
    pub birth_year: Option<String>,
    #[serde(default, alias = "deathyear")]
    pub death_year: Option<String>,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub director: Director,
    pub actors: Vec<String>,
    pub image_path: Option<String>,
    pub featured: bool,
}

/// Row shape of the `movies` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct MovieRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub genre_name: String,
    pub genre_description: String,
    pub director_name: String,
    pub director_biography: String,
    pub director_birth_year: Option<String>,
    pub director_death_year: Option<String>,
    pub actors: String,
    pub image_path: Option<String>,
    pub featured: bool,
}

impl TryFrom<MovieRow> for Movie {
    type Error = anyhow::Error;

    fn try_from(row: MovieRow) -> Result<Self> {
        let actors: Vec<String> = serde_json::from_str(&row.actors)
            .with_context(|| format!("decoding actors for movie {}", row.id))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            genre: Genre {
                name: row.genre_name,
                description: row.genre_description,
            },
            director: Director {
                name: row.director_name,
                biography: row.director_biography,
                birth_year: row.director_birth_year,
                death_year: row.director_death_year,
            },
            actors,
            image_path: row.image_path,
            featured: row.featured,
        })
    }
}

/// Catalog entry as found in an import file.
///
/// Accepts both `image_path` and the older `imagePath` spelling.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub director: Director,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default, alias = "imagePath")]
    pub image_path: Option<String>,
    #[serde(default, alias = "Featured")]
    pub featured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_entry_accepts_legacy_field_names() {
        let raw = r#"{
            "title": "Inception",
            "description": "Dreams within dreams.",
            "genre": { "name": "Sci-Fi", "description": "Speculative fiction." },
            "director": { "name": "Christopher Nolan", "biography": "British director.", "birthyear": "1970" },
            "actors": ["Leonardo DiCaprio"],
            "imagePath": "inception.png",
            "Featured": true
        }"#;

        let movie: NewMovie = serde_json::from_str(raw).unwrap();
        assert_eq!(movie.director.birth_year.as_deref(), Some("1970"));
        assert_eq!(movie.director.death_year, None);
        assert_eq!(movie.image_path.as_deref(), Some("inception.png"));
        assert!(movie.featured);
    }

    #[test]
    fn test_row_with_bad_actors_is_an_error() {
        let row = MovieRow {
            id: "mov_1".to_string(),
            title: "Broken".to_string(),
            description: String::new(),
            genre_name: "Drama".to_string(),
            genre_description: String::new(),
            director_name: "Someone".to_string(),
            director_biography: String::new(),
            director_birth_year: None,
            director_death_year: None,
            actors: "not json".to_string(),
            image_path: None,
            featured: false,
        };

        assert!(Movie::try_from(row).is_err());
    }
}
