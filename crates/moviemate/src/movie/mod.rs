//! Movie catalog module.

mod models;
mod repository;

pub use models::{Director, Genre, Movie, NewMovie};
pub use repository::MovieRepository;
