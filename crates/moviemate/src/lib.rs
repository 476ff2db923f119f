//! moviemate: movie catalog and favorites backend.
//!
//! Users register, log in for a bearer token, browse the catalog, and keep
//! a list of favorite movies on their own profile.

pub mod api;
pub mod auth;
pub mod db;
pub mod movie;
pub mod user;
