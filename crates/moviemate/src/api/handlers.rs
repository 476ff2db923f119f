//! HTTP request handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::auth::RequireOwner;
use crate::movie::{Director, Genre, Movie};
use crate::user::{CreateUserRequest, UpdateUserRequest, UserInfo};

/// Plain-text greeting at the API root.
pub async fn welcome() -> &'static str {
    "Welcome to moviemate! Browse the catalog at /movies."
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Catch-all for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found("No such route")
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed for this route".to_string())
}

// ============================================================================
// Auth
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserInfo,
    pub token: String,
}

/// Register a new account.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body?;
    let user = state.users.register(request).await?;

    Ok((StatusCode::CREATED, Json(UserInfo::from(user))))
}

/// Exchange a username and password for an access token.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = body?;
    let (user, token) = state.auth.login(&request.username, &request.password).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
    }))
}

// ============================================================================
// Movies
// ============================================================================

/// List the whole catalog.
pub async fn list_movies(State(state): State<AppState>) -> ApiResult<Json<Vec<Movie>>> {
    Ok(Json(state.movies.list().await?))
}

/// Get one movie by title.
pub async fn get_movie(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<Json<Movie>> {
    state
        .movies
        .get_by_title(&title)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Movie not found: {title}")))
}

/// Get a genre by name.
pub async fn get_genre(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Genre>> {
    state
        .movies
        .genre_by_name(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Genre not found: {name}")))
}

/// Get a director by name.
pub async fn get_director(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Director>> {
    state
        .movies
        .director_by_name(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Director not found: {name}")))
}

// ============================================================================
// Users
// ============================================================================

/// Get the caller's own profile.
pub async fn get_user(RequireOwner(current): RequireOwner) -> Json<UserInfo> {
    Json(current.user.into())
}

/// Update the caller's own profile.
#[instrument(skip(state, current, body))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireOwner(current): RequireOwner,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserInfo>> {
    let Json(request) = body?;
    let user = state.users.update_user(current.id(), request).await?;
    Ok(Json(user.into()))
}

/// Delete the caller's own account.
#[instrument(skip(state, current))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireOwner(current): RequireOwner,
) -> ApiResult<StatusCode> {
    state.users.delete_user(current.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a movie to the caller's favorites.
#[instrument(skip(state, current))]
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireOwner(current): RequireOwner,
    Path((_, movie_id)): Path<(String, String)>,
) -> ApiResult<Json<UserInfo>> {
    if state.movies.get_by_id(&movie_id).await?.is_none() {
        return Err(ApiError::not_found(format!("Movie not found: {movie_id}")));
    }

    let user = state.users.add_favorite(current.id(), &movie_id).await?;
    Ok(Json(user.into()))
}

/// Remove a movie from the caller's favorites.
#[instrument(skip(state, current))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireOwner(current): RequireOwner,
    Path((_, movie_id)): Path<(String, String)>,
) -> ApiResult<Json<UserInfo>> {
    let user = state.users.remove_favorite(current.id(), &movie_id).await?;
    Ok(Json(user.into()))
}
