//! Test utilities and common setup.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use moviemate::api;
use moviemate::auth::{AuthConfig, AuthState};
use moviemate::db::Database;
use moviemate::movie::{Director, Genre, MovieRepository, NewMovie};
use moviemate::user::{CredentialStore, UserRepository};

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Create a test AuthConfig with a JWT secret for testing.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..AuthConfig::default()
    }
}

/// Router plus handles on what sits behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub auth: AuthState,
    pub movies: MovieRepository,
}

/// Create a test application backed by an in-memory database.
pub async fn test_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let store: Arc<dyn CredentialStore> = Arc::new(UserRepository::new(db.pool().clone()));
    test_app_with_store(db, store)
}

/// Create a test application with a custom credential store.
pub fn test_app_with_store(db: Database, store: Arc<dyn CredentialStore>) -> TestApp {
    let auth = AuthState::new(test_auth_config(), store.clone()).unwrap();
    let movies = MovieRepository::new(db.pool().clone());

    let state = api::AppState::new(auth.clone(), store, movies.clone());
    TestApp {
        router: api::create_router(state),
        db,
        auth,
        movies,
    }
}

impl TestApp {
    /// Send a request and decode the JSON body (Null when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    /// Send a prebuilt request and decode the JSON body (Null when empty or not JSON).
    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    /// Register a user and return its id.
    pub async fn register(&self, username: &str, password: &str) -> String {
        let (status, json) = self
            .send(
                Method::POST,
                "/users",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "password": password,
                    "email": format!("{username}@example.com"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
        json["id"].as_str().unwrap().to_string()
    }

    /// Log in and return the token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, json) = self
            .send(
                Method::POST,
                "/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {json}");
        json["token"].as_str().unwrap().to_string()
    }

    /// Register then log in; returns (id, token).
    pub async fn signed_in(&self, username: &str) -> (String, String) {
        let id = self.register(username, "12345678").await;
        let token = self.login(username, "12345678").await;
        (id, token)
    }

    /// Add a movie to the catalog and return its id.
    pub async fn seed_movie(&self, title: &str, genre: &str, director: &str) -> String {
        self.movies
            .upsert_by_title(NewMovie {
                title: title.to_string(),
                description: format!("About {title}"),
                genre: Genre {
                    name: genre.to_string(),
                    description: format!("{genre} films"),
                },
                director: Director {
                    name: director.to_string(),
                    biography: format!("{director} biography"),
                    birth_year: Some("1946".to_string()),
                    death_year: None,
                },
                actors: vec!["Lead Actor".to_string()],
                image_path: None,
                featured: false,
            })
            .await
            .unwrap()
            .id
    }
}
