//! API integration tests.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};

use moviemate::auth::TokenIssuer;
use moviemate::db::Database;
use moviemate::user::{CredentialStore, NewUser, User, UserChanges, UserRepository};

mod common;
use common::test_app;

/// Test that health endpoint works without authentication.
#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let (status, json) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_welcome_is_public() {
    let app = test_app().await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _) = app.send_request(request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = test_app().await;

    let (status, json) = app.send(Method::GET, "/nowhere", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].is_string());
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_wrong_method_uses_error_envelope() {
    let app = test_app().await;

    let (status, json) = app
        .send(
            Method::PATCH,
            "/login",
            None,
            Some(json!({ "username": "enisa", "password": "12345678" })),
        )
        .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["code"], "METHOD_NOT_ALLOWED");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_enisa_scenario() {
    let app = test_app().await;

    let (status, json) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "username": "enisa",
                "password": "12345678",
                "email": "e@x.com",
                "birthday": "1995-03-08"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["username"], "enisa");
    assert_eq!(json["birthday"], "1995-03-08");
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
    let enisa_id = json["id"].as_str().unwrap().to_string();

    let (stored,): (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
        .bind(&enisa_id)
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_ne!(stored, "12345678");
    assert!(stored.starts_with("$2"));

    // Correct password yields a token naming enisa.
    let (status, json) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "enisa", "password": "12345678" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], enisa_id.as_str());
    assert!(json["user"].get("password_hash").is_none());
    let token = json["token"].as_str().unwrap().to_string();
    assert_eq!(token.split('.').count(), 3);

    let claims = app.auth.verifier().verify(&token).unwrap();
    assert_eq!(claims.sub, "enisa");
    assert_eq!(claims.uid, enisa_id);

    // Wrong password.
    let (status, json) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "enisa", "password": "87654321" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_CREDENTIALS");

    // Deleting someone else's account is refused.
    let other_id = app.register("another", "password123").await;
    let (status, json) = app
        .send(
            Method::DELETE,
            &format!("/users/{other_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "PERMISSION_DENIED");

    let other_token = app.login("another", "password123").await;
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/users/{other_id}"),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let app = test_app().await;
    app.register("enisa", "12345678").await;

    let (status_unknown, unknown) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "nobody", "password": "12345678" })),
        )
        .await;
    let (status_wrong, wrong) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "enisa", "password": "wrong-password" })),
        )
        .await;

    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(status_unknown, status_wrong);
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let app = test_app().await;
    app.register("enisa", "12345678").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({ "username": "enisa", "password": "abcdefgh", "email": "o@x.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = test_app().await;

    let cases = [
        json!({ "username": "abc", "password": "12345678", "email": "e@x.com" }),
        json!({ "username": "enisa", "password": "short", "email": "e@x.com" }),
        json!({ "username": "enisa", "password": "12345678", "email": "not-an-email" }),
        json!({ "username": "enisa", "password": "12345678", "email": "e@x.com", "birthday": "03/08/1995" }),
    ];

    for case in cases {
        let (status, json) = app.send(Method::POST, "/users", None, Some(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case} should be rejected");
        assert_eq!(json["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/login")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, json) = app.send_request(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ============================================================================
// Bearer authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_header() {
    let app = test_app().await;

    for uri in ["/movies", "/movies/Jaws", "/users/usr_any"] {
        let (status, json) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json["code"], "MISSING_AUTH_HEADER");
    }
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/movies")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send_request(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_AUTH_HEADER");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = test_app().await;

    let (status, json) = app
        .send(Method::GET, "/movies", Some("not.a.token"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_from_foreign_secret_rejected() {
    let app = test_app().await;
    let (id, _) = app.signed_in("enisa").await;

    let user = app.auth.resolve_identity(&app.login("enisa", "12345678").await).await.unwrap();
    assert_eq!(user.id, id);

    let forged = TokenIssuer::new(b"some-other-secret-that-is-also-long-enough", 7)
        .issue(&user)
        .unwrap();
    let (status, json) = app
        .send(Method::GET, &format!("/users/{id}"), Some(&forged), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_for_deleted_user_rejected() {
    let app = test_app().await;
    let (id, token) = app.signed_in("enisa").await;

    let (status, json) = app
        .send(Method::DELETE, &format!("/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, json) = app.send(Method::GET, "/movies", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "IDENTITY_NOT_FOUND");
}

/// Store that fails every call.
struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn find_by_id(&self, _id: &str) -> Result<Option<User>> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn create(&self, _user: NewUser) -> Result<User> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn update(&self, _id: &str, _changes: UserChanges) -> Result<Option<User>> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn delete(&self, _id: &str) -> Result<bool> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn add_favorite(&self, _id: &str, _movie_id: &str) -> Result<Option<User>> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn remove_favorite(&self, _id: &str, _movie_id: &str) -> Result<Option<User>> {
        bail!("connection refused (10.1.2.3:5432)")
    }
}

#[tokio::test]
async fn test_store_fault_during_login_is_generic() {
    let db = Database::in_memory().await.unwrap();
    let app = common::test_app_with_store(db, Arc::new(BrokenStore));

    let (status, json) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "enisa", "password": "12345678" })),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("10.1.2.3"));
}

/// Store whose id lookups fail while everything else works.
struct LookupFailingStore {
    inner: UserRepository,
}

#[async_trait]
impl CredentialStore for LookupFailingStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_by_username(username).await
    }
    async fn find_by_id(&self, _id: &str) -> Result<Option<User>> {
        bail!("connection refused (10.1.2.3:5432)")
    }
    async fn create(&self, user: NewUser) -> Result<User> {
        self.inner.create(user).await
    }
    async fn update(&self, id: &str, changes: UserChanges) -> Result<Option<User>> {
        self.inner.update(id, changes).await
    }
    async fn delete(&self, id: &str) -> Result<bool> {
        self.inner.delete(id).await
    }
    async fn add_favorite(&self, id: &str, movie_id: &str) -> Result<Option<User>> {
        self.inner.add_favorite(id, movie_id).await
    }
    async fn remove_favorite(&self, id: &str, movie_id: &str) -> Result<Option<User>> {
        self.inner.remove_favorite(id, movie_id).await
    }
}

#[tokio::test]
async fn test_store_fault_during_identity_lookup_is_generic() {
    let db = Database::in_memory().await.unwrap();
    let store = LookupFailingStore {
        inner: UserRepository::new(db.pool().clone()),
    };
    let app = common::test_app_with_store(db, Arc::new(store));
    let (_, token) = app.signed_in("enisa").await;

    let (status, json) = app.send(Method::GET, "/movies", Some(&token), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    let message = json["error"].as_str().unwrap();
    assert!(!message.contains("10.1.2.3"));
    assert!(!message.contains("connection refused"));
}

// ============================================================================
// Movies
// ============================================================================

#[tokio::test]
async fn test_movie_catalog_routes() {
    let app = test_app().await;
    let (_, token) = app.signed_in("enisa").await;
    app.seed_movie("Vertigo", "Thriller", "Alfred Hitchcock").await;
    app.seed_movie("Jaws", "Thriller", "Steven Spielberg").await;

    let (status, json) = app.send(Method::GET, "/movies", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Jaws", "Vertigo"]);

    let (status, json) = app
        .send(Method::GET, "/movies/Jaws", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["director"]["name"], "Steven Spielberg");
    assert_eq!(json["genre"]["name"], "Thriller");

    let (status, json) = app
        .send(Method::GET, "/movies/Alien", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_genre_and_director_routes() {
    let app = test_app().await;
    let (_, token) = app.signed_in("enisa").await;
    app.seed_movie("Jaws", "Thriller", "Steven Spielberg").await;

    let (status, json) = app
        .send(Method::GET, "/movies/genre/thriller", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "name": "Thriller", "description": "Thriller films" }));

    let (status, json) = app
        .send(
            Method::GET,
            "/movies/director/steven%20spielberg",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Steven Spielberg");
    assert_eq!(json["birth_year"], "1946");

    let (status, _) = app
        .send(Method::GET, "/movies/genre/Western", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::GET, "/movies/director/Nobody", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Profiles and favorites
// ============================================================================

#[tokio::test]
async fn test_update_profile() {
    let app = test_app().await;
    let (id, token) = app.signed_in("enisa").await;
    app.register("taken_name", "12345678").await;

    let (status, json) = app
        .send(
            Method::PUT,
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({ "email": "new@x.com", "password": "a-longer-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "new@x.com");

    // The new password works and the old one no longer does.
    app.login("enisa", "a-longer-password").await;
    let (status, _) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "enisa", "password": "12345678" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app
        .send(
            Method::PUT,
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({ "username": "taken_name" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn test_favorites_lifecycle() {
    let app = test_app().await;
    let (id, token) = app.signed_in("enisa").await;
    let jaws = app.seed_movie("Jaws", "Thriller", "Steven Spielberg").await;
    let alien = app.seed_movie("Alien", "Sci-Fi", "Ridley Scott").await;

    let uri = |movie: &str| format!("/users/{id}/favorites/{movie}");

    let (status, json) = app.send(Method::POST, &uri(&jaws), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["favorites"], json!([jaws]));

    app.send(Method::POST, &uri(&alien), Some(&token), None).await;
    let (status, json) = app.send(Method::POST, &uri(&jaws), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["favorites"], json!([jaws, alien]));

    let (status, json) = app
        .send(Method::POST, &uri("mov_missing"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, json) = app
        .send(Method::DELETE, &uri(&jaws), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["favorites"], json!([alien]));

    let (status, json) = app
        .send(Method::DELETE, &uri(&jaws), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["favorites"], json!([alien]));

    let (status, json) = app
        .send(Method::GET, &format!("/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["favorites"], json!([alien]));
}

#[tokio::test]
async fn test_favorites_of_other_user_forbidden() {
    let app = test_app().await;
    let (_, token) = app.signed_in("enisa").await;
    let other_id = app.register("another", "12345678").await;
    let jaws = app.seed_movie("Jaws", "Thriller", "Steven Spielberg").await;

    let (status, json) = app
        .send(
            Method::POST,
            &format!("/users/{other_id}/favorites/{jaws}"),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_profile_of_other_user_forbidden() {
    let app = test_app().await;
    let (_, token) = app.signed_in("enisa").await;
    let other_id = app.register("another", "12345678").await;
    let uri = format!("/users/{other_id}");

    let (status, json) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "PERMISSION_DENIED");

    let (status, json) = app
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "email": "hijack@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "PERMISSION_DENIED");

    // The other account is untouched.
    let other_token = app.login("another", "12345678").await;
    let (status, json) = app.send(Method::GET, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(json["email"], "hijack@example.com");
}

#[tokio::test]
async fn test_birthday_can_be_cleared() {
    let app = test_app().await;
    let (id, token) = app.signed_in("enisa").await;
    let uri = format!("/users/{id}");

    let (status, json) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "birthday": "1995-03-08" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["birthday"], "1995-03-08");

    // Absent field keeps the value.
    let (_, json) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "email": "new@x.com" })))
        .await;
    assert_eq!(json["birthday"], "1995-03-08");

    let (status, json) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "birthday": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["birthday"].is_null());
}
