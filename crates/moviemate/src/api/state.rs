//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::AuthState;
use crate::movie::MovieRepository;
use crate::user::{CredentialStore, UserService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication state.
    pub auth: AuthState,
    /// User service.
    pub users: UserService,
    /// Movie catalog.
    pub movies: MovieRepository,
}

impl AppState {
    /// Create new application state.
    pub fn new(auth: AuthState, store: Arc<dyn CredentialStore>, movies: MovieRepository) -> Self {
        Self {
            auth,
            users: UserService::new(store),
            movies,
        }
    }
}
