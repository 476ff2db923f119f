//! User management module.
//!
//! Credential records, their storage, and profile/favorites operations.

mod models;
mod repository;
mod service;
mod store;

pub use models::{
    BIRTHDAY_FORMAT, CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges, UserInfo,
};
pub use repository::UserRepository;
pub use service::UserService;
pub use store::CredentialStore;
