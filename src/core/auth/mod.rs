pub mod auth_models;
pub mod auth_service;

pub use auth_models::{Session, SignedSession, User, ADMIN_ROLE};
pub use auth_service::{AuthError, AuthService, SessionSigner, UserStore};
