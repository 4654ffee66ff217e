//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, optional_auth_middleware, require_staff};
