// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the gateway.

pub mod auth;

pub use auth::{bearer_token, require_bearer, Identity};
