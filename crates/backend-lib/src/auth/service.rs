// ============================
// backend-lib/src/auth/service.rs
// ============================
use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;

/// Input of [`AuthService::register`]
#[derive(Clone, Default)]
pub struct Registration {
    /// Login identifier, email or username
    pub identifier: String,
    pub password: String,
    /// Display name announced to the user service
    pub username: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Tokens handed out by a successful login
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// Credential and session lifecycle
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an identity and return its id
    async fn register(&self, registration: Registration) -> Result<Uuid, AppError>;

    /// Verify credentials and open a new session, superseding any previous one
    async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, AppError>;

    async fn validate_access_token(&self, token: &str) -> Result<Uuid, AppError>;

    /// Exchange the live refresh token for a new access token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError>;

    async fn update_password(&self, subject: Uuid, old_password: &str, new_password: &str) -> Result<(), AppError>;
}
