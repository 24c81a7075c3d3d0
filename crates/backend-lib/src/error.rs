// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use std::future::Future;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::session::CacheError;
use crate::auth::token::TokenError;
use crate::events::EventError;
use crate::rpc::RpcError;
use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Malformed request body: {0}")]
    Decode(String),

    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid old password")]
    InvalidOldPassword,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("Password hashing error: {0}")]
    Password(PasswordError),

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Event bus error: {0}")]
    Event(#[from] EventError),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Decode(_) | AppError::UserExists => {
                StatusCode::BAD_REQUEST
            },
            AppError::InvalidCredentials
            | AppError::InvalidOldPassword
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::Decode(_) => "VAL_002",
            AppError::Unauthorized => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::UserExists => "AUTH_004",
            AppError::InvalidOldPassword => "AUTH_005",
            AppError::Forbidden(_) => "AUTH_006",
            AppError::NotFound(_) => "NF_001",
            AppError::RouteNotFound(_) => "ROUTE_001",
            AppError::MethodNotAllowed { .. } => "ROUTE_002",
            AppError::Internal(_) => "INT_001",
            AppError::Password(_) => "INT_002",
            AppError::Store(_) => "INT_003",
            AppError::Cache(_) => "INT_004",
            AppError::Event(_) => "INT_005",
            AppError::Upstream(_) => "INT_006",
            AppError::Timeout(_) => "INT_007",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::InvalidCredentials | AppError::InvalidOldPassword => {
                "Authentication failed".to_string()
            },
            AppError::Forbidden(_) => "Forbidden".to_string(),
            AppError::UserExists => "User already exists".to_string(),
            AppError::Validation(_) | AppError::Decode(_) => "Invalid input provided".to_string(),
            AppError::NotFound(_) | AppError::RouteNotFound(_) => "Resource not found".to_string(),
            AppError::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            _ => "An internal server error occurred".to_string(),
        }
    }

    /// Whether the detailed message may be shown to the caller.
    ///
    /// Only user-correctable errors qualify: auth failures stay uninformative
    /// and infrastructure failures never expose internals.
    fn is_client_correctable(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Decode(_)
                | AppError::NotFound(_)
                | AppError::RouteNotFound(_)
                | AppError::MethodNotAllowed { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        let message = if self.is_client_correctable() {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        // Create a JSON response with error details
        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Await `fut` for at most `limit`, converting both failure kinds into [`AppError`]
pub async fn bounded<T, E, F>(limit: Duration, what: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(target_call = what, ?limit, "call timed out");
            Err(AppError::Timeout(what))
        },
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AppError::Unauthorized,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooLong { .. } => AppError::Validation(err.to_string()),
            other => AppError::Password(other),
        }
    }
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::NotFound(what) => AppError::NotFound(what),
            RpcError::InvalidArgument(msg) => AppError::Validation(msg),
            RpcError::PermissionDenied(msg) => AppError::Forbidden(msg),
            RpcError::Unavailable(msg) | RpcError::Internal(msg) => AppError::Upstream(msg),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
