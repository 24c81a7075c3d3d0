// crates/backend-lib/src/middleware/auth.rs

//! Bearer-token gatekeeper.
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::AppError, AppState};

/// Verified caller, attached to the request by [`require_bearer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub subject: Uuid,
}

/// Token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject requests without a valid access token, annotate the rest with their [`Identity`]
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        tracing::debug!(path = %request.uri().path(), "missing bearer token");
        return Err(AppError::Unauthorized);
    };

    let subject = state.auth.validate_access_token(&token).await.map_err(|err| {
        tracing::debug!(path = %request.uri().path(), "bearer token rejected");
        err
    })?;

    request.extensions_mut().insert(Identity { subject });
    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}
