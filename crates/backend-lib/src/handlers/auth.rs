// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Credential and session endpoints.
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;

use authgate_common::{
    LoginRequest, RegisterRequest, RegisterResponse, UpdatePasswordRequest, ValidateTokenRequest,
    ValidateTokenResponse, REFRESH_COOKIE_NAME,
};

use crate::auth::Registration;
use crate::error::AppError;
use crate::middleware::auth::Identity;
use crate::AppState;

/// JSON body extractor whose rejections use the central error envelope
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Decode(rejection.body_text())),
        }
    }
}

/// `Set-Cookie` value carrying the refresh token
pub fn refresh_cookie(token: &str, max_age_secs: u64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = format!("{REFRESH_COOKIE_NAME}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.to_string()))
}

/// Value of cookie `name` across all `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `POST /auth/api/v1/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = state
        .auth
        .register(Registration {
            identifier: body.email,
            password: body.password,
            username: body.username,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// `POST /auth/api/v1/login`: access token in the body, refresh token as a cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth.login(&body.email, &body.password).await?;

    let auth = &state.settings.auth;
    let cookie = refresh_cookie(&pair.refresh_token, auth.refresh_ttl_secs, auth.cookie_secure)?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::OK, headers, pair.access_token))
}

/// `POST /auth/api/v1/validate-token`
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ValidateTokenRequest>,
) -> Result<Json<ValidateTokenResponse>, AppError> {
    let user_id = state.auth.validate_access_token(&body.access_token).await?;
    Ok(Json(ValidateTokenResponse { user_id }))
}

/// `POST /auth/api/v1/refresh-token`
pub async fn refresh_token(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<String, AppError> {
    let Some(token) = read_cookie(&headers, REFRESH_COOKIE_NAME) else {
        tracing::debug!("refresh requested without cookie");
        return Err(AppError::Unauthorized);
    };
    state.auth.refresh_access_token(&token).await
}

/// `POST /auth/api/v1/update-password`, behind the gatekeeper
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    JsonBody(body): JsonBody<UpdatePasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .update_password(identity.subject, &body.old_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
