// ============================
// backend-lib/src/router.rs
// ============================
//! HTTP surface: public auth endpoints, gatekept endpoints and the proxied prefixes.
use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::handlers::{auth, proxy};
use crate::middleware::require_bearer;
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/auth/api/v1/register", post(auth::register))
        .route("/auth/api/v1/login", post(auth::login))
        .route("/auth/api/v1/validate-token", post(auth::validate_token))
        .route("/auth/api/v1/refresh-token", post(auth::refresh_token))
        .route("/health", get(auth::health));

    let mut protected = Router::new().route("/auth/api/v1/update-password", post(auth::update_password));
    for prefix in state.dispatcher.table().prefixes() {
        protected = protected.route(&format!("{prefix}{{*rest}}"), any(proxy::proxy));
    }
    let protected = protected.route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let request_timeout = state.settings.timeouts.request();

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
