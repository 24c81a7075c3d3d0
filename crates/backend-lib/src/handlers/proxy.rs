// ============================
// crates/backend-lib/src/handlers/proxy.rs
// ============================
//! Catch-all handler forwarding authenticated requests to the dispatcher.
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, Uri},
    Json,
};
use serde_json::Value;

use crate::error::AppError;
use crate::gateway::RequestContext;
use crate::middleware::auth::Identity;
use crate::AppState;

/// Any method under a proxied prefix
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let ctx = RequestContext {
        identity,
        method,
        path: uri.path().to_string(),
    };
    let response = state.dispatcher.dispatch(&ctx, &body).await?;
    Ok(Json(response))
}
