// ======================================
// tests/integration/auth_flow_tests.rs
// ======================================
//! Credential and session flows over HTTP
use axum::http::{header::SET_COOKIE, StatusCode};
use serde_json::json;

use crate::test_utils::{error_code, read_json, read_text, refresh_cookie_pair, TestApp};

async fn validate(app: &TestApp, token: &str) -> Option<String> {
    let response = app
        .post_json("/auth/api/v1/validate-token", json!({ "accessToken": token }))
        .await;
    if response.status() != StatusCode::OK {
        return None;
    }
    read_json(response).await["userId"].as_str().map(str::to_string)
}

async fn refresh(app: &TestApp, cookie: &str) -> axum::response::Response {
    app.request("POST", "/auth/api/v1/refresh-token", None, None, Some(cookie))
        .await
}

#[tokio::test]
async fn test_register_login_refresh_and_relogin() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/auth/api/v1/register",
            json!({ "email": "a@x.com", "password": "pw123", "username": "alice" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = read_json(response).await["userId"].as_str().unwrap().to_string();

    let response = app
        .post_json("/auth/api/v1/login", json!({ "email": "a@x.com", "password": "pw123" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("refresh_token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(set_cookie.contains("Path=/"));
    let r1 = refresh_cookie_pair(&response).unwrap();
    let t1 = read_text(response).await;

    assert_eq!(validate(&app, &t1).await.as_deref(), Some(user_id.as_str()));

    let response = refresh(&app, &r1).await;
    assert_eq!(response.status(), StatusCode::OK);
    let t2 = read_text(response).await;
    assert_ne!(t1, t2);
    assert_eq!(validate(&app, &t2).await.as_deref(), Some(user_id.as_str()));
    assert_eq!(validate(&app, &t1).await.as_deref(), Some(user_id.as_str()));

    // A second login starts a new session and retires R1
    let (_, r2) = app.login("a@x.com", "pw123").await;
    assert_ne!(r1, r2);

    let response = refresh(&app, &r1).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(refresh(&app, &r2).await.status(), StatusCode::OK);

    app.shutdown().await;
}

#[tokio::test]
async fn test_login_failures_look_alike() {
    let app = TestApp::spawn();
    app.sign_up("a@x.com", "pw123", "alice").await;

    let wrong_password = app
        .post_json("/auth/api/v1/login", json!({ "email": "a@x.com", "password": "nope" }))
        .await;
    let unknown_user = app
        .post_json("/auth/api/v1/login", json!({ "email": "b@x.com", "password": "pw123" }))
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(wrong_password).await, read_json(unknown_user).await);

    app.shutdown().await;
}

#[tokio::test]
async fn test_registration_rules() {
    let app = TestApp::spawn();
    app.sign_up("a@x.com", "pw123", "alice").await;

    // Identifiers are compared after trimming and lowercasing
    let response = app
        .post_json("/auth/api/v1/register", json!({ "email": " A@X.com ", "password": "other" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "AUTH_004");
    app.login("A@x.COM", "pw123").await;

    let response = app
        .post_json("/auth/api/v1/register", json!({ "email": "", "password": "pw" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "VAL_001");

    let response = app
        .post_json("/auth/api/v1/register", json!({ "email": "c@x.com", "password": "" }))
        .await;
    assert_eq!(error_code(response).await, "VAL_001");

    let response = app
        .request("POST", "/auth/api/v1/register", None, None, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "VAL_002");

    app.shutdown().await;
}

#[tokio::test]
async fn test_refresh_and_validate_rejections() {
    let app = TestApp::spawn();

    let response = app
        .request("POST", "/auth/api/v1/refresh-token", None, None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = refresh(&app, "refresh_token=garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(validate(&app, "garbage").await, None);

    // An access token is not a refresh token
    let (access, _) = {
        app.sign_up("a@x.com", "pw123", "alice").await;
        app.login("a@x.com", "pw123").await
    };
    let response = refresh(&app, &format!("refresh_token={access}")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.shutdown().await;
}

#[tokio::test]
async fn test_update_password() {
    let app = TestApp::spawn();
    let (_, access, _) = app.sign_up("a@x.com", "pw123", "alice").await;
    app.sign_up("b@x.com", "pw123", "bob").await;

    let response = app
        .request(
            "POST",
            "/auth/api/v1/update-password",
            Some(json!({ "old_password": "wrong", "new_password": "next" })),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, "AUTH_005");

    let response = app
        .request(
            "POST",
            "/auth/api/v1/update-password",
            Some(json!({ "old_password": "pw123", "new_password": "next" })),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let old = app
        .post_json("/auth/api/v1/login", json!({ "email": "a@x.com", "password": "pw123" }))
        .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    app.login("a@x.com", "next").await;

    // Other records are untouched
    app.login("b@x.com", "pw123").await;

    app.shutdown().await;
}

#[tokio::test]
async fn test_overlong_password_is_refused() {
    let app = TestApp::spawn();
    let long = format!("{}REAL-SECRET", "a".repeat(72));

    let response = app
        .post_json("/auth/api/v1/register", json!({ "email": "a@x.com", "password": long }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "VAL_001");

    // Nothing was stored, so a look-alike cannot log in either
    let forged = format!("{}totally-different", "a".repeat(72));
    let response = app
        .post_json("/auth/api/v1/login", json!({ "email": "a@x.com", "password": forged }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.shutdown().await;
}
