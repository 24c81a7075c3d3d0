// =========================================
// tests/integration/gateway_flow_tests.rs
// =========================================
//! Authenticated requests translated into user and room service calls
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::test_utils::{error_code, read_json, wait_until, TestApp};

/// Sign up and wait for the registration event to create the profile
async fn member(app: &TestApp, email: &str, username: &str) -> (Uuid, String) {
    let (user_id, access, _) = app.sign_up(email, "pw123", username).await;
    let user_id: Uuid = user_id.parse().unwrap();
    assert!(wait_until(|| app.services.users.contains(user_id)).await);
    (user_id, access)
}

async fn call(app: &TestApp, method: &str, uri: &str, body: Option<Value>, token: &str) -> (StatusCode, Value) {
    let response = app.request(method, uri, body, Some(token), None).await;
    let status = response.status();
    (status, read_json(response).await)
}

#[tokio::test]
async fn test_profile_and_client_params() {
    let app = TestApp::spawn();
    let (user_id, token) = member(&app, "a@x.com", "alice").await;

    let (status, me) = call(&app, "GET", "/user/api/v1/me", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id.to_string());
    assert_eq!(me["username"], "alice");

    let (status, params) = call(&app, "GET", "/user/api/v1/params", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(params["lang_code"], "en");
    assert_eq!(params["sound_volume"], 50);

    // Writes land on the caller, whatever user_uuid the body names
    let other = Uuid::new_v4();
    let (status, params) = call(
        &app,
        "PATCH",
        "/user/api/v1/params",
        Some(json!({ "user_uuid": other, "lang_code": "fr", "sound_volume": 80 })),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(params["user_uuid"], user_id.to_string());
    assert_eq!(params["lang_code"], "fr");
    assert_eq!(params["sound_volume"], 80);
    assert_eq!(params["is_game_sound_enabled"], true);

    let (status, body) = call(
        &app,
        "PATCH",
        "/user/api/v1/params",
        Some(json!({ "lang_code": "french" })),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    app.shutdown().await;
}

#[tokio::test]
async fn test_room_lifecycle() {
    let app = TestApp::spawn();
    let (alice, alice_token) = member(&app, "a@x.com", "alice").await;
    let (_, bob_token) = member(&app, "b@x.com", "bob").await;

    let (status, room) = call(
        &app,
        "POST",
        "/room/api/v1/rooms",
        Some(json!({ "name": "Friday Night", "password": "letmein", "max_players": 4, "is_public": true })),
        &alice_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["owner_id"], alice.to_string());
    assert_eq!(room["owner_name"], "alice");
    assert_eq!(room["has_password"], true);
    assert!(room.get("password").is_none());
    let room_path = format!("/room/api/v1/rooms/{}", room["id"].as_str().unwrap());

    let (_, private) = call(
        &app,
        "POST",
        "/room/api/v1/rooms",
        Some(json!({ "name": "friday secret", "max_players": 2, "is_public": false })),
        &alice_token,
    )
    .await;
    assert_eq!(private["is_public"], false);

    let (status, found) = call(
        &app,
        "POST",
        "/room/api/v1/rooms/search",
        Some(json!({ "search": "  FRIDAY " })),
        &bob_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["total"], 1);
    assert_eq!(found["rooms"][0]["name"], "Friday Night");

    let (status, fetched) = call(&app, "GET", &room_path, None, &bob_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], room["id"]);

    let (status, body) = call(&app, "DELETE", &room_path, None, &bob_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTH_006");

    let (status, _) = call(&app, "DELETE", &room_path, None, &alice_token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "GET", &room_path, None, &alice_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NF_001");

    app.shutdown().await;
}

#[tokio::test]
async fn test_proxy_rejections() {
    let app = TestApp::spawn();
    let (_, token) = member(&app, "a@x.com", "alice").await;

    let response = app.request("GET", "/user/api/v1/me", None, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, "AUTH_001");

    let (status, body) = call(&app, "GET", "/room/api/v1/rooms/search", None, &token).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "ROUTE_002");

    let (status, body) = call(&app, "GET", "/room/api/v1/lobbies", None, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ROUTE_001");

    let (status, body) = call(&app, "POST", "/room/api/v1/rooms", Some(json!([1, 2, 3])), &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_002");

    app.shutdown().await;
}
