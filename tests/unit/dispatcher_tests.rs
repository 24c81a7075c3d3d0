// ==============================
// tests/unit/dispatcher_tests.rs
// ==============================
//! Dispatcher against the real in-process services
use std::sync::Arc;

use axum::http::Method;
use backend_lib::{
    error::AppError,
    gateway::{default_table, Dispatcher, RequestContext},
    middleware::Identity,
    LocalServices,
};
use serde_json::json;
use uuid::Uuid;

use crate::test_utils::test_settings;

fn dispatcher() -> (Dispatcher, LocalServices) {
    let settings = test_settings();
    let services = LocalServices::new(&settings).unwrap();
    let dispatcher = Dispatcher::new(
        default_table(&settings.gateway),
        Arc::new(services.users.clone()),
        services.rooms.clone(),
        settings.timeouts.rpc(),
    );
    (dispatcher, services)
}

fn ctx(subject: Uuid, method: Method, path: &str) -> RequestContext {
    RequestContext {
        identity: Identity { subject },
        method,
        path: path.to_string(),
    }
}

#[tokio::test]
async fn test_create_room_is_owned_by_the_caller() {
    let (dispatcher, services) = dispatcher();
    let caller = Uuid::new_v4();
    let impostor = Uuid::new_v4();
    services.users.create_profile(caller, "alice".to_string());

    let body = json!({
        "user_uuid": impostor,
        "name": "lobby",
        "max_players": 4,
        "is_public": true
    });
    let room = dispatcher
        .dispatch(
            &ctx(caller, Method::POST, "/room/api/v1/rooms"),
            body.to_string().as_bytes(),
        )
        .await
        .unwrap();

    assert_eq!(room["owner_id"], caller.to_string());
    assert_eq!(room["owner_name"], "alice");
    assert_eq!(room["has_password"], false);
}

#[tokio::test]
async fn test_path_parameter_wins_over_body() {
    let (dispatcher, _) = dispatcher();
    let caller = Uuid::new_v4();

    let created = dispatcher
        .dispatch(
            &ctx(caller, Method::POST, "/room/api/v1/rooms"),
            br#"{"name":"one","max_players":2,"is_public":false}"#,
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let body = json!({ "id": Uuid::new_v4() });
    let fetched = dispatcher
        .dispatch(
            &ctx(caller, Method::GET, &format!("/room/api/v1/rooms/{id}")),
            body.to_string().as_bytes(),
        )
        .await
        .unwrap();
    assert_eq!(fetched["id"], id.as_str());
}

#[tokio::test]
async fn test_only_the_owner_deletes() {
    let (dispatcher, _) = dispatcher();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let created = dispatcher
        .dispatch(
            &ctx(owner, Method::POST, "/room/api/v1/rooms"),
            br#"{"name":"mine","max_players":2,"is_public":true}"#,
        )
        .await
        .unwrap();
    let path = format!("/room/api/v1/rooms/{}", created["id"].as_str().unwrap());

    // Claiming to be the owner in the body does not help
    let body = json!({ "user_uuid": owner });
    let err = dispatcher
        .dispatch(&ctx(other, Method::DELETE, &path), body.to_string().as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let deleted = dispatcher
        .dispatch(&ctx(owner, Method::DELETE, &path), b"")
        .await
        .unwrap();
    assert_eq!(deleted["id"], created["id"]);

    let err = dispatcher
        .dispatch(&ctx(owner, Method::GET, &path), b"")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_bad_bodies_and_ids() {
    let (dispatcher, _) = dispatcher();
    let caller = Uuid::new_v4();

    let err = dispatcher
        .dispatch(&ctx(caller, Method::POST, "/room/api/v1/rooms"), b"[1,2]")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));

    let err = dispatcher
        .dispatch(&ctx(caller, Method::POST, "/room/api/v1/rooms"), b"{not json")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));

    let err = dispatcher
        .dispatch(&ctx(caller, Method::GET, "/room/api/v1/rooms/not-a-uuid"), b"")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));

    let err = dispatcher
        .dispatch(
            &ctx(caller, Method::POST, "/room/api/v1/rooms"),
            br#"{"name":"x","max_players":99,"is_public":true}"#,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_unregistered_user_has_no_profile() {
    let (dispatcher, _) = dispatcher();
    let err = dispatcher
        .dispatch(&ctx(Uuid::new_v4(), Method::GET, "/user/api/v1/me"), b"")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
