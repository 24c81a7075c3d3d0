// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use axum::{http::StatusCode, response::IntoResponse};
use backend_lib::{error::AppError, rpc::RpcError, storage::StoreError};

use crate::test_utils::read_json;

#[test]
fn test_status_and_codes() {
    let cases = [
        (AppError::Validation("x".into()), StatusCode::BAD_REQUEST, "VAL_001"),
        (AppError::Decode("x".into()), StatusCode::BAD_REQUEST, "VAL_002"),
        (AppError::UserExists, StatusCode::BAD_REQUEST, "AUTH_004"),
        (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED, "AUTH_002"),
        (AppError::InvalidOldPassword, StatusCode::UNAUTHORIZED, "AUTH_005"),
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "AUTH_001"),
        (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "AUTH_006"),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NF_001"),
        (AppError::RouteNotFound("/x".into()), StatusCode::NOT_FOUND, "ROUTE_001"),
        (
            AppError::MethodNotAllowed {
                method: "PUT".into(),
                path: "/x".into(),
            },
            StatusCode::METHOD_NOT_ALLOWED,
            "ROUTE_002",
        ),
        (AppError::Timeout("store"), StatusCode::INTERNAL_SERVER_ERROR, "INT_007"),
        (
            AppError::Store(StoreError::Unavailable("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
            "INT_003",
        ),
    ];

    for (err, status, code) in cases {
        assert_eq!(err.status_code(), status, "{err}");
        assert_eq!(err.error_code(), code, "{err}");
    }
}

#[test]
fn test_rpc_errors_keep_their_meaning() {
    assert!(matches!(
        AppError::from(RpcError::NotFound("room".into())),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        AppError::from(RpcError::InvalidArgument("bad".into())),
        AppError::Validation(_)
    ));
    assert!(matches!(
        AppError::from(RpcError::PermissionDenied("no".into())),
        AppError::Forbidden(_)
    ));
    assert_eq!(
        AppError::from(RpcError::Unavailable("down".into())).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_server_errors_hide_internals() {
    let response = AppError::Store(StoreError::Unavailable("db at 10.0.0.7 refused".into())).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "INT_003");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("10.0.0.7"));
}

#[tokio::test]
async fn test_auth_failures_are_uninformative() {
    let wrong_password = read_json(AppError::InvalidCredentials.into_response()).await;
    let old_password = read_json(AppError::InvalidOldPassword.into_response()).await;
    assert_eq!(wrong_password["error"]["message"], old_password["error"]["message"]);

    let validation = read_json(AppError::Validation("email must be provided".into()).into_response()).await;
    assert!(validation["error"]["message"]
        .as_str()
        .unwrap()
        .contains("email must be provided"));
}
