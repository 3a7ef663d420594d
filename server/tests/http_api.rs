//! Router-level tests for the register/login/version flow.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use playgate_server::handlers::AppState;
use playgate_server::routes;
use playgate_store::{Database, UserRepository, VersionRepository};

async fn test_app() -> (Router, AppState) {
    let db = Database::open_in_memory().await.unwrap();
    db.init().await.unwrap();
    let state = AppState {
        users: UserRepository::new(db.clone()),
        versions: VersionRepository::new(db),
    };
    (routes::router(state.clone()), state)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, path: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_index() {
    let (app, _state) = test_app().await;
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"API is running");
}

#[tokio::test]
async fn test_register_login_version_flow() {
    let (app, _state) = test_app().await;

    let (status, body) = post_json(
        &app,
        "/register",
        json!({"username": "bob", "password": "hunter2", "crystal": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let user_id = body["user_id"].as_i64().unwrap();
    assert!(user_id > 0);

    let (status, body) = post_json(
        &app,
        "/login",
        json!({"username": "bob", "password": "hunter2"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["user_id"].as_i64().unwrap(), user_id);
    assert_eq!(body["is_subscription"], false);
    assert_eq!(body["crystal"], 5);

    let (status, body) = get(&app, "/version").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"]["version_number"], "1.0.0");
    assert_eq!(body["version"]["version_name"], "Initial Release");
    assert_eq!(body["version"]["is_active"], true);
    // Serialized timestamps are ISO-8601, and the hash never leaks.
    assert!(body["version"]["release_date"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _state) = test_app().await;
    post_json(
        &app,
        "/register",
        json!({"username": "bob", "password": "hunter2"}),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/login",
        json!({"username": "bob", "password": "wrongpw"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "wrong password");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let (app, _state) = test_app().await;
    let (status, body) = post_json(
        &app,
        "/login",
        json!({"username": "nobody", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "user not found");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (app, _state) = test_app().await;
    let (status, _) = post_json(
        &app,
        "/register",
        json!({"username": "bob", "password": "hunter2"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app,
        "/register",
        json!({"username": "bob", "password": "other"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "User exists");
}

#[tokio::test]
async fn test_version_not_found_when_no_active_release() {
    let (app, state) = test_app().await;
    // Empty the seeded catalog through the repository.
    let seeded = state.versions.get_latest_active().await.unwrap().unwrap();
    assert!(state.versions.delete(seeded.id).await.unwrap());

    let (status, body) = get(&app, "/version").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "No active version found");
}

#[tokio::test]
async fn test_login_response_never_contains_password_hash() {
    let (app, _state) = test_app().await;
    post_json(
        &app,
        "/register",
        json!({"username": "bob", "password": "hunter2"}),
    )
    .await;
    let (_, body) = post_json(
        &app,
        "/login",
        json!({"username": "bob", "password": "hunter2"}),
    )
    .await;
    assert!(body.get("password_hash").is_none());
}
