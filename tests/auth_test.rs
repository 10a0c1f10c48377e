mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{Factory, TestApp, TEST_PASSWORD};

fn unique_username() -> String {
    format!("user_{}", Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::new().await;
    let username = unique_username();

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": &username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "first_name": "Ada"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["user"]["username"].as_str().unwrap(), username);
    assert_eq!(body["user"]["first_name"].as_str().unwrap(), "Ada");
    assert_eq!(body["user"]["role"].as_str().unwrap(), "user");
    assert_eq!(body["user"]["is_admin"].as_bool().unwrap(), false);
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": auth.username,
            "email": format!("other-{}@example.com", Uuid::new_v4()),
            "password": "password123"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_short_password() {
    let app = TestApp::new().await;
    let username = unique_username();

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": &username,
            "email": format!("{}@example.com", username),
            "password": "short"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("at least 8 characters"));
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": unique_username(),
            "email": "not-an-email",
            "password": "password123"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_malformed_body() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "missing-fields" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"].as_str().unwrap(), "Validation error");
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({
            "username": &auth.username,
            "password": TEST_PASSWORD
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["access_token"].as_str().is_some());
    assert_eq!(body["user"]["id"].as_str().unwrap(), auth.user_id.to_string());
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({
            "username": auth.username,
            "password": "wrongpassword"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({
            "username": unique_username(),
            "password": "password123"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["username"].as_str().unwrap(), auth.username);
}

#[tokio::test]
async fn test_me_without_token() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/auth/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_authenticate_requests() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header("Authorization", format!("Bearer {}", auth.refresh_token))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": auth.refresh_token }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    let access_token = body["access_token"].as_str().unwrap();

    app.server
        .get("/api/auth/me")
        .add_header("Authorization", format!("Bearer {}", access_token))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": auth.token }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_stops_working_after_logout() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    app.server
        .post("/api/auth/logout")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "refresh_token": &auth.refresh_token }))
        .await
        .assert_status(StatusCode::OK);

    let response = app
        .server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": &auth.refresh_token }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_someone_elses_refresh_token() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;

    let response = app
        .server
        .post("/api/auth/logout")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "refresh_token": other.refresh_token }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_me() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .put("/api/users/me")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "first_name": "Grace",
            "last_name": "Hopper"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["first_name"].as_str().unwrap(), "Grace");
    assert_eq!(body["last_name"].as_str().unwrap(), "Hopper");
    assert_eq!(body["email"].as_str().unwrap(), auth.email);
}

#[tokio::test]
async fn test_update_me_email_conflict() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;

    let response = app
        .server
        .put("/api/users/me")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "email": other.email }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"].as_str().unwrap(), "ok");
}
