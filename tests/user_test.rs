mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_admin_lists_users() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;

    let response = app
        .server
        .get("/api/users?limit=2")
        .add_header("Authorization", admin.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["total"].as_u64().unwrap() >= 1);
    assert!(body["data"].as_array().unwrap().len() <= 2);
    assert!(body["data"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn test_regular_user_cannot_list_users() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    app.server
        .get("/api/users")
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get(&format!("/api/users/{}", auth.user_id))
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_gets_user() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;

    let response = app
        .server
        .get(&format!("/api/users/{}", auth.user_id))
        .add_header("Authorization", admin.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["username"].as_str().unwrap(), auth.username);

    app.server
        .get(&format!("/api/users/{}", Uuid::new_v4()))
        .add_header("Authorization", admin.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_promotes_user() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;

    let response = app
        .server
        .put(&format!("/api/users/{}/role", auth.user_id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "role": "admin" }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["role"].as_str().unwrap(), "admin");
    assert_eq!(body["is_admin"].as_bool().unwrap(), true);
}

#[tokio::test]
async fn test_admin_cannot_demote_self() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;

    let response = app
        .server
        .put(&format!("/api/users/{}/role", admin.user_id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "role": "user" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_regular_user_cannot_change_roles() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .put(&format!("/api/users/{}/role", auth.user_id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "role": "admin" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}
