mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_admin_publishes_notice() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;

    let response = app
        .server
        .post("/api/notices")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({
            "title": "Holiday schedule",
            "content": "The office is closed on the 25th."
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["title"].as_str().unwrap(), "Holiday schedule");
    assert_eq!(body["created_by"].as_str().unwrap(), admin.user_id.to_string());
    assert_eq!(body["created_by_username"].as_str().unwrap(), admin.username);
}

#[tokio::test]
async fn test_regular_user_cannot_publish_notice() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/notices")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "title": "Free pizza", "content": "Kitchen, noon" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_notice_requires_title() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;

    let response = app
        .server
        .post("/api/notices")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "title": "", "content": "Body" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_any_user_reads_notices() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;
    let notice = factory.create_notice(admin.user_id).await;

    let response = app
        .server
        .get(&format!("/api/notices/{}", notice.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["title"].as_str().unwrap(), notice.title);
    assert_eq!(body["created_by_username"].as_str().unwrap(), admin.username);

    let response = app
        .server
        .get("/api/notices?limit=5")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["total"].as_u64().unwrap() >= 1);
    assert!(body["data"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
async fn test_only_admin_edits_notices() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;
    let notice = factory.create_notice(admin.user_id).await;

    app.server
        .put(&format!("/api/notices/{}", notice.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "title": "Edited" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&format!("/api/notices/{}", notice.id))
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/notices/{}", notice.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "title": "Edited" }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["title"].as_str().unwrap(), "Edited");
    assert_eq!(body["content"].as_str().unwrap(), notice.content);

    app.server
        .delete(&format!("/api/notices/{}", notice.id))
        .add_header("Authorization", admin.auth_header())
        .await
        .assert_status(StatusCode::OK);

    app.server
        .get(&format!("/api/notices/{}", notice.id))
        .add_header("Authorization", admin.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
