mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_admin_creates_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let name = format!("Website {}", Uuid::new_v4());

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({
            "name": &name,
            "description": "Company website relaunch"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["name"].as_str().unwrap(), name);
    assert_eq!(
        body["description"].as_str().unwrap(),
        "Company website relaunch"
    );
}

#[tokio::test]
async fn test_regular_user_cannot_create_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "name": format!("Mine {}", Uuid::new_v4()) }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_project_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/projects")
        .json(&json!({ "name": "My Project" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_project_duplicate_name() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "name": project.name }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_project_blank_name() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "name": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_any_user_can_read_projects() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .get(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["id"].as_str().unwrap(), project.id.to_string());
}

fn project_names(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_projects_pagination() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    for _ in 0..4 {
        factory.create_project().await;
    }

    // Other tests add projects concurrently, so compare two snapshots taken
    // back to back and retry if a write landed in between
    let mut matched = false;
    for _ in 0..5 {
        let head = app
            .server
            .get("/api/projects?limit=3&offset=0")
            .add_header("Authorization", auth.auth_header())
            .await;
        let page = app
            .server
            .get("/api/projects?limit=2&offset=1")
            .add_header("Authorization", auth.auth_header())
            .await;
        page.assert_status(StatusCode::OK);

        let page_body: serde_json::Value = page.json();
        assert_eq!(page_body["data"].as_array().unwrap().len(), 2);
        assert_eq!(page_body["limit"].as_u64().unwrap(), 2);
        assert_eq!(page_body["offset"].as_u64().unwrap(), 1);
        assert!(page_body["total"].as_u64().unwrap() >= 4);

        let head_body: serde_json::Value = head.json();
        if project_names(&page_body) == project_names(&head_body)[1..3] {
            matched = true;
            break;
        }
    }
    assert!(matched, "offset=1 page should start at the second project");
}

#[tokio::test]
async fn test_list_projects_limit_is_clamped() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get("/api/projects?limit=1000")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["limit"].as_u64().unwrap(), 100);
}

#[tokio::test]
async fn test_list_projects_invalid_query() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get("/api/projects?limit=abc")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_project_not_found() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get(&format!("/api/projects/{}", Uuid::new_v4()))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_project_invalid_id() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get("/api/projects/not-a-uuid")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .put(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "description": "Updated description" }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["name"].as_str().unwrap(), project.name);
    assert_eq!(body["description"].as_str().unwrap(), "Updated description");
}

#[tokio::test]
async fn test_regular_user_cannot_update_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .put(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "name": "Hijacked" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_project_cascades_to_tasks() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let project = factory.create_project().await;
    let task = factory
        .create_task(project.id, admin.user_id, None)
        .await;

    app.server
        .delete(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", admin.auth_header())
        .await
        .assert_status(StatusCode::OK);

    app.server
        .get(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", admin.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regular_user_cannot_delete_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .delete(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}
