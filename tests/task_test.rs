mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_create_task_sets_creator_and_display_fields() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": "Landing page",
            "assigned_to": auth.user_id,
            "due_date": "2025-09-30"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["name"].as_str().unwrap(), "Landing page");
    assert_eq!(body["created_by"].as_str().unwrap(), auth.user_id.to_string());
    assert_eq!(body["project_name"].as_str().unwrap(), project.name);
    assert_eq!(body["assigned_to_username"].as_str().unwrap(), auth.username);
    assert_eq!(body["status"].as_str().unwrap(), "pending");
    assert_eq!(body["progress"].as_i64().unwrap(), 0);
    assert_eq!(body["due_date"].as_str().unwrap(), "2025-09-30");
}

#[tokio::test]
async fn test_regular_user_cannot_assign_task_to_someone_else() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": "Not mine",
            "assigned_to": other.user_id
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_can_assign_task_to_anyone() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let other = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": "Delegated",
            "assigned_to": other.user_id
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["assigned_to"].as_str().unwrap(), other.user_id.to_string());
}

#[tokio::test]
async fn test_create_task_duplicate_name_in_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;
    let task = factory.create_task(project.id, auth.user_id, None).await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": task.name
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_same_name_allowed_under_different_parent() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;
    let parent = factory.create_task(project.id, auth.user_id, None).await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": parent.name,
            "parent_task_id": parent.id
        }))
        .await;

    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_parent_must_be_in_same_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let parent = factory.create_task_for(auth.user_id).await;
    let other_project = factory.create_project().await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": other_project.id,
            "name": "Orphan",
            "parent_task_id": parent.id
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_out_of_range() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": "Overachiever",
            "progress": 150
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_tasks_only_returns_owned_rows() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let project = factory.create_project().await;

    let assigned = factory
        .create_task(project.id, other.user_id, Some(auth.user_id))
        .await;
    let created = factory.create_task(project.id, auth.user_id, None).await;
    factory
        .create_task(project.id, other.user_id, Some(other.user_id))
        .await;

    let response = app
        .server
        .get(&format!("/api/tasks?project_id={}", project.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(body["total"].as_u64().unwrap(), 2);
    assert!(ids.contains(&assigned.id.to_string().as_str()));
    assert!(ids.contains(&created.id.to_string().as_str()));
}

#[tokio::test]
async fn test_non_admin_assigned_to_filter_is_ignored() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let project = factory.create_project().await;
    factory
        .create_task(project.id, other.user_id, Some(other.user_id))
        .await;

    let response = app
        .server
        .get(&format!(
            "/api/tasks?project_id={}&assigned_to={}",
            project.id, other.user_id
        ))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total"].as_u64().unwrap(), 0);
}

#[tokio::test]
async fn test_admin_lists_all_tasks_with_filters() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let a = factory.create_user().await;
    let b = factory.create_user().await;
    let project = factory.create_project().await;
    factory.create_task(project.id, a.user_id, Some(a.user_id)).await;
    factory.create_task(project.id, b.user_id, Some(b.user_id)).await;

    let response = app
        .server
        .get(&format!("/api/tasks?project_id={}", project.id))
        .add_header("Authorization", admin.auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"].as_u64().unwrap(), 2);

    let response = app
        .server
        .get(&format!(
            "/api/tasks?project_id={}&assigned_to={}",
            project.id, a.user_id
        ))
        .add_header("Authorization", admin.auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"].as_u64().unwrap(), 1);
    assert_eq!(
        body["data"][0]["assigned_to"].as_str().unwrap(),
        a.user_id.to_string()
    );
}

#[tokio::test]
async fn test_get_foreign_task_is_not_found() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let task = factory.create_task_for(other.user_id).await;

    let response = app
        .server
        .get(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_own_task() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let task = factory.create_task_for(auth.user_id).await;

    let response = app
        .server
        .put(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "status": "in_progress",
            "progress": 40
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"].as_str().unwrap(), "in_progress");
    assert_eq!(body["progress"].as_i64().unwrap(), 40);
}

#[tokio::test]
async fn test_update_foreign_task_is_forbidden() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let task = factory.create_task_for(other.user_id).await;

    let response = app
        .server
        .put(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "progress": 100 }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_cannot_be_its_own_parent() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let task = factory.create_task_for(auth.user_id).await;

    let response = app
        .server
        .put(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "parent_task_id": task.id }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_task() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let task = factory.create_task_for(auth.user_id).await;

    app.server
        .delete(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", other.auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::OK);

    app.server
        .get(&format!("/api/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_tasks_offset_is_not_rounded_to_page() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;

    for name in ["Alpha", "Bravo", "Charlie", "Delta"] {
        app.server
            .post("/api/tasks")
            .add_header("Authorization", auth.auth_header())
            .json(&json!({ "project_id": project.id, "name": name }))
            .await
            .assert_status(StatusCode::OK);
    }

    let response = app
        .server
        .get(&format!("/api/tasks?project_id={}&limit=2&offset=1", project.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bravo", "Charlie"]);
    assert_eq!(body["offset"].as_u64().unwrap(), 1);
    assert_eq!(body["total"].as_u64().unwrap(), 4);
}

#[tokio::test]
async fn test_task_cannot_move_under_its_own_subtask() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project().await;
    let root = factory.create_task(project.id, auth.user_id, None).await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": "Child",
            "parent_task_id": root.id
        }))
        .await;
    response.assert_status(StatusCode::OK);
    let child: serde_json::Value = response.json();
    let child_id = child["id"].as_str().unwrap();

    let response = app
        .server
        .post("/api/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "project_id": project.id,
            "name": "Grandchild",
            "parent_task_id": child_id
        }))
        .await;
    response.assert_status(StatusCode::OK);
    let grandchild: serde_json::Value = response.json();
    let grandchild_id = grandchild["id"].as_str().unwrap();

    for parent in [child_id, grandchild_id] {
        app.server
            .put(&format!("/api/tasks/{}", root.id))
            .add_header("Authorization", auth.auth_header())
            .json(&json!({ "parent_task_id": parent }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
