use std::collections::HashMap;

use axum::{extract::State, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{
    validate_optional, validate_required, AppJson, AppPath, AppQuery, PaginationParams,
};
use crate::middlewares::AuthUser;
use crate::models::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::repositories::{ProjectRepository, Repository, TaskRepository, UserRepository};
use crate::services::workflow::validate_progress;
use crate::services::{AccessPolicy, Operation};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub reporting_manager: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub due_date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub progress: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub reporting_manager: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub due_date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub progress: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListParams {
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    #[param(default = 0, minimum = 0)]
    pub offset: Option<i64>,
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    /// Admin only; ignored for other users
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_username: Option<String>,
    pub created_by: Option<Uuid>,
    pub reporting_manager: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub due_date: Option<Date>,
    pub status: TaskStatus,
    pub progress: i32,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TaskResponse {
    fn new(t: Task, projects: &HashMap<Uuid, String>, users: &HashMap<Uuid, String>) -> Self {
        Self {
            project_name: projects.get(&t.project_id).cloned(),
            assigned_to_username: t.assigned_to.and_then(|id| users.get(&id).cloned()),
            id: t.id,
            project_id: t.project_id,
            name: t.name,
            description: t.description,
            assigned_to: t.assigned_to,
            created_by: t.created_by,
            reporting_manager: t.reporting_manager,
            parent_task_id: t.parent_task_id,
            due_date: t.due_date,
            status: t.status,
            progress: t.progress,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListResponse {
    pub data: Vec<TaskResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Attach project names and assignee usernames
async fn to_responses(db: &DatabaseConnection, tasks: Vec<Task>) -> AppResult<Vec<TaskResponse>> {
    let projects = ProjectRepository::name_map(db, tasks.iter().map(|t| t.project_id)).await?;
    let users = UserRepository::username_map(db, tasks.iter().filter_map(|t| t.assigned_to)).await?;

    Ok(tasks
        .into_iter()
        .map(|t| TaskResponse::new(t, &projects, &users))
        .collect())
}

async fn to_response(db: &DatabaseConnection, task: Task) -> AppResult<TaskResponse> {
    let projects = ProjectRepository::name_map(db, [task.project_id]).await?;
    let users = UserRepository::username_map(db, task.assigned_to).await?;
    Ok(TaskResponse::new(task, &projects, &users))
}

// ============ Handlers ============

/// Create a new task
///
/// Non-admins can only assign the task to themselves or leave it unassigned.
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 200, description = "Task created successfully", body = TaskResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot assign tasks to other users"),
        (status = 409, description = "Task name already used in this project")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn create_task(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    let actor = user.actor();
    if payload.assigned_to.is_some() {
        AccessPolicy::resolve_owner(&actor, payload.assigned_to)?;
    }
    validate_required(&payload.name, "Name", 200)?;
    if let Some(progress) = payload.progress {
        validate_progress(progress)?;
    }

    let create_task = CreateTask {
        project_id: payload.project_id,
        name: payload.name,
        description: payload.description,
        assigned_to: payload.assigned_to,
        reporting_manager: payload.reporting_manager,
        parent_task_id: payload.parent_task_id,
        due_date: payload.due_date,
        status: payload.status,
        progress: payload.progress,
    };

    let task = TaskRepository::create(&state.db, actor.id, &create_task).await?;
    Ok(Json(to_response(&state.db, task).await?))
}

/// List tasks visible to the current user
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskListParams),
    responses(
        (status = 200, description = "List of tasks", body = TaskListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn list_tasks(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TaskListParams>,
) -> AppResult<Json<TaskListResponse>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let actor = user.actor();
    let filter = if actor.is_admin() {
        TaskFilter {
            owner_id: None,
            project_id: params.project_id,
            assigned_to: params.assigned_to,
            status: params.status,
        }
    } else {
        TaskFilter {
            owner_id: AccessPolicy::list_scope(&actor, None),
            project_id: params.project_id,
            assigned_to: None,
            status: params.status,
        }
    };

    let tasks = TaskRepository::list_filtered(&state.db, &filter, limit, offset).await?;
    let total = TaskRepository::count_filtered(&state.db, &filter).await?;

    Ok(Json(TaskListResponse {
        data: to_responses(&state.db, tasks).await?,
        total,
        limit,
        offset,
    }))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn get_task(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TaskResponse>> {
    let task = TaskRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure_readable(&user.actor(), &task, "Task")?;

    Ok(Json(to_response(&state.db, task).await?))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = TaskResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this task"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn update_task(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    let actor = user.actor();
    let task = TaskRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&actor, &task, Operation::Update, "Task")?;
    if payload.assigned_to.is_some() {
        AccessPolicy::resolve_owner(&actor, payload.assigned_to)?;
    }
    validate_optional(&payload.name, "Name", 200)?;
    if let Some(progress) = payload.progress {
        validate_progress(progress)?;
    }

    let update_task = UpdateTask {
        name: payload.name,
        description: payload.description,
        assigned_to: payload.assigned_to,
        reporting_manager: payload.reporting_manager,
        parent_task_id: payload.parent_task_id,
        due_date: payload.due_date,
        status: payload.status,
        progress: payload.progress,
    };

    let task = TaskRepository::update(&state.db, id, &update_task).await?;
    Ok(Json(to_response(&state.db, task).await?))
}

/// Delete a task and its subtasks
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this task"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn delete_task(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<()> {
    let task = TaskRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &task, Operation::Delete, "Task")?;

    TaskRepository::delete(&state.db, id).await?;
    Ok(())
}
