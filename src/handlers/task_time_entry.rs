use std::collections::HashMap;

use axum::{extract::State, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{AppJson, AppPath, AppQuery, PaginationParams};
use crate::middlewares::AuthUser;
use crate::models::{CreateTaskTimeEntry, TaskTimeEntry, TaskTimeEntryFilter, UpdateTaskTimeEntry};
use crate::repositories::{
    Repository, TaskRepository, TaskSummary, TaskTimeEntryRepository, UserRepository,
};
use crate::services::{AccessPolicy, Operation};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskTimeEntryRequest {
    /// Defaults to the current user; only admins may name someone else
    pub user_id: Option<Uuid>,
    pub task_id: Uuid,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskTimeEntryRequest {
    pub task_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[schema(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskTimeEntryListParams {
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    #[param(default = 0, minimum = 0)]
    pub offset: Option<i64>,
    /// Admin only; ignored for other users
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    /// Entries starting at or after this instant (RFC 3339)
    #[param(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time_gte: Option<OffsetDateTime>,
    /// Entries ending at or before this instant (RFC 3339)
    #[param(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time_lte: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskTimeEntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_username: Option<String>,
    pub task_id: Uuid,
    pub task_name: Option<String>,
    pub project_name: Option<String>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub duration_minutes: f64,
    pub duration_hours: f64,
    pub description: Option<String>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TaskTimeEntryResponse {
    fn new(
        e: TaskTimeEntry,
        users: &HashMap<Uuid, String>,
        tasks: &HashMap<Uuid, TaskSummary>,
    ) -> Self {
        let task = tasks.get(&e.task_id);
        Self {
            user_username: users.get(&e.user_id).cloned(),
            task_name: task.map(|t| t.name.clone()),
            project_name: task.map(|t| t.project_name.clone()),
            duration_minutes: e.duration_minutes(),
            duration_hours: e.duration_hours(),
            id: e.id,
            user_id: e.user_id,
            task_id: e.task_id,
            start_time: e.start_time,
            end_time: e.end_time,
            description: e.description,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskTimeEntryListResponse {
    pub data: Vec<TaskTimeEntryResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

async fn to_responses(
    db: &DatabaseConnection,
    entries: Vec<TaskTimeEntry>,
) -> AppResult<Vec<TaskTimeEntryResponse>> {
    let users = UserRepository::username_map(db, entries.iter().map(|e| e.user_id)).await?;
    let tasks = TaskRepository::summaries(db, entries.iter().map(|e| e.task_id)).await?;

    Ok(entries
        .into_iter()
        .map(|e| TaskTimeEntryResponse::new(e, &users, &tasks))
        .collect())
}

async fn to_response(
    db: &DatabaseConnection,
    entry: TaskTimeEntry,
) -> AppResult<TaskTimeEntryResponse> {
    let users = UserRepository::username_map(db, [entry.user_id]).await?;
    let tasks = TaskRepository::summaries(db, [entry.task_id]).await?;
    Ok(TaskTimeEntryResponse::new(entry, &users, &tasks))
}

// ============ Handlers ============

/// Record time spent on a task
#[utoipa::path(
    post,
    path = "/api/task-time-entries",
    request_body = CreateTaskTimeEntryRequest,
    responses(
        (status = 200, description = "Time entry created", body = TaskTimeEntryResponse),
        (status = 400, description = "Validation error (end time must be after start time)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot create entries for other users")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task Time Entries"
)]
pub async fn create_task_time_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTaskTimeEntryRequest>,
) -> AppResult<Json<TaskTimeEntryResponse>> {
    let user_id = AccessPolicy::resolve_owner(&user.actor(), payload.user_id)?;

    let create_entry = CreateTaskTimeEntry {
        user_id,
        task_id: payload.task_id,
        start_time: payload.start_time,
        end_time: payload.end_time,
        description: payload.description,
    };

    let entry = TaskTimeEntryRepository::create(&state.db, &create_entry).await?;
    Ok(Json(to_response(&state.db, entry).await?))
}

/// List time entries visible to the current user
#[utoipa::path(
    get,
    path = "/api/task-time-entries",
    params(TaskTimeEntryListParams),
    responses(
        (status = 200, description = "List of time entries", body = TaskTimeEntryListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task Time Entries"
)]
pub async fn list_task_time_entries(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TaskTimeEntryListParams>,
) -> AppResult<Json<TaskTimeEntryListResponse>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let filter = TaskTimeEntryFilter {
        user_id: AccessPolicy::list_scope(&user.actor(), params.user_id),
        task_id: params.task_id,
        project_id: params.project_id,
        start_time_gte: params.start_time_gte,
        end_time_lte: params.end_time_lte,
    };

    let entries = TaskTimeEntryRepository::list_filtered(&state.db, &filter, limit, offset).await?;
    let total = TaskTimeEntryRepository::count_filtered(&state.db, &filter).await?;

    Ok(Json(TaskTimeEntryListResponse {
        data: to_responses(&state.db, entries).await?,
        total,
        limit,
        offset,
    }))
}

/// Get a time entry by ID
#[utoipa::path(
    get,
    path = "/api/task-time-entries/{id}",
    params(
        ("id" = Uuid, Path, description = "Time entry ID")
    ),
    responses(
        (status = 200, description = "Time entry details", body = TaskTimeEntryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Time entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task Time Entries"
)]
pub async fn get_task_time_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TaskTimeEntryResponse>> {
    let entry = TaskTimeEntryRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure_readable(&user.actor(), &entry, "Task time entry")?;

    Ok(Json(to_response(&state.db, entry).await?))
}

/// Update a time entry
#[utoipa::path(
    put,
    path = "/api/task-time-entries/{id}",
    params(
        ("id" = Uuid, Path, description = "Time entry ID")
    ),
    request_body = UpdateTaskTimeEntryRequest,
    responses(
        (status = 200, description = "Time entry updated", body = TaskTimeEntryResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this entry"),
        (status = 404, description = "Time entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task Time Entries"
)]
pub async fn update_task_time_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskTimeEntryRequest>,
) -> AppResult<Json<TaskTimeEntryResponse>> {
    let entry = TaskTimeEntryRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &entry, Operation::Update, "Task time entry")?;

    let update_entry = UpdateTaskTimeEntry {
        task_id: payload.task_id,
        start_time: payload.start_time,
        end_time: payload.end_time,
        description: payload.description,
    };

    let entry = TaskTimeEntryRepository::update(&state.db, id, &update_entry).await?;
    Ok(Json(to_response(&state.db, entry).await?))
}

/// Delete a time entry
#[utoipa::path(
    delete,
    path = "/api/task-time-entries/{id}",
    params(
        ("id" = Uuid, Path, description = "Time entry ID")
    ),
    responses(
        (status = 200, description = "Time entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this entry"),
        (status = 404, description = "Time entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task Time Entries"
)]
pub async fn delete_task_time_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<()> {
    let entry = TaskTimeEntryRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &entry, Operation::Delete, "Task time entry")?;

    TaskTimeEntryRepository::delete(&state.db, id).await?;
    Ok(())
}
