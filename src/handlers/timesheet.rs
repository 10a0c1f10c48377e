use std::collections::HashMap;

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::{AppJson, AppPath, AppQuery, PaginationParams};
use crate::middlewares::AuthUser;
use crate::models::{
    CreateTimesheetEntry, TimesheetEntry, TimesheetFilter, TimesheetStatus, UpdateTimesheetEntry,
    UserResponse,
};
use crate::repositories::{
    Repository, TaskRepository, TaskSummary, TimesheetRepository, UserRepository,
};
use crate::services::workflow::validate_hours;
use crate::services::{AccessPolicy, Operation, TimesheetWorkflow};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimesheetRequest {
    /// Defaults to the current user; only admins may name someone else
    pub user_id: Option<Uuid>,
    pub task_id: Uuid,
    pub date: Date,
    #[schema(value_type = String, example = "7.50")]
    pub hours: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTimesheetRequest {
    pub task_id: Option<Uuid>,
    pub date: Option<Date>,
    #[schema(value_type = Option<String>, example = "7.50")]
    pub hours: Option<Decimal>,
    pub description: Option<String>,
    pub status: Option<TimesheetStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TimesheetStatusRequest {
    pub status: TimesheetStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimesheetListParams {
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    #[param(default = 0, minimum = 0)]
    pub offset: Option<i64>,
    /// Admin only; ignored for other users
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: Option<TimesheetStatus>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MissingTimesheetParams {
    /// Defaults to yesterday (UTC)
    pub date: Option<Date>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimesheetResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_username: Option<String>,
    pub task_id: Uuid,
    pub task_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub date: Date,
    #[schema(value_type = String, example = "7.50")]
    pub hours: Decimal,
    pub description: Option<String>,
    pub status: TimesheetStatus,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TimesheetResponse {
    fn new(
        e: TimesheetEntry,
        users: &HashMap<Uuid, String>,
        tasks: &HashMap<Uuid, TaskSummary>,
    ) -> Self {
        let task = tasks.get(&e.task_id);
        Self {
            user_username: users.get(&e.user_id).cloned(),
            task_name: task.map(|t| t.name.clone()),
            project_id: task.map(|t| t.project_id),
            project_name: task.map(|t| t.project_name.clone()),
            id: e.id,
            user_id: e.user_id,
            task_id: e.task_id,
            date: e.date,
            hours: e.hours,
            description: e.description,
            status: e.status,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimesheetListResponse {
    pub data: Vec<TimesheetResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MissingTimesheetResponse {
    pub date: Date,
    pub data: Vec<UserResponse>,
}

async fn to_responses(
    db: &DatabaseConnection,
    entries: Vec<TimesheetEntry>,
) -> AppResult<Vec<TimesheetResponse>> {
    let users = UserRepository::username_map(db, entries.iter().map(|e| e.user_id)).await?;
    let tasks = TaskRepository::summaries(db, entries.iter().map(|e| e.task_id)).await?;

    Ok(entries
        .into_iter()
        .map(|e| TimesheetResponse::new(e, &users, &tasks))
        .collect())
}

async fn to_response(db: &DatabaseConnection, entry: TimesheetEntry) -> AppResult<TimesheetResponse> {
    let users = UserRepository::username_map(db, [entry.user_id]).await?;
    let tasks = TaskRepository::summaries(db, [entry.task_id]).await?;
    Ok(TimesheetResponse::new(entry, &users, &tasks))
}

// ============ Handlers ============

/// Create a draft timesheet entry
#[utoipa::path(
    post,
    path = "/api/timesheets",
    request_body = CreateTimesheetRequest,
    responses(
        (status = 200, description = "Entry created as draft", body = TimesheetResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot create entries for other users"),
        (status = 409, description = "Entry already exists for this task and date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn create_timesheet(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTimesheetRequest>,
) -> AppResult<Json<TimesheetResponse>> {
    let user_id = AccessPolicy::resolve_owner(&user.actor(), payload.user_id)?;
    validate_hours(payload.hours)?;

    let create_entry = CreateTimesheetEntry {
        user_id,
        task_id: payload.task_id,
        date: payload.date,
        hours: payload.hours,
        description: payload.description,
    };

    let entry = TimesheetRepository::create(&state.db, &create_entry).await?;
    Ok(Json(to_response(&state.db, entry).await?))
}

/// List timesheet entries visible to the current user
#[utoipa::path(
    get,
    path = "/api/timesheets",
    params(TimesheetListParams),
    responses(
        (status = 200, description = "List of timesheet entries", body = TimesheetListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn list_timesheets(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TimesheetListParams>,
) -> AppResult<Json<TimesheetListResponse>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let filter = TimesheetFilter {
        user_id: AccessPolicy::list_scope(&user.actor(), params.user_id),
        task_id: params.task_id,
        status: params.status,
        date_from: params.date_from,
        date_to: params.date_to,
    };

    let entries = TimesheetRepository::list_filtered(&state.db, &filter, limit, offset).await?;
    let total = TimesheetRepository::count_filtered(&state.db, &filter).await?;

    Ok(Json(TimesheetListResponse {
        data: to_responses(&state.db, entries).await?,
        total,
        limit,
        offset,
    }))
}

/// Get a timesheet entry by ID
#[utoipa::path(
    get,
    path = "/api/timesheets/{id}",
    params(
        ("id" = Uuid, Path, description = "Timesheet entry ID")
    ),
    responses(
        (status = 200, description = "Timesheet entry details", body = TimesheetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Timesheet entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn get_timesheet(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TimesheetResponse>> {
    let entry = TimesheetRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure_readable(&user.actor(), &entry, "Timesheet entry")?;

    Ok(Json(to_response(&state.db, entry).await?))
}

/// Update a timesheet entry
///
/// Owners may edit only while the entry is a draft. A `status` field follows
/// the same transition rules as the submit and review endpoints.
#[utoipa::path(
    put,
    path = "/api/timesheets/{id}",
    params(
        ("id" = Uuid, Path, description = "Timesheet entry ID")
    ),
    request_body = UpdateTimesheetRequest,
    responses(
        (status = 200, description = "Entry updated", body = TimesheetResponse),
        (status = 400, description = "Validation error or invalid status transition"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not permitted to edit this entry"),
        (status = 404, description = "Timesheet entry not found"),
        (status = 409, description = "Entry already exists for this task and date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn update_timesheet(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTimesheetRequest>,
) -> AppResult<Json<TimesheetResponse>> {
    let actor = user.actor();
    let entry = TimesheetRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&actor, &entry, Operation::Update, "Timesheet entry")?;

    let update_entry = UpdateTimesheetEntry {
        task_id: payload.task_id,
        date: payload.date,
        hours: payload.hours,
        description: payload.description,
        status: payload.status,
    };
    TimesheetWorkflow::check_update(&actor, &entry, &update_entry)?;
    if let Some(hours) = update_entry.hours {
        validate_hours(hours)?;
    }

    let updated = TimesheetRepository::update(&state.db, id, &update_entry).await?;
    if updated.status != entry.status {
        tracing::info!(
            entry_id = %id,
            from = entry.status.as_str(),
            to = updated.status.as_str(),
            actor = %actor.id,
            "Timesheet entry status changed"
        );
    }

    Ok(Json(to_response(&state.db, updated).await?))
}

/// Submit a draft entry for review (owner only)
#[utoipa::path(
    post,
    path = "/api/timesheets/{id}/submit",
    params(
        ("id" = Uuid, Path, description = "Timesheet entry ID")
    ),
    responses(
        (status = 200, description = "Entry submitted", body = TimesheetResponse),
        (status = 400, description = "Entry is not a draft"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the owner can submit"),
        (status = 404, description = "Timesheet entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn submit_timesheet(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TimesheetResponse>> {
    let actor = user.actor();
    let entry = TimesheetRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&actor, &entry, Operation::Update, "Timesheet entry")?;
    TimesheetWorkflow::check_transition(&actor, &entry, TimesheetStatus::Submitted)?;

    let updated =
        TimesheetRepository::set_status(&state.db, id, TimesheetStatus::Submitted).await?;

    tracing::info!(entry_id = %id, user_id = %actor.id, "Timesheet entry submitted");
    Ok(Json(to_response(&state.db, updated).await?))
}

/// Approve or reject a submitted entry (admin)
#[utoipa::path(
    put,
    path = "/api/timesheets/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Timesheet entry ID")
    ),
    request_body = TimesheetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TimesheetResponse),
        (status = 400, description = "Invalid status transition"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Timesheet entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn review_timesheet(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TimesheetStatusRequest>,
) -> AppResult<Json<TimesheetResponse>> {
    let actor = user.actor();
    AccessPolicy::require_admin(&actor)?;

    let entry = TimesheetRepository::find_by_id(&state.db, id).await?;
    TimesheetWorkflow::check_transition(&actor, &entry, payload.status)?;

    let updated = TimesheetRepository::set_status(&state.db, id, payload.status).await?;

    tracing::info!(
        entry_id = %id,
        status = updated.status.as_str(),
        reviewer = %actor.id,
        "Timesheet entry reviewed"
    );
    Ok(Json(to_response(&state.db, updated).await?))
}

/// Delete a timesheet entry (drafts only, unless admin)
#[utoipa::path(
    delete,
    path = "/api/timesheets/{id}",
    params(
        ("id" = Uuid, Path, description = "Timesheet entry ID")
    ),
    responses(
        (status = 200, description = "Entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not permitted to delete this entry"),
        (status = 404, description = "Timesheet entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn delete_timesheet(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<()> {
    let actor = user.actor();
    let entry = TimesheetRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&actor, &entry, Operation::Delete, "Timesheet entry")?;
    TimesheetWorkflow::check_edit(&actor, &entry)?;

    TimesheetRepository::delete(&state.db, id).await?;
    Ok(())
}

/// Active regular users with no entry on a given day (admin)
#[utoipa::path(
    get,
    path = "/api/timesheets/missing",
    params(MissingTimesheetParams),
    responses(
        (status = 200, description = "Users without a timesheet entry", body = MissingTimesheetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheets"
)]
pub async fn missing_timesheets(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MissingTimesheetParams>,
) -> AppResult<Json<MissingTimesheetResponse>> {
    AccessPolicy::require_admin(&user.actor())?;

    let date = match params.date {
        Some(date) => date,
        None => OffsetDateTime::now_utc()
            .date()
            .previous_day()
            .ok_or_else(|| AppError::Internal("Date out of range".to_string()))?,
    };

    let users = UserRepository::list_missing_timesheet(&state.db, date).await?;

    Ok(Json(MissingTimesheetResponse {
        date,
        data: users.into_iter().map(|u| u.into()).collect(),
    }))
}
