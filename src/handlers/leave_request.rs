use std::collections::HashMap;

use axum::{extract::State, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{
    validate_optional, validate_required, AppJson, AppPath, AppQuery, PaginationParams,
};
use crate::middlewares::AuthUser;
use crate::models::{
    CreateLeaveRequest, LeaveRequest, LeaveRequestFilter, LeaveStatus, LeaveType,
    UpdateLeaveRequest,
};
use crate::repositories::{LeaveRequestRepository, Repository, UserRepository};
use crate::services::{AccessPolicy, LeaveWorkflow, Operation};
use crate::state::AppState;

// Clock times are exchanged as HH:MM or HH:MM:SS
time::serde::format_description!(clock_time, Time, "[hour]:[minute][optional [:[second]]]");

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaveRequestRequest {
    /// Defaults to the current user; only admins may name someone else
    pub user_id: Option<Uuid>,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub reason: String,
    #[serde(default)]
    pub is_hourly: bool,
    #[schema(value_type = Option<String>, example = "09:00")]
    #[serde(default, with = "clock_time::option")]
    pub start_time: Option<Time>,
    #[schema(value_type = Option<String>, example = "13:00")]
    #[serde(default, with = "clock_time::option")]
    pub end_time: Option<Time>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLeaveRequestRequest {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub reason: Option<String>,
    pub is_hourly: Option<bool>,
    #[schema(value_type = Option<String>, example = "09:00")]
    #[serde(default, with = "clock_time::option")]
    pub start_time: Option<Time>,
    #[schema(value_type = Option<String>, example = "13:00")]
    #[serde(default, with = "clock_time::option")]
    pub end_time: Option<Time>,
    /// Admin only
    pub status: Option<LeaveStatus>,
    /// Admin only
    pub admin_comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveStatusRequest {
    pub status: LeaveStatus,
    pub admin_comments: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveRequestListParams {
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    #[param(default = 0, minimum = 0)]
    pub offset: Option<i64>,
    /// Admin only; ignored for other users
    pub user_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
    /// Requests whose leave period overlaps [date_from, date_to]
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_username: Option<String>,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub reason: String,
    pub status: LeaveStatus,
    pub is_hourly: bool,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    #[serde(with = "clock_time::option")]
    pub start_time: Option<Time>,
    #[schema(value_type = Option<String>, example = "13:00:00")]
    #[serde(with = "clock_time::option")]
    pub end_time: Option<Time>,
    pub admin_comments: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_by_username: Option<String>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl LeaveRequestResponse {
    fn new(l: LeaveRequest, users: &HashMap<Uuid, String>) -> Self {
        Self {
            user_username: users.get(&l.user_id).cloned(),
            approved_by_username: l.approved_by.and_then(|id| users.get(&id).cloned()),
            id: l.id,
            user_id: l.user_id,
            leave_type: l.leave_type,
            start_date: l.start_date,
            end_date: l.end_date,
            reason: l.reason,
            status: l.status,
            is_hourly: l.is_hourly,
            start_time: l.start_time,
            end_time: l.end_time,
            admin_comments: l.admin_comments,
            approved_by: l.approved_by,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveRequestListResponse {
    pub data: Vec<LeaveRequestResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

async fn to_responses(
    db: &DatabaseConnection,
    requests: Vec<LeaveRequest>,
) -> AppResult<Vec<LeaveRequestResponse>> {
    let ids = requests
        .iter()
        .flat_map(|l| std::iter::once(l.user_id).chain(l.approved_by));
    let users = UserRepository::username_map(db, ids).await?;

    Ok(requests
        .into_iter()
        .map(|l| LeaveRequestResponse::new(l, &users))
        .collect())
}

async fn to_response(db: &DatabaseConnection, request: LeaveRequest) -> AppResult<LeaveRequestResponse> {
    let ids = std::iter::once(request.user_id).chain(request.approved_by);
    let users = UserRepository::username_map(db, ids).await?;
    Ok(LeaveRequestResponse::new(request, &users))
}

// ============ Handlers ============

/// Request leave
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body = CreateLeaveRequestRequest,
    responses(
        (status = 200, description = "Leave request created as pending", body = LeaveRequestResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot request leave for other users")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Requests"
)]
pub async fn create_leave_request(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateLeaveRequestRequest>,
) -> AppResult<Json<LeaveRequestResponse>> {
    let user_id = AccessPolicy::resolve_owner(&user.actor(), payload.user_id)?;
    validate_required(&payload.reason, "Reason", 2000)?;

    let create_request = CreateLeaveRequest {
        user_id,
        leave_type: payload.leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        reason: payload.reason,
        is_hourly: payload.is_hourly,
        start_time: payload.start_time,
        end_time: payload.end_time,
    };

    let request = LeaveRequestRepository::create(&state.db, &create_request).await?;
    Ok(Json(to_response(&state.db, request).await?))
}

/// List leave requests visible to the current user
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    params(LeaveRequestListParams),
    responses(
        (status = 200, description = "List of leave requests", body = LeaveRequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Requests"
)]
pub async fn list_leave_requests(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<LeaveRequestListParams>,
) -> AppResult<Json<LeaveRequestListResponse>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let filter = LeaveRequestFilter {
        user_id: AccessPolicy::list_scope(&user.actor(), params.user_id),
        status: params.status,
        date_from: params.date_from,
        date_to: params.date_to,
    };

    let requests = LeaveRequestRepository::list_filtered(&state.db, &filter, limit, offset).await?;
    let total = LeaveRequestRepository::count_filtered(&state.db, &filter).await?;

    Ok(Json(LeaveRequestListResponse {
        data: to_responses(&state.db, requests).await?,
        total,
        limit,
        offset,
    }))
}

/// Get a leave request by ID
#[utoipa::path(
    get,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave request details", body = LeaveRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Requests"
)]
pub async fn get_leave_request(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<LeaveRequestResponse>> {
    let request = LeaveRequestRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure_readable(&user.actor(), &request, "Leave request")?;

    Ok(Json(to_response(&state.db, request).await?))
}

/// Update a leave request
///
/// Owners may edit a pending request but not decide it. Admins may change
/// anything; a status change records them as approver.
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Leave request ID")
    ),
    request_body = UpdateLeaveRequestRequest,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequestResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not permitted to make this change"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Requests"
)]
pub async fn update_leave_request(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateLeaveRequestRequest>,
) -> AppResult<Json<LeaveRequestResponse>> {
    let actor = user.actor();
    let current = LeaveRequestRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&actor, &current, Operation::Update, "Leave request")?;
    validate_optional(&payload.reason, "Reason", 2000)?;

    let update_request = UpdateLeaveRequest {
        leave_type: payload.leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        reason: payload.reason,
        is_hourly: payload.is_hourly,
        start_time: payload.start_time,
        end_time: payload.end_time,
        status: payload.status,
        admin_comments: payload.admin_comments,
    };
    let approver = LeaveWorkflow::plan_update(&actor, &current, &update_request)?;

    let updated =
        LeaveRequestRepository::update(&state.db, id, &update_request, approver).await?;
    if updated.status != current.status {
        tracing::info!(
            leave_request_id = %id,
            from = current.status.as_str(),
            to = updated.status.as_str(),
            actor = %actor.id,
            "Leave request status changed"
        );
    }

    Ok(Json(to_response(&state.db, updated).await?))
}

/// Approve, reject or reset a leave request (admin)
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Leave request ID")
    ),
    request_body = LeaveStatusRequest,
    responses(
        (status = 200, description = "Leave request decided", body = LeaveRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Requests"
)]
pub async fn review_leave_request(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<LeaveStatusRequest>,
) -> AppResult<Json<LeaveRequestResponse>> {
    let actor = user.actor();
    let current = LeaveRequestRepository::find_by_id(&state.db, id).await?;
    let approver = LeaveWorkflow::review(&actor, &current, payload.status)?;

    let updated = LeaveRequestRepository::review(
        &state.db,
        id,
        payload.status,
        payload.admin_comments,
        approver,
    )
    .await?;

    tracing::info!(
        leave_request_id = %id,
        status = updated.status.as_str(),
        reviewer = %actor.id,
        "Leave request reviewed"
    );
    Ok(Json(to_response(&state.db, updated).await?))
}

/// Delete a leave request (pending only, unless admin)
#[utoipa::path(
    delete,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave request deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not permitted to delete this request"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Requests"
)]
pub async fn delete_leave_request(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<()> {
    let actor = user.actor();
    let current = LeaveRequestRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&actor, &current, Operation::Delete, "Leave request")?;
    LeaveWorkflow::check_edit(&actor, &current)?;

    LeaveRequestRepository::delete(&state.db, id).await?;
    Ok(())
}
