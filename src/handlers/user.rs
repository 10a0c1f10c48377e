use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::{AppJson, AppPath, AppQuery, PaginationParams};
use crate::middlewares::RequireAdmin;
use crate::models::{Role, UserResponse};
use crate::repositories::{Repository, UserRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

// ============ Handlers ============

/// List all users (admin)
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<UserListResponse>> {
    let (limit, offset) = params.resolve();

    let users = UserRepository::list(&state.db, limit, offset).await?;
    let total = UserRepository::count(&state.db).await?;

    Ok(Json(UserListResponse {
        data: users.into_iter().map(|u| u.into()).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a user by ID (admin)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepository::find_by_id(&state.db, id).await?;
    Ok(Json(user.into()))
}

/// Grant or revoke the admin role (admin)
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Admins cannot demote themselves"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_user_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    if id == admin.id && payload.role != Role::Admin {
        return Err(AppError::Validation(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let user = UserRepository::set_role(&state.db, id, payload.role).await?;

    tracing::info!(user_id = %user.id, role = ?user.role, changed_by = %admin.id, "User role changed");
    Ok(Json(user.into()))
}
