use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{
    validate_optional, validate_required, AppJson, AppPath, AppQuery, PaginationParams,
};
use crate::middlewares::AuthUser;
use crate::models::{CreateNotice, Notice, UpdateNotice};
use crate::repositories::{NoticeRepository, Repository, UserRepository};
use crate::services::{AccessPolicy, Operation};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNoticeRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoticeResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_by: Option<Uuid>,
    pub created_by_username: Option<String>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl NoticeResponse {
    fn new(n: Notice, users: &HashMap<Uuid, String>) -> Self {
        Self {
            created_by_username: n.created_by.and_then(|id| users.get(&id).cloned()),
            id: n.id,
            title: n.title,
            content: n.content,
            created_by: n.created_by,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoticeListResponse {
    pub data: Vec<NoticeResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

// ============ Handlers ============

/// Publish a notice (admin)
#[utoipa::path(
    post,
    path = "/api/notices",
    request_body = CreateNoticeRequest,
    responses(
        (status = 200, description = "Notice published", body = NoticeResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notices"
)]
pub async fn create_notice(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateNoticeRequest>,
) -> AppResult<Json<NoticeResponse>> {
    AccessPolicy::require_admin(&user.actor())?;
    validate_required(&payload.title, "Title", 200)?;
    validate_required(&payload.content, "Content", 10_000)?;

    let create_notice = CreateNotice {
        title: payload.title,
        content: payload.content,
    };

    let notice = NoticeRepository::create(&state.db, user.id, &create_notice).await?;

    let users = HashMap::from([(user.id, user.username)]);
    Ok(Json(NoticeResponse::new(notice, &users)))
}

/// List notices, newest first
#[utoipa::path(
    get,
    path = "/api/notices",
    params(PaginationParams),
    responses(
        (status = 200, description = "List of notices", body = NoticeListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notices"
)]
pub async fn list_notices(
    _user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<NoticeListResponse>> {
    let (limit, offset) = params.resolve();

    let notices = NoticeRepository::list(&state.db, limit, offset).await?;
    let total = NoticeRepository::count(&state.db).await?;
    let users = UserRepository::username_map(&state.db, notices.iter().filter_map(|n| n.created_by)).await?;

    Ok(Json(NoticeListResponse {
        data: notices
            .into_iter()
            .map(|n| NoticeResponse::new(n, &users))
            .collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a notice by ID
#[utoipa::path(
    get,
    path = "/api/notices/{id}",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Notice details", body = NoticeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notices"
)]
pub async fn get_notice(
    _user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<NoticeResponse>> {
    let notice = NoticeRepository::find_by_id(&state.db, id).await?;
    let users = UserRepository::username_map(&state.db, notice.created_by).await?;
    Ok(Json(NoticeResponse::new(notice, &users)))
}

/// Update a notice (admin)
#[utoipa::path(
    put,
    path = "/api/notices/{id}",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    request_body = UpdateNoticeRequest,
    responses(
        (status = 200, description = "Notice updated", body = NoticeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notices"
)]
pub async fn update_notice(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateNoticeRequest>,
) -> AppResult<Json<NoticeResponse>> {
    let notice = NoticeRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &notice, Operation::Update, "Notice")?;
    validate_optional(&payload.title, "Title", 200)?;
    validate_optional(&payload.content, "Content", 10_000)?;

    let update_notice = UpdateNotice {
        title: payload.title,
        content: payload.content,
    };

    let notice = NoticeRepository::update(&state.db, id, &update_notice).await?;
    let users = UserRepository::username_map(&state.db, notice.created_by).await?;
    Ok(Json(NoticeResponse::new(notice, &users)))
}

/// Delete a notice (admin)
#[utoipa::path(
    delete,
    path = "/api/notices/{id}",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Notice deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notices"
)]
pub async fn delete_notice(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<()> {
    let notice = NoticeRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &notice, Operation::Delete, "Notice")?;

    NoticeRepository::delete(&state.db, id).await?;
    Ok(())
}
