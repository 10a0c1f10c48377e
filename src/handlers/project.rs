use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{validate_optional, validate_required, AppJson, AppPath, AppQuery, PaginationParams};
use crate::middlewares::AuthUser;
use crate::models::{CreateProject, Project, UpdateProject};
use crate::repositories::{ProjectRepository, Repository};
use crate::services::{AccessPolicy, Operation};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

// ============ Handlers ============

/// Create a new project (admin)
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Project created successfully", body = ProjectResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Project name already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    AccessPolicy::require_admin(&user.actor())?;
    validate_required(&payload.name, "Name", 100)?;

    let create_project = CreateProject {
        name: payload.name,
        description: payload.description,
    };

    let project = ProjectRepository::create(&state.db, &create_project).await?;
    Ok(Json(project.into()))
}

/// List all projects
#[utoipa::path(
    get,
    path = "/api/projects",
    params(PaginationParams),
    responses(
        (status = 200, description = "List of projects", body = ProjectListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_projects(
    _user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<ProjectListResponse>> {
    let (limit, offset) = params.resolve();

    let projects = ProjectRepository::list(&state.db, limit, offset).await?;
    let total = ProjectRepository::count(&state.db).await?;

    Ok(Json(ProjectListResponse {
        data: projects.into_iter().map(|p| p.into()).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a project by ID
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn get_project(
    _user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ProjectResponse>> {
    let project = ProjectRepository::find_by_id(&state.db, id).await?;
    Ok(Json(project.into()))
}

/// Update a project (admin)
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Project name already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn update_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let project = ProjectRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &project, Operation::Update, "Project")?;
    validate_optional(&payload.name, "Name", 100)?;

    let update_project = UpdateProject {
        name: payload.name,
        description: payload.description,
    };

    let project = ProjectRepository::update(&state.db, id, &update_project).await?;
    Ok(Json(project.into()))
}

/// Delete a project and its tasks (admin)
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn delete_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<()> {
    let project = ProjectRepository::find_by_id(&state.db, id).await?;
    AccessPolicy::ensure(&user.actor(), &project, Operation::Delete, "Project")?;

    ProjectRepository::delete(&state.db, id).await?;
    Ok(())
}
