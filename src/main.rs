use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use worklog::config::Config;
use worklog::handlers::{
    AuthResponse, CreateLeaveRequestRequest, CreateNoticeRequest, CreateProjectRequest,
    CreateTaskRequest, CreateTaskTimeEntryRequest, CreateTimesheetRequest, HealthResponse,
    LeaveRequestListResponse, LeaveRequestResponse, LeaveStatusRequest, LoginRequest,
    MissingTimesheetResponse, NoticeListResponse, NoticeResponse, ProjectListResponse,
    ProjectResponse, RefreshRequest, RefreshResponse, RegisterRequest, TaskListResponse,
    TaskResponse, TaskTimeEntryListResponse, TaskTimeEntryResponse, TimesheetListResponse,
    TimesheetResponse, TimesheetStatusRequest, UpdateLeaveRequestRequest, UpdateNoticeRequest,
    UpdateProjectRequest, UpdateRoleRequest, UpdateTaskRequest, UpdateTaskTimeEntryRequest,
    UpdateTimesheetRequest, UpdateUserRequest, UserListResponse,
};
use worklog::models::{LeaveStatus, LeaveType, Role, TaskStatus, TimesheetStatus, UserResponse};
use worklog::state::AppState;
use worklog::{build_router, handlers};

/// Security scheme for Bearer token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::auth::update_me,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::update_user_role,
        handlers::project::create_project,
        handlers::project::list_projects,
        handlers::project::get_project,
        handlers::project::update_project,
        handlers::project::delete_project,
        handlers::task::create_task,
        handlers::task::list_tasks,
        handlers::task::get_task,
        handlers::task::update_task,
        handlers::task::delete_task,
        handlers::timesheet::create_timesheet,
        handlers::timesheet::list_timesheets,
        handlers::timesheet::get_timesheet,
        handlers::timesheet::update_timesheet,
        handlers::timesheet::delete_timesheet,
        handlers::timesheet::submit_timesheet,
        handlers::timesheet::review_timesheet,
        handlers::timesheet::missing_timesheets,
        handlers::task_time_entry::create_task_time_entry,
        handlers::task_time_entry::list_task_time_entries,
        handlers::task_time_entry::get_task_time_entry,
        handlers::task_time_entry::update_task_time_entry,
        handlers::task_time_entry::delete_task_time_entry,
        handlers::leave_request::create_leave_request,
        handlers::leave_request::list_leave_requests,
        handlers::leave_request::get_leave_request,
        handlers::leave_request::update_leave_request,
        handlers::leave_request::review_leave_request,
        handlers::leave_request::delete_leave_request,
        handlers::notice::create_notice,
        handlers::notice::list_notices,
        handlers::notice::get_notice,
        handlers::notice::update_notice,
        handlers::notice::delete_notice,
    ),
    components(schemas(
        HealthResponse,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        RefreshRequest,
        RefreshResponse,
        UserResponse,
        UserListResponse,
        UpdateUserRequest,
        UpdateRoleRequest,
        Role,
        CreateProjectRequest,
        UpdateProjectRequest,
        ProjectResponse,
        ProjectListResponse,
        TaskStatus,
        CreateTaskRequest,
        UpdateTaskRequest,
        TaskResponse,
        TaskListResponse,
        TimesheetStatus,
        CreateTimesheetRequest,
        UpdateTimesheetRequest,
        TimesheetStatusRequest,
        TimesheetResponse,
        TimesheetListResponse,
        MissingTimesheetResponse,
        CreateTaskTimeEntryRequest,
        UpdateTaskTimeEntryRequest,
        TaskTimeEntryResponse,
        TaskTimeEntryListResponse,
        LeaveType,
        LeaveStatus,
        CreateLeaveRequestRequest,
        UpdateLeaveRequestRequest,
        LeaveStatusRequest,
        LeaveRequestResponse,
        LeaveRequestListResponse,
        CreateNoticeRequest,
        UpdateNoticeRequest,
        NoticeResponse,
        NoticeListResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User management endpoints"),
        (name = "Projects", description = "Project management endpoints"),
        (name = "Tasks", description = "Task management endpoints"),
        (name = "Timesheets", description = "Daily timesheet entries with submit/approve workflow"),
        (name = "Task Time Entries", description = "Start/end time tracking per task"),
        (name = "Leave Requests", description = "Leave requests with admin approval"),
        (name = "Notices", description = "Broadcast notices")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worklog=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let addr = config.server_addr();

    // Initialize application state (connects, migrates, bootstraps admin)
    tracing::info!("Connecting to database...");
    let state = AppState::new(config).await?;
    tracing::info!("Database connection established");

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
