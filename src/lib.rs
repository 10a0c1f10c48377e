// Library crate for the WorkLog server
// Exports modules for use by the server binary and tests

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    create_leave_request, create_notice, create_project, create_task, create_task_time_entry,
    create_timesheet, delete_leave_request, delete_notice, delete_project, delete_task,
    delete_task_time_entry, delete_timesheet, get_leave_request, get_notice, get_project,
    get_task, get_task_time_entry, get_timesheet, get_user, health, list_leave_requests,
    list_notices, list_projects, list_task_time_entries, list_tasks, list_timesheets, list_users,
    login, logout, me, missing_timesheets, refresh, register, review_leave_request,
    review_timesheet, submit_timesheet, update_leave_request, update_me, update_notice,
    update_project, update_task, update_task_time_entry, update_timesheet, update_user_role,
};
use crate::middlewares::auth_middleware;
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        // Auth & User routes
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/users/me", put(update_me))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/role", put(update_user_role))
        // Project routes
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        // Task routes
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        // Timesheet routes
        .route("/api/timesheets", get(list_timesheets).post(create_timesheet))
        .route("/api/timesheets/missing", get(missing_timesheets))
        .route(
            "/api/timesheets/{id}",
            get(get_timesheet)
                .put(update_timesheet)
                .delete(delete_timesheet),
        )
        .route("/api/timesheets/{id}/submit", post(submit_timesheet))
        .route("/api/timesheets/{id}/status", put(review_timesheet))
        // Task time entry routes
        .route(
            "/api/task-time-entries",
            get(list_task_time_entries).post(create_task_time_entry),
        )
        .route(
            "/api/task-time-entries/{id}",
            get(get_task_time_entry)
                .put(update_task_time_entry)
                .delete(delete_task_time_entry),
        )
        // Leave request routes
        .route(
            "/api/leave-requests",
            get(list_leave_requests).post(create_leave_request),
        )
        .route(
            "/api/leave-requests/{id}",
            get(get_leave_request)
                .put(update_leave_request)
                .delete(delete_leave_request),
        )
        .route("/api/leave-requests/{id}/status", put(review_leave_request))
        // Notice routes
        .route("/api/notices", get(list_notices).post(create_notice))
        .route(
            "/api/notices/{id}",
            get(get_notice).put(update_notice).delete(delete_notice),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        // Public auth routes
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        // Protected routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
