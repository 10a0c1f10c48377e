pub mod auth;
pub mod common;
pub mod health;
pub mod leave_request;
pub mod notice;
pub mod project;
pub mod task;
pub mod task_time_entry;
pub mod timesheet;
pub mod user;

pub use auth::{
    login, logout, me, refresh, register, update_me, AuthResponse, LoginRequest, RefreshRequest,
    RefreshResponse, RegisterRequest, UpdateUserRequest,
};
pub use common::{
    validate_optional, validate_required, AppJson, AppPath, AppQuery, PaginationParams,
};
pub use health::{health, HealthResponse};
pub use leave_request::{
    create_leave_request, delete_leave_request, get_leave_request, list_leave_requests,
    review_leave_request, update_leave_request, CreateLeaveRequestRequest,
    LeaveRequestListResponse, LeaveRequestResponse, LeaveStatusRequest,
    UpdateLeaveRequestRequest,
};
pub use notice::{
    create_notice, delete_notice, get_notice, list_notices, update_notice, CreateNoticeRequest,
    NoticeListResponse, NoticeResponse, UpdateNoticeRequest,
};
pub use project::{
    create_project, delete_project, get_project, list_projects, update_project,
    CreateProjectRequest, ProjectListResponse, ProjectResponse, UpdateProjectRequest,
};
pub use task::{
    create_task, delete_task, get_task, list_tasks, update_task, CreateTaskRequest,
    TaskListResponse, TaskResponse, UpdateTaskRequest,
};
pub use task_time_entry::{
    create_task_time_entry, delete_task_time_entry, get_task_time_entry, list_task_time_entries,
    update_task_time_entry, CreateTaskTimeEntryRequest, TaskTimeEntryListResponse,
    TaskTimeEntryResponse, UpdateTaskTimeEntryRequest,
};
pub use timesheet::{
    create_timesheet, delete_timesheet, get_timesheet, list_timesheets, missing_timesheets,
    review_timesheet, submit_timesheet, update_timesheet, CreateTimesheetRequest,
    MissingTimesheetResponse, TimesheetListResponse, TimesheetResponse, TimesheetStatusRequest,
    UpdateTimesheetRequest,
};
pub use user::{get_user, list_users, update_user_role, UpdateRoleRequest, UserListResponse};
