pub use super::leave_request::Entity as LeaveRequest;
pub use super::notice::Entity as Notice;
pub use super::project::Entity as Project;
pub use super::revoked_token::Entity as RevokedToken;
pub use super::task::Entity as Task;
pub use super::task_time_entry::Entity as TaskTimeEntry;
pub use super::timesheet_entry::Entity as TimesheetEntry;
pub use super::user::Entity as User;
