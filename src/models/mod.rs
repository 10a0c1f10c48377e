pub mod leave_request;
pub mod notice;
pub mod project;
pub mod task;
pub mod task_time_entry;
pub mod timesheet;
pub mod user;

pub use leave_request::*;
pub use notice::*;
pub use project::*;
pub use task::*;
pub use task_time_entry::*;
pub use timesheet::*;
pub use user::*;

pub use crate::entity::sea_orm_active_enums::{LeaveStatus, LeaveType, TaskStatus, TimesheetStatus};
