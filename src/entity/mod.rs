pub mod leave_request;
pub mod notice;
pub mod project;
pub mod revoked_token;
pub mod sea_orm_active_enums;
pub mod task;
pub mod task_time_entry;
pub mod timesheet_entry;
pub mod user;

pub mod prelude;

pub use prelude::*;
