use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use super::{LeaveStatus, LeaveType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub reason: String,
    pub status: LeaveStatus,
    pub is_hourly: bool,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub admin_comments: Option<String>,
    pub approved_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateLeaveRequest {
    pub user_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub reason: String,
    pub is_hourly: bool,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
}

/// Content fields plus the admin-only review fields
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLeaveRequest {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub reason: Option<String>,
    pub is_hourly: Option<bool>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub status: Option<LeaveStatus>,
    pub admin_comments: Option<String>,
}

/// What an update does to the recorded approver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproverChange {
    Keep,
    Set(Uuid),
    Clear,
}

/// Query filters for leave request listing
#[derive(Debug, Default, Clone)]
pub struct LeaveRequestFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}
