use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::TimesheetStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimesheetEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub date: Date,
    pub hours: Decimal,
    pub description: Option<String>,
    pub status: TimesheetStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateTimesheetEntry {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub date: Date,
    pub hours: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTimesheetEntry {
    pub task_id: Option<Uuid>,
    pub date: Option<Date>,
    pub hours: Option<Decimal>,
    pub description: Option<String>,
    pub status: Option<TimesheetStatus>,
}

/// Query filters for timesheet listing
#[derive(Debug, Default, Clone)]
pub struct TimesheetFilter {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: Option<TimesheetStatus>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}
