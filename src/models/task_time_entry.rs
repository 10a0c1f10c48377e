use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TaskTimeEntry {
    pub fn duration_minutes(&self) -> f64 {
        (self.end_time - self.start_time).as_seconds_f64() / 60.0
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() / 60.0
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskTimeEntry {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskTimeEntry {
    pub task_id: Option<Uuid>,
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub description: Option<String>,
}

/// Query filters for task time entry listing
#[derive(Debug, Default, Clone)]
pub struct TaskTimeEntryFilter {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub start_time_gte: Option<OffsetDateTime>,
    pub end_time_lte: Option<OffsetDateTime>,
}
